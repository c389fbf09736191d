//! Recursive-descent parser writing the syntax tree straight into a
//! [`MemoryPool`].
//!
//! There is no error recovery: the first problem aborts the unit with a
//! [`ParseError`] carrying file, position and the offending token.

mod block;
mod error;
mod expr;


use crate::arena::MemoryPool;
use crate::ast::{Block, RawArg, RawBlock, RawBlockWithMeta, Span};
use crate::lexer::{Lexer, SourceReader, Token, TokenKind, sets};

pub use error::{ParseError, ParseErrorKind};

pub struct Parser<'a> {
    pool: &'a MemoryPool,
    reader: SourceReader<'a>,
    file_name: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(pool: &'a MemoryPool, source: &'a str, file_name: &str) -> Self {
        Self {
            pool,
            reader: SourceReader::new(source),
            file_name: pool.alloc_str(file_name),
        }
    }

    /// Parser over the body of `raw`, reporting positions relative to the
    /// enclosing file and naming the block as a sub-scope.
    pub fn for_raw_block(pool: &'a MemoryPool, raw: &RawBlock<'a>) -> Self {
        let file_name = format!("{} [{}]", raw.file_name, raw.name);
        Self {
            pool,
            reader: SourceReader::with_origin(raw.source, raw.offset, raw.position),
            file_name: pool.alloc_str(&file_name),
        }
    }

    pub fn file_name(&self) -> &'a str {
        self.file_name
    }

    /// Next significant token; comments are skipped and lexer errors
    /// become parse errors.
    fn next_token(&mut self, lexer: &Lexer) -> Result<Token<'a>, ParseError> {
        loop {
            let token = lexer.next_token(&mut self.reader);
            match token.kind {
                TokenKind::Comment => continue,
                TokenKind::Error(err) => {
                    return Err(self.error_at(&token, ParseErrorKind::InvalidToken(err)));
                }
                _ => return Ok(token),
            }
        }
    }

    fn error_at(&self, token: &Token<'a>, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            file: self.file_name.to_string(),
            position: token.position,
            span: Span::new(token.offset, token.offset + token.text.len()),
            token: token.text.to_string(),
        }
    }

    fn unexpected(&self, token: &Token<'a>, reason: &str) -> ParseError {
        let kind = if token.kind == TokenKind::End {
            ParseErrorKind::UnexpectedEnd(reason.to_string())
        } else {
            ParseErrorKind::UnexpectedToken(reason.to_string())
        };
        self.error_at(token, kind)
    }

    fn expect_key_char(&mut self, lexer: &Lexer, expected: char, reason: &str) -> Result<Token<'a>, ParseError> {
        let token = self.next_token(lexer)?;
        match token.kind {
            TokenKind::KeyChar(ch) if ch == expected => Ok(token),
            _ => Err(self.unexpected(&token, reason)),
        }
    }

    /// Parses the whole input as the statements of one unnamed block.
    pub fn parse_block(mut self) -> Result<&'a Block<'a>, ParseError> {
        let position = self.reader.position();
        let offset = self.reader.offset();
        let content = self.parse_content(true)?;
        let raw = RawBlock {
            block_type: "",
            name: "",
            source: self.reader.source(),
            file_name: self.file_name,
            position,
            offset,
        };
        Ok(self.pool.create(Block { raw, content }))
    }
}

/// Parses a source unit into its top-level block.
pub fn parse<'a>(pool: &'a MemoryPool, source: &'a str, file_name: &str) -> Result<&'a Block<'a>, ParseError> {
    tracing::debug!(file_name, len = source.len(), "parsing source unit");
    Parser::new(pool, source, file_name).parse_block()
}

/// Parses one expression, optionally terminated by `;`. Empty input yields
/// `None`.
pub fn parse_single_expr<'a>(pool: &'a MemoryPool, source: &'a str) -> Result<Option<RawArg<'a>>, ParseError> {
    let mut parser = Parser::new(pool, source, "<expr>");
    let (arg, _) = parser.parse_arg(&sets::SINGLE_EXPR)?;
    Ok(arg)
}

/// Parses the body of a raw block as statements.
pub fn parse_raw_block<'a>(pool: &'a MemoryPool, raw: &RawBlock<'a>) -> Result<&'a Block<'a>, ParseError> {
    tracing::debug!(file = raw.file_name, block = raw.name, "parsing raw block");
    let content = Parser::for_raw_block(pool, raw).parse_content(true)?;
    Ok(pool.create(Block {
        raw: raw.clone(),
        content,
    }))
}

/// Collects the top-level `#Raw` blocks of a file together with their
/// meta-functions, leaving the bodies unparsed.
pub fn get_all_raw_blocks<'a>(
    pool: &'a MemoryPool,
    source: &'a str,
    file_name: &str,
) -> Result<Vec<RawBlockWithMeta<'a>>, ParseError> {
    let mut parser = Parser::new(pool, source, file_name);
    let mut blocks = Vec::new();
    let mut metas = Vec::new();
    loop {
        let token = parser.next_token(&sets::RAW_LISTING)?;
        match token.kind {
            TokenKind::MetaFunc(name) => metas.push(parser.parse_func_body(name)?),
            TokenKind::Raw(block_type) => {
                let raw = parser.parse_raw_block_body(block_type)?;
                blocks.push(RawBlockWithMeta {
                    raw: pool.create(raw),
                    metas: pool.create_array(&metas),
                });
                metas.clear();
            }
            TokenKind::End if metas.is_empty() => return Ok(blocks),
            TokenKind::End => {
                return Err(parser.unexpected(&token, "expect block after metafuncs"));
            }
            _ => return Err(parser.unexpected(&token, "Unexpected token, expect raw block or metafunc")),
        }
    }
}
