//! Block and statement parsing.

use super::{ParseError, ParseErrorKind, Parser};
use crate::ast::{
    Assignment, BinaryExpr, Block, BlockContent, FuncCall, LateBindVar, NilCheck, RawArg, RawBlock,
    SourcePos, Span, Statement,
};
use crate::lexer::{AssignOp, Token, TokenKind, sets};

impl<'a> Parser<'a> {
    /// Parses statements up to the closing `}` of the current block, or up
    /// to the end of input when `till_the_end` is set.
    pub(crate) fn parse_content(&mut self, till_the_end: bool) -> Result<&'a [BlockContent<'a>], ParseError> {
        crate::stack::ensure_sufficient_stack(|| {
            let mut contents = Vec::new();
            let mut metas: Vec<FuncCall<'a>> = Vec::new();
            let mut start: Option<(usize, SourcePos)> = None;
            loop {
                let token = self.next_token(&sets::BLOCK_CONTENT)?;
                let (offset, position) = *start.get_or_insert((token.offset, token.position));
                let statement = match token.kind {
                    TokenKind::MetaFunc(name) => {
                        metas.push(self.parse_func_body(name)?);
                        continue;
                    }
                    TokenKind::Raw(block_type) => {
                        let raw = self.parse_raw_block_body(block_type)?;
                        Statement::RawBlock(self.pool.create(raw))
                    }
                    TokenKind::Block(block_type) => Statement::Block(self.parse_inline_block(block_type)?),
                    TokenKind::Func(name) => {
                        let call = self.parse_func_body(name)?;
                        self.eat_semicolon()?;
                        Statement::Call(self.pool.create(call))
                    }
                    TokenKind::Var(name) => Statement::Assignment(self.parse_assignment(&token, name)?),
                    TokenKind::KeyChar('}') if till_the_end => {
                        return Err(self.unexpected(&token, "Unexpected '}' when parsing block contents"));
                    }
                    TokenKind::End if !till_the_end => {
                        return Err(self.unexpected(&token, "expect '}' to close the scope"));
                    }
                    TokenKind::KeyChar('}') | TokenKind::End => {
                        if !metas.is_empty() {
                            return Err(self.unexpected(&token, "expect block/assignment/funccall after metafuncs"));
                        }
                        break;
                    }
                    _ => return Err(self.unexpected(&token, "Unexpected token")),
                };
                contents.push(BlockContent {
                    statement,
                    metas: self.pool.create_array(&metas),
                    span: Span::new(offset, self.reader.offset()),
                    position,
                });
                metas.clear();
                start = None;
            }
            Ok(self.pool.create_array(&contents))
        })
    }

    /// `("name")` following a block prefix.
    fn parse_block_name(&mut self) -> Result<&'a str, ParseError> {
        self.expect_key_char(&sets::HEADER, '(', "Expect '(' before block name")?;
        let token = self.next_token(&sets::HEADER)?;
        let TokenKind::Str { raw, escaped } = token.kind else {
            return Err(self.unexpected(&token, "Expect block name as string"));
        };
        let name = self.string_literal(raw, escaped);
        self.expect_key_char(&sets::HEADER, ')', "Expect ')' after block name")?;
        Ok(name)
    }

    /// Captures a raw block body verbatim. The remainder of the line holding
    /// the opening `{`, followed by `}`, is the guard that ends the body.
    pub(crate) fn parse_raw_block_body(&mut self, block_type: &'a str) -> Result<RawBlock<'a>, ParseError> {
        let name = self.parse_block_name()?;
        let open = self.expect_key_char(&sets::HEADER, '{', "Expect '{' to begin block body")?;
        let guard = format!("{}}}", self.reader.read_line());
        let position = self.reader.position();
        let offset = self.reader.offset();
        let body = self
            .reader
            .read_until(&guard)
            .ok_or_else(|| self.error_at(&open, ParseErrorKind::UnclosedRawBlock { guard: guard.clone() }))?;
        Ok(RawBlock {
            block_type,
            name,
            source: &body[..body.len() - guard.len()],
            file_name: self.file_name,
            position,
            offset,
        })
    }

    fn parse_inline_block(&mut self, block_type: &'a str) -> Result<&'a Block<'a>, ParseError> {
        let name = self.parse_block_name()?;
        self.expect_key_char(&sets::HEADER, '{', "Expect '{' to begin block body")?;
        let position = self.reader.position();
        let offset = self.reader.offset();
        let begin = self.reader.local_offset();
        let content = self.parse_content(false)?;
        // Excludes the closing '}'.
        let end = self.reader.local_offset() - 1;
        let raw = RawBlock {
            block_type,
            name,
            source: self.reader.slice(begin, end),
            file_name: self.file_name,
            position,
            offset,
        };
        Ok(self.pool.create(Block { raw, content }))
    }

    fn parse_assignment(&mut self, token: &Token<'a>, name: &'a str) -> Result<&'a Assignment<'a>, ParseError> {
        let target =
            LateBindVar::parse(name).map_err(|err| self.error_at(token, ParseErrorKind::InvalidName(err)))?;
        let op_token = self.next_token(&sets::ASSIGN_OP)?;
        let TokenKind::Assign(op) = op_token.kind else {
            return Err(self.unexpected(&op_token, "expect assignment operator"));
        };
        let (rhs, _) = self.parse_arg(&sets::STATEMENT)?;
        let rhs = rhs.ok_or_else(|| self.unexpected(&op_token, "expect statement"))?;
        let (check, self_op, statement) = match op {
            AssignOp::Assign => (NilCheck::ASSIGN, None, rhs),
            AssignOp::IfAbsent => (NilCheck::IF_ABSENT, None, rhs),
            AssignOp::Create => (NilCheck::CREATE, None, rhs),
            AssignOp::SelfOp(op) => {
                let expr = self.pool.create(BinaryExpr {
                    op,
                    left: RawArg::Var(target),
                    right: rhs,
                });
                (NilCheck::SELF_OP, Some(op), RawArg::Binary(expr))
            }
        };
        Ok(self.pool.create(Assignment {
            target,
            statement,
            check,
            self_op,
        }))
    }

    fn eat_semicolon(&mut self) -> Result<(), ParseError> {
        let token = self.next_token(&sets::SEMICOLON)?;
        match token.kind {
            TokenKind::Delim(';') => Ok(()),
            _ => Err(self.unexpected(&token, "Expected end with ;")),
        }
    }
}
