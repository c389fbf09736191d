//! Expression parsing.
//!
//! Operands and at most one operator are collected in order. A unary
//! operator must come before its operand, a binary one between two.
//! Parenthesized groups and call arguments recurse with their own stop
//! delimiters, so `a + b * c` has to be written `a + (b * c)`.

use super::{ParseError, ParseErrorKind, Parser};
use crate::ast::{BinaryExpr, EmbedOps, FuncCall, IndexExpr, LateBindVar, RawArg, UnaryExpr};
use crate::lexer::{Token, TokenKind, sets, sets::ExprLexers};

#[derive(Default)]
struct Pending<'a> {
    left: Option<RawArg<'a>>,
    op: Option<EmbedOps>,
    right: Option<RawArg<'a>>,
}

impl<'a> Pending<'a> {
    /// Right after an operand with no operator yet.
    fn at_operator(&self) -> bool {
        self.left.is_some() && self.op.is_none()
    }
}

impl<'a> Parser<'a> {
    /// Parses one expression up to a delimiter of `lexers`. Returns the
    /// expression (if any) and the delimiter that ended it, `None` when the
    /// input ended and that is allowed.
    pub(crate) fn parse_arg(&mut self, lexers: &ExprLexers) -> Result<(Option<RawArg<'a>>, Option<char>), ParseError> {
        crate::stack::ensure_sufficient_stack(|| {
            let mut state = Pending::default();
            let stop = loop {
                let lexer = if state.at_operator() { &lexers.op } else { &lexers.arg };
                let token = self.next_token(lexer)?;
                match token.kind {
                    TokenKind::Delim(ch) => break Some(ch),
                    TokenKind::End => match lexers.end_message {
                        None => break None,
                        Some(reason) => return Err(self.unexpected(&token, reason)),
                    },
                    TokenKind::EmbedOp(op) => {
                        if state.op.is_some() {
                            return Err(self.unexpected(&token, "Already has op"));
                        }
                        if op.is_unary() && state.left.is_some() {
                            return Err(self.unexpected(&token, "Expect no operand before unary operator"));
                        }
                        if !op.is_unary() && state.left.is_none() {
                            return Err(self.unexpected(&token, "Expect operand before binary operator"));
                        }
                        state.op = Some(op);
                    }
                    TokenKind::KeyChar('(') => {
                        if state.at_operator() {
                            return Err(self.unexpected(&token, "expect an operator"));
                        }
                        let (inner, _) = self.parse_arg(&sets::GROUP)?;
                        let inner = inner.ok_or_else(|| self.unexpected(&token, "Does not allow empty argument"))?;
                        self.push_operand(&mut state, &token, inner)?;
                    }
                    TokenKind::KeyChar('[') => {
                        let (index, _) = self.parse_arg(&sets::INDEX)?;
                        let index = index.ok_or_else(|| self.unexpected(&token, "Expect index inside '[]'"))?;
                        let on_right = state.right.is_some();
                        if !on_right && state.op.is_some() {
                            return Err(self.unexpected(&token, "Expect operand before indexer"));
                        }
                        let slot = if on_right { &mut state.right } else { &mut state.left };
                        let Some(target) = slot.take() else {
                            return Err(self.unexpected(&token, "Expect operand before indexer"));
                        };
                        *slot = Some(RawArg::Index(self.pool.create(IndexExpr { target, index })));
                    }
                    TokenKind::KeyChar(')') => {
                        return Err(self.unexpected(&token, "Unexpected right parenthese"));
                    }
                    TokenKind::Func(name) => {
                        let call = self.parse_func_body(name)?;
                        self.push_operand(&mut state, &token, RawArg::Func(self.pool.create(call)))?;
                    }
                    TokenKind::Str { raw, escaped } => {
                        let text = self.string_literal(raw, escaped);
                        self.push_operand(&mut state, &token, RawArg::Str(text))?;
                    }
                    TokenKind::Uint(v) => self.push_operand(&mut state, &token, RawArg::Uint(v))?,
                    TokenKind::Int(v) => self.push_operand(&mut state, &token, RawArg::Int(v))?,
                    TokenKind::FP(v) => self.push_operand(&mut state, &token, RawArg::FP(v))?,
                    TokenKind::Bool(v) => self.push_operand(&mut state, &token, RawArg::Bool(v))?,
                    TokenKind::Var(name) => {
                        let var = LateBindVar::parse(name)
                            .map_err(|err| self.error_at(&token, ParseErrorKind::InvalidName(err)))?;
                        self.push_operand(&mut state, &token, RawArg::Var(var))?;
                    }
                    TokenKind::Unknown if state.at_operator() => {
                        return Err(self.unexpected(&token, "expect an operator"));
                    }
                    TokenKind::Unknown => {
                        return Err(self.unexpected(&token, "unknown or error token"));
                    }
                    _ => return Err(self.unexpected(&token, "Unexpected token")),
                }
            };

            let arg = match state.op {
                None => state.left,
                Some(op) if op.is_unary() => {
                    let operand = state
                        .right
                        .ok_or_else(|| self.error_here(ParseErrorKind::UnexpectedToken("Lack oprend for unary operator".into())))?;
                    Some(RawArg::Unary(self.pool.create(UnaryExpr { op, operand })))
                }
                Some(op) => {
                    let right = state.right.ok_or_else(|| {
                        self.error_here(ParseErrorKind::UnexpectedToken("Lack 2nd oprend for binary operator".into()))
                    })?;
                    let left = state.left.ok_or_else(|| {
                        self.error_here(ParseErrorKind::UnexpectedToken("Expect operand before binary operator".into()))
                    })?;
                    Some(RawArg::Binary(self.pool.create(BinaryExpr { op, left, right })))
                }
            };
            Ok((arg, stop))
        })
    }

    fn push_operand(&self, state: &mut Pending<'a>, token: &Token<'a>, arg: RawArg<'a>) -> Result<(), ParseError> {
        let slot = if state.op.is_none() { &mut state.left } else { &mut state.right };
        if slot.is_some() {
            return Err(self.unexpected(token, "Already has oprend"));
        }
        *slot = Some(arg);
        Ok(())
    }

    /// Error located at the current reader position.
    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        let offset = self.reader.offset();
        ParseError {
            kind,
            file: self.file_name.to_string(),
            position: self.reader.position(),
            span: crate::ast::Span::new(offset, offset),
            token: String::new(),
        }
    }

    /// Parses `(args...)` following a `$name` or `@name` token.
    pub(crate) fn parse_func_body(&mut self, name: &'a str) -> Result<FuncCall<'a>, ParseError> {
        self.expect_key_char(&sets::HEADER, '(', "Expect '(' after function name")?;
        let mut args = Vec::new();
        loop {
            let before = self.reader.position();
            let (arg, stop) = self.parse_arg(&sets::CALL_ARGS)?;
            match arg {
                None if stop == Some(')') && args.is_empty() => break,
                None => {
                    let mut err = self.error_here(ParseErrorKind::UnexpectedToken("Does not allow empty argument".into()));
                    err.position = before;
                    return Err(err);
                }
                Some(arg) => args.push(arg),
            }
            if stop == Some(')') {
                break;
            }
        }
        Ok(FuncCall {
            name,
            args: self.pool.create_array(&args),
        })
    }

    /// String literal body, with escapes resolved into the pool when present.
    pub(super) fn string_literal(&self, raw: &'a str, escaped: bool) -> &'a str {
        if !escaped {
            return raw;
        }
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('0') => out.push('\0'),
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        self.pool.alloc_str(&out)
    }
}
