//! Combinator lexer.
//!
//! A [`Lexer`] is a static list of independent [`Tokenizer`]s. The driver
//! feeds every still-active tokenizer one character at a time and keeps
//! consuming while at least one of them can still match, so the longest
//! candidate wins. Ties go to the tokenizer listed first.
//!
//! Different parsing positions use different lexers (see [`sets`]), which is
//! how `-3` lexes as a literal in operand position but as `-` followed by
//! `3` right after an operand.

mod reader;
pub mod sets;
mod tokenizers;


use smallvec::SmallVec;

use crate::ast::{EmbedOps, SourcePos};

pub use reader::SourceReader;
pub use tokenizers::{
    AssignOpTokenizer, BlockPrefixTokenizer, BoolTokenizer, CommentTokenizer, DelimTokenizer,
    EmbedOpTokenizer, FPTokenizer, FuncPrefixTokenizer, IntTokenizer, KeyCharTokenizer,
    MetaFuncPrefixTokenizer, StringTokenizer, VarTokenizer,
};

/// Classification a tokenizer gives after seeing one more character.
///
/// Ordered by strength so that the driver can aggregate with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Match {
    /// Cannot match, now or later.
    NotMatch,
    /// A prefix of something valid, but not valid on its own.
    Pending,
    /// Valid as it stands, may grow further.
    Waitlist,
    /// Complete; stop scanning here.
    FullMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("string is not terminated")]
    UnterminatedString,
    #[error("comment is not terminated")]
    UnterminatedComment,
    #[error("integer literal overflows 64 bits")]
    IntOverflow,
    #[error("invalid number literal")]
    InvalidNumber,
    #[error("float literal is out of range")]
    FloatOverflow,
    #[error("expect a name after the prefix")]
    EmptyName,
    #[error("unknown block prefix, expect #Block or #Raw")]
    UnknownBlockPrefix,
}

/// Assignment operator as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `?=`
    IfAbsent,
    /// `:=`
    Create,
    /// `+=`, `-=`, ...
    SelfOp(EmbedOps),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind<'a> {
    End,
    Unknown,
    Error(LexError),
    Comment,
    Delim(char),
    /// Parentheses, braces and brackets.
    KeyChar(char),
    /// String body without quotes; `escaped` is set when it contains a
    /// backslash that still needs resolving.
    Str { raw: &'a str, escaped: bool },
    Uint(u64),
    Int(i64),
    FP(f64),
    Bool(bool),
    Var(&'a str),
    EmbedOp(EmbedOps),
    Assign(AssignOp),
    /// `$name`
    Func(&'a str),
    /// `@name`
    MetaFunc(&'a str),
    /// `#Block[.type]`
    Block(&'a str),
    /// `#Raw[.type]`
    Raw(&'a str),
}

impl TokenKind<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::End => "end of input",
            TokenKind::Unknown => "unknown",
            TokenKind::Error(_) => "error",
            TokenKind::Comment => "comment",
            TokenKind::Delim(_) => "delimiter",
            TokenKind::KeyChar(_) => "key char",
            TokenKind::Str { .. } => "string",
            TokenKind::Uint(_) => "uint",
            TokenKind::Int(_) => "int",
            TokenKind::FP(_) => "fp",
            TokenKind::Bool(_) => "bool",
            TokenKind::Var(_) => "variable",
            TokenKind::EmbedOp(_) => "operator",
            TokenKind::Assign(_) => "assign operator",
            TokenKind::Func(_) => "function",
            TokenKind::MetaFunc(_) => "meta function",
            TokenKind::Block(_) => "block prefix",
            TokenKind::Raw(_) => "raw block prefix",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// Source text the token was produced from.
    pub text: &'a str,
    pub position: SourcePos,
    pub offset: usize,
}

/// A per-token-class recognizer.
///
/// `on_char` receives the state it returned for the previous character
/// (zero at the start) and the index of `ch` within the candidate token.
pub trait Tokenizer: Sync {
    fn on_char(&self, state: u32, ch: char, idx: usize) -> (u32, Match);

    /// Builds the token once this tokenizer won. `text` has already been
    /// consumed from `reader`; tokenizers that need more input (strings,
    /// comments, prefixed names) keep reading from it.
    fn produce<'a>(&self, state: u32, text: &'a str, reader: &mut SourceReader<'a>)
    -> TokenKind<'a>;
}

/// Whitespace skipped between tokens.
pub fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n' | '\x0b')
}

pub struct Lexer {
    tokenizers: &'static [&'static dyn Tokenizer],
}

type Slots = SmallVec<[(u32, Match); 12]>;

impl Lexer {
    pub const fn new(tokenizers: &'static [&'static dyn Tokenizer]) -> Self {
        Self { tokenizers }
    }

    /// Scans one token with the default blank skipping.
    pub fn next_token<'a>(&self, reader: &mut SourceReader<'a>) -> Token<'a> {
        self.next_token_by(reader, is_blank)
    }

    pub fn next_token_by<'a>(
        &self,
        reader: &mut SourceReader<'a>,
        ignore: impl Fn(char) -> bool,
    ) -> Token<'a> {
        reader.read_while(&ignore);
        let position = reader.position();
        let start = reader.local_offset();
        let offset = reader.offset();

        let mut slots: Slots = self.tokenizers.iter().map(|_| (0, Match::Pending)).collect();
        let mut result = Match::NotMatch;
        let mut count = 0usize;

        for ch in reader.rest().chars() {
            if ignore(ch) {
                break;
            }
            let mut next = slots.clone();
            let mut aggregate = Match::NotMatch;
            for (tokenizer, slot) in self.tokenizers.iter().zip(next.iter_mut()) {
                if matches!(slot.1, Match::Pending | Match::Waitlist) {
                    *slot = tokenizer.on_char(slot.0, ch, count);
                    aggregate = aggregate.max(slot.1);
                }
            }
            if count > 0 && aggregate == Match::NotMatch {
                // Whatever was matched so far stands; `ch` belongs to the
                // next token.
                break;
            }
            slots = next;
            result = aggregate;
            count += 1;
            if matches!(aggregate, Match::FullMatch | Match::NotMatch) {
                break;
            }
        }

        let winner = match result {
            Match::FullMatch | Match::Waitlist => self
                .tokenizers
                .iter()
                .zip(slots.iter())
                .find(|(_, slot)| slot.1 == result),
            _ => None,
        };

        reader.advance_chars(count);
        let kind = match winner {
            Some((tokenizer, slot)) => {
                let text = reader.slice(start, reader.local_offset());
                tokenizer.produce(slot.0, text, reader)
            }
            None if count == 0 => TokenKind::End,
            None => TokenKind::Unknown,
        };
        let text = reader.slice(start, reader.local_offset());
        tracing::trace!(?kind, text, "token");
        Token {
            kind,
            text,
            position,
            offset,
        }
    }
}
