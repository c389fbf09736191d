use super::{AssignOp, LexError, Match, SourceReader, TokenKind, Tokenizer};
use crate::ast::EmbedOps;

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

/// `// line` and `/* block */` comments.
pub struct CommentTokenizer;

impl Tokenizer for CommentTokenizer {
    fn on_char(&self, _state: u32, ch: char, idx: usize) -> (u32, Match) {
        match (idx, ch) {
            (0, '/') => (0, Match::Pending),
            (1, '/') => (1, Match::FullMatch),
            (1, '*') => (2, Match::FullMatch),
            _ => (0, Match::NotMatch),
        }
    }

    fn produce<'a>(&self, state: u32, _text: &'a str, reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        if state == 1 {
            reader.read_line();
            TokenKind::Comment
        } else if reader.read_until("*/").is_some() {
            TokenKind::Comment
        } else {
            TokenKind::Error(LexError::UnterminatedComment)
        }
    }
}

/// Single-character delimiters from a fixed set.
pub struct DelimTokenizer {
    pub delims: &'static str,
}

impl Tokenizer for DelimTokenizer {
    fn on_char(&self, _state: u32, ch: char, idx: usize) -> (u32, Match) {
        if idx == 0 && self.delims.contains(ch) {
            (ch as u32, Match::FullMatch)
        } else {
            (0, Match::NotMatch)
        }
    }

    fn produce<'a>(&self, state: u32, _text: &'a str, _reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        TokenKind::Delim(char::from_u32(state).unwrap_or('\0'))
    }
}

/// Brackets of any kind from a fixed set.
pub struct KeyCharTokenizer {
    pub chars: &'static str,
}

impl Tokenizer for KeyCharTokenizer {
    fn on_char(&self, _state: u32, ch: char, idx: usize) -> (u32, Match) {
        if idx == 0 && self.chars.contains(ch) {
            (ch as u32, Match::FullMatch)
        } else {
            (0, Match::NotMatch)
        }
    }

    fn produce<'a>(&self, state: u32, _text: &'a str, _reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        TokenKind::KeyChar(char::from_u32(state).unwrap_or('\0'))
    }
}

/// Double-quoted string; the body is read up to the first unescaped quote.
pub struct StringTokenizer;

impl Tokenizer for StringTokenizer {
    fn on_char(&self, _state: u32, ch: char, idx: usize) -> (u32, Match) {
        if idx == 0 && ch == '"' {
            (0, Match::FullMatch)
        } else {
            (0, Match::NotMatch)
        }
    }

    fn produce<'a>(&self, _state: u32, _text: &'a str, reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        let mut escaping = false;
        let mut escaped = false;
        let raw = reader.read_while(|ch| {
            if escaping {
                escaping = false;
                return true;
            }
            match ch {
                '\\' => {
                    escaping = true;
                    escaped = true;
                    true
                }
                '"' => false,
                _ => true,
            }
        });
        match reader.advance() {
            Some('"') => TokenKind::Str { raw, escaped },
            _ => TokenKind::Error(LexError::UnterminatedString),
        }
    }
}

/// Integer literals: `123`, `-123`, `123u`, `0x1F`, `0b101`.
///
/// Hex and binary literals are unsigned. A negative literal with a `u`
/// suffix wraps into the unsigned range.
pub struct IntTokenizer;

mod int_state {
    pub const MINUS: u32 = 1;
    pub const ZERO: u32 = 2;
    pub const DEC: u32 = 3;
    pub const HEX_PREFIX: u32 = 4;
    pub const HEX: u32 = 5;
    pub const BIN_PREFIX: u32 = 6;
    pub const BIN: u32 = 7;
    pub const SUFFIX: u32 = 8;
}

impl Tokenizer for IntTokenizer {
    fn on_char(&self, state: u32, ch: char, idx: usize) -> (u32, Match) {
        use int_state::*;
        match (idx, state, ch) {
            (0, _, '-') => (MINUS, Match::Pending),
            (0, _, '0') => (ZERO, Match::Waitlist),
            (0, _, '1'..='9') => (DEC, Match::Waitlist),
            (0, _, _) => (0, Match::NotMatch),
            (_, MINUS, '0'..='9') => (DEC, Match::Waitlist),
            (_, ZERO, 'x' | 'X') => (HEX_PREFIX, Match::Pending),
            (_, ZERO, 'b' | 'B') => (BIN_PREFIX, Match::Pending),
            (_, ZERO | DEC, '0'..='9') => (DEC, Match::Waitlist),
            (_, ZERO | DEC, 'u' | 'U') => (SUFFIX, Match::Waitlist),
            (_, HEX_PREFIX | HEX, c) if c.is_ascii_hexdigit() => (HEX, Match::Waitlist),
            (_, BIN_PREFIX | BIN, '0' | '1') => (BIN, Match::Waitlist),
            _ => (0, Match::NotMatch),
        }
    }

    fn produce<'a>(&self, state: u32, text: &'a str, _reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        use int_state::*;
        let overflow = TokenKind::Error(LexError::IntOverflow);
        match state {
            HEX => u64::from_str_radix(&text[2..], 16).map_or(overflow, TokenKind::Uint),
            BIN => u64::from_str_radix(&text[2..], 2).map_or(overflow, TokenKind::Uint),
            SUFFIX => {
                let digits = &text[..text.len() - 1];
                if digits.starts_with('-') {
                    digits
                        .parse::<i64>()
                        .map_or(overflow, |v| TokenKind::Uint(v as u64))
                } else {
                    digits.parse::<u64>().map_or(overflow, TokenKind::Uint)
                }
            }
            _ => text.parse::<i64>().map_or(overflow, TokenKind::Int),
        }
    }
}

/// Floating point literals: `1.5`, `-.5`, `2.`, `1e5`, `1.5E-2`.
///
/// Plain digit runs also match, so list this after [`IntTokenizer`].
pub struct FPTokenizer;

mod fp_state {
    pub const MINUS: u32 = 1;
    pub const INT: u32 = 2;
    pub const BARE_DOT: u32 = 3;
    pub const DOT: u32 = 4;
    pub const FRAC: u32 = 5;
    pub const EXP: u32 = 6;
    pub const EXP_SIGN: u32 = 7;
    pub const EXP_DIGITS: u32 = 8;
}

impl Tokenizer for FPTokenizer {
    fn on_char(&self, state: u32, ch: char, idx: usize) -> (u32, Match) {
        use fp_state::*;
        match (idx, state, ch) {
            (0, _, '-') => (MINUS, Match::Pending),
            (0, _, '0'..='9') => (INT, Match::Waitlist),
            (0, _, '.') => (BARE_DOT, Match::Pending),
            (0, _, _) => (0, Match::NotMatch),
            (_, MINUS | INT, '0'..='9') => (INT, Match::Waitlist),
            (_, MINUS, '.') => (BARE_DOT, Match::Pending),
            (_, INT, '.') => (DOT, Match::Waitlist),
            (_, BARE_DOT | DOT | FRAC, '0'..='9') => (FRAC, Match::Waitlist),
            (_, INT | DOT | FRAC, 'e' | 'E') => (EXP, Match::Pending),
            (_, EXP, '+' | '-') => (EXP_SIGN, Match::Pending),
            (_, EXP | EXP_SIGN | EXP_DIGITS, '0'..='9') => (EXP_DIGITS, Match::Waitlist),
            _ => (0, Match::NotMatch),
        }
    }

    fn produce<'a>(&self, _state: u32, text: &'a str, _reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => TokenKind::FP(v),
            Ok(_) => TokenKind::Error(LexError::FloatOverflow),
            Err(_) => TokenKind::Error(LexError::InvalidNumber),
        }
    }
}

/// Case-insensitive `true` / `false`.
///
/// A complete word is only a waitlist match so that identifiers such as
/// `trueValue` still lex as variables.
pub struct BoolTokenizer;

const BOOL_WORDS: [&str; 2] = ["true", "false"];

impl Tokenizer for BoolTokenizer {
    fn on_char(&self, state: u32, ch: char, idx: usize) -> (u32, Match) {
        let word = if idx == 0 {
            match ch.to_ascii_lowercase() {
                't' => 0,
                'f' => 1,
                _ => return (0, Match::NotMatch),
            }
        } else {
            state
        };
        let expected = BOOL_WORDS[word as usize].as_bytes();
        match expected.get(idx) {
            Some(&b) if ch.to_ascii_lowercase() == b as char => {
                if idx + 1 == expected.len() {
                    (word, Match::Waitlist)
                } else {
                    (word, Match::Pending)
                }
            }
            _ => (0, Match::NotMatch),
        }
    }

    fn produce<'a>(&self, state: u32, _text: &'a str, _reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        TokenKind::Bool(state == 0)
    }
}

/// Variable names with an optional `:` or `` ` `` scope prefix.
pub struct VarTokenizer;

impl Tokenizer for VarTokenizer {
    fn on_char(&self, state: u32, ch: char, idx: usize) -> (u32, Match) {
        match (idx, state) {
            (0, _) if ch == ':' || ch == '`' => (1, Match::Pending),
            (0, _) if is_name_start(ch) => (2, Match::Waitlist),
            (_, 1) if is_name_start(ch) => (2, Match::Waitlist),
            (_, 2) if is_name_char(ch) => (2, Match::Waitlist),
            _ => (0, Match::NotMatch),
        }
    }

    fn produce<'a>(&self, _state: u32, text: &'a str, _reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        TokenKind::Var(text)
    }
}

/// Embedded operators, including the two-character forms.
pub struct EmbedOpTokenizer;

impl Tokenizer for EmbedOpTokenizer {
    fn on_char(&self, state: u32, ch: char, idx: usize) -> (u32, Match) {
        match idx {
            0 => match ch {
                '=' | '&' | '|' => (ch as u32, Match::Pending),
                '!' | '<' | '>' | '+' | '-' | '*' | '/' | '%' | '?' => (ch as u32, Match::Waitlist),
                _ => (0, Match::NotMatch),
            },
            1 => match (char::from_u32(state), ch) {
                (Some('=' | '!' | '<' | '>'), '=')
                | (Some('&'), '&')
                | (Some('|'), '|')
                | (Some('?'), '?') => (state, Match::FullMatch),
                _ => (0, Match::NotMatch),
            },
            _ => (0, Match::NotMatch),
        }
    }

    fn produce<'a>(&self, _state: u32, text: &'a str, _reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        EmbedOps::from_symbol(text).map_or(TokenKind::Unknown, TokenKind::EmbedOp)
    }
}

/// `=`, `?=`, `:=` and the self-operating `op=` forms.
pub struct AssignOpTokenizer;

impl Tokenizer for AssignOpTokenizer {
    fn on_char(&self, state: u32, ch: char, idx: usize) -> (u32, Match) {
        match idx {
            0 => match ch {
                '=' => (ch as u32, Match::Waitlist),
                '&' | '|' | '+' | '-' | '*' | '/' | '%' | '?' | ':' => (ch as u32, Match::Pending),
                _ => (0, Match::NotMatch),
            },
            1 if ch == '=' && state != '=' as u32 => (state, Match::Waitlist),
            _ => (0, Match::NotMatch),
        }
    }

    fn produce<'a>(&self, _state: u32, text: &'a str, _reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        let op = match text {
            "=" => AssignOp::Assign,
            "?=" => AssignOp::IfAbsent,
            ":=" => AssignOp::Create,
            "&=" => AssignOp::SelfOp(EmbedOps::And),
            "|=" => AssignOp::SelfOp(EmbedOps::Or),
            "+=" => AssignOp::SelfOp(EmbedOps::Add),
            "-=" => AssignOp::SelfOp(EmbedOps::Sub),
            "*=" => AssignOp::SelfOp(EmbedOps::Mul),
            "/=" => AssignOp::SelfOp(EmbedOps::Div),
            "%=" => AssignOp::SelfOp(EmbedOps::Rem),
            _ => return TokenKind::Unknown,
        };
        TokenKind::Assign(op)
    }
}

fn read_prefixed_name<'a>(reader: &mut SourceReader<'a>) -> Option<&'a str> {
    let name = reader.read_while(is_name_char);
    (!name.is_empty()).then_some(name)
}

/// `#Block[.type]` and `#Raw[.type]` headers.
pub struct BlockPrefixTokenizer;

impl Tokenizer for BlockPrefixTokenizer {
    fn on_char(&self, _state: u32, ch: char, idx: usize) -> (u32, Match) {
        if idx == 0 && ch == '#' {
            (0, Match::FullMatch)
        } else {
            (0, Match::NotMatch)
        }
    }

    fn produce<'a>(&self, _state: u32, _text: &'a str, reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        let full = reader.read_while(|ch| !super::is_blank(ch) && ch != '(');
        let (prefix, block_type) = full.split_once('.').unwrap_or((full, ""));
        match prefix {
            "Block" => TokenKind::Block(block_type),
            "Raw" => TokenKind::Raw(block_type),
            _ => TokenKind::Error(LexError::UnknownBlockPrefix),
        }
    }
}

/// `@name` meta-function prefix.
pub struct MetaFuncPrefixTokenizer;

impl Tokenizer for MetaFuncPrefixTokenizer {
    fn on_char(&self, _state: u32, ch: char, idx: usize) -> (u32, Match) {
        if idx == 0 && ch == '@' {
            (0, Match::FullMatch)
        } else {
            (0, Match::NotMatch)
        }
    }

    fn produce<'a>(&self, _state: u32, _text: &'a str, reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        read_prefixed_name(reader).map_or(TokenKind::Error(LexError::EmptyName), TokenKind::MetaFunc)
    }
}

/// `$name` function-call prefix.
pub struct FuncPrefixTokenizer;

impl Tokenizer for FuncPrefixTokenizer {
    fn on_char(&self, _state: u32, ch: char, idx: usize) -> (u32, Match) {
        if idx == 0 && ch == '$' {
            (0, Match::FullMatch)
        } else {
            (0, Match::NotMatch)
        }
    }

    fn produce<'a>(&self, _state: u32, _text: &'a str, reader: &mut SourceReader<'a>) -> TokenKind<'a> {
        read_prefixed_name(reader).map_or(TokenKind::Error(LexError::EmptyName), TokenKind::Func)
    }
}
