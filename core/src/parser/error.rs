use crate::api::{Diagnostic, Severity};
use crate::ast::{SourcePos, Span, VarNameError};
use crate::lexer::LexError;

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    /// A token that does not fit the current position.
    #[error("{0}")]
    UnexpectedToken(String),
    /// Input ended before the construct was closed.
    #[error("{0}")]
    UnexpectedEnd(String),
    /// The lexer rejected the input.
    #[error("{0}")]
    InvalidToken(LexError),
    #[error("{0}")]
    InvalidName(VarNameError),
    /// The guard line of a raw block never reappears.
    #[error("raw block is not closed by [{guard}]")]
    UnclosedRawBlock { guard: String },
}

/// Parser error with position
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// File name, with a `[block]` suffix inside re-parsed raw blocks.
    pub file: String,
    pub position: SourcePos,
    pub span: Span,
    /// Text of the offending token.
    pub token: String,
}

impl ParseError {
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken(_) => ("P001", None),
            ParseErrorKind::UnexpectedEnd(_) => ("P002", Some("Add the missing closing delimiter")),
            ParseErrorKind::InvalidToken(_) => ("P003", None),
            ParseErrorKind::InvalidName(_) => ("P004", Some("Names are dot-separated identifiers")),
            ParseErrorKind::UnclosedRawBlock { .. } => (
                "P005",
                Some("A raw block ends with the text following its '{' plus '}'"),
            ),
        };
        let mut message = self.kind.to_string();
        if !self.token.is_empty() {
            message = format!("{message}, at [{}]", self.token);
        }
        Diagnostic {
            severity: Severity::Error,
            message,
            span: self.span.clone(),
            related: Vec::new(),
            help: help.map(str::to_string),
            code: Some(code.to_string()),
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.position, self.kind)?;
        if !self.token.is_empty() {
            write!(f, " at [{}]", self.token)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
