//! Public error types for the Nailang API.
//!
//! Parser and runtime errors are converted to these types at the API
//! boundary. Every variant can be rendered as one or more [`Diagnostic`]s.

use std::fmt;

use crate::ast::Span;
use crate::parser::ParseError;
use crate::runtime::RuntimeError;

/// Public error type for all Nailang operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid API usage (e.g. a malformed `-D name=expr` definition).
    Api(String),

    /// The source did not parse.
    Parse { diagnostics: Vec<Diagnostic> },

    /// Evaluation failed (unresolved names, bad operands, thrown errors).
    Runtime(RuntimeError),

    /// Resource limits exceeded (stack depth, loop iterations).
    ResourceExceeded(RuntimeError),
}

impl Error {
    /// The diagnostics describing this error, for rendering.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Api(msg) => vec![Diagnostic::error(msg.clone(), Span::default())],
            Error::Parse { diagnostics } => diagnostics.clone(),
            Error::Runtime(err) | Error::ResourceExceeded(err) => vec![err.to_diagnostic()],
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Api(msg) => write!(f, "API error: {}", msg),
            Error::Parse { diagnostics } => {
                let error_count = diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Error)
                    .count();
                write!(f, "Parsing failed with {} error(s)", error_count)
            }
            Error::Runtime(err) => write!(f, "Runtime error: {}", err),
            Error::ResourceExceeded(err) => write!(f, "Resource limit exceeded: {}", err),
        }
    }
}

impl std::error::Error for Error {}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,

    /// Optional error code (e.g. "R003") for documentation lookup.
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            related: Vec::new(),
            help: None,
            code: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Related information for a diagnostic (e.g. "while evaluating ...").
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}

// ============================================================================
// Conversion from internal errors
// ============================================================================

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse {
            diagnostics: vec![err.to_diagnostic()],
        }
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        if err.kind.is_resource_exceeded() {
            Error::ResourceExceeded(err)
        } else {
            Error::Runtime(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RuntimeErrorKind;

    #[test]
    fn resource_limits_are_separated() {
        let overflow = RuntimeError::new(RuntimeErrorKind::StackOverflow { depth: 3, max_depth: 3 });
        assert!(matches!(Error::from(overflow), Error::ResourceExceeded(_)));

        let thrown = RuntimeError::new(RuntimeErrorKind::Thrown("boom".to_string()));
        let err = Error::from(thrown);
        assert_eq!(err.to_string(), "Runtime error: boom");
        assert_eq!(err.diagnostics()[0].code.as_deref(), Some("R008"));
    }
}
