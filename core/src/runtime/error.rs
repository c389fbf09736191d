//! Runtime evaluation errors.
//!
//! Errors are raised without a location and pick one up from the innermost
//! statement they unwind through, so every error that leaves the runtime
//! names the file, block and statement that failed.

use std::fmt;

use crate::api::{Diagnostic, RelatedInfo, Severity};
use crate::ast::{EmbedOps, SourcePos, Span};
use crate::custom_var::QueryError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("Func [{func}] requires {expected} args, get {actual}")]
    ArgCount { func: String, expected: String, actual: usize },
    #[error("Func [{func}] expects {expected} as argument {index}, get [{actual}]")]
    ArgType {
        func: String,
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Var [{0}] cannot be resolved")]
    UnresolvedVar(String),
    #[error("Func [{name}] with [{args}] args cannot be resolved.")]
    UnresolvedFunc { name: String, args: usize },
    #[error("index out of range, access [{index}] of length [{len}] with [{expr}]")]
    IndexOutOfRange { index: i128, len: usize, expr: String },
    #[error("Format error: {0}")]
    Format(String),
    #[error("{0}")]
    Host(String),
    #[error("{0}")]
    Query(QueryError),
    #[error("{0}")]
    Thrown(String),
    #[error("Var [{0}] already exists")]
    VarExists(String),
    #[error("Var [{name}] does not exists, expect perform [{op}] on it")]
    VarMissingForOp { name: String, op: EmbedOps },
    #[error("Cannot apply [{op}] on [{left}] and [{right}]")]
    InvalidOperation {
        op: EmbedOps,
        left: &'static str,
        right: &'static str,
    },
    #[error("Cannot apply [{op}] on [{operand}]")]
    InvalidUnary { op: EmbedOps, operand: &'static str },
    #[error("Cannot index into [{0}]")]
    NotIndexable(&'static str),
    #[error("{0}")]
    InvalidControlFlow(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Evaluation stack overflow: depth {depth} exceeds maximum of {max_depth}")]
    StackOverflow { depth: usize, max_depth: usize },
    #[error("Loop exceeded the limit of {limit} iterations")]
    IterationLimit { limit: usize },
}

impl RuntimeErrorKind {
    /// Resource limits as opposed to script mistakes.
    pub fn is_resource_exceeded(&self) -> bool {
        matches!(self, Self::StackOverflow { .. } | Self::IterationLimit { .. })
    }

    fn code(&self) -> &'static str {
        match self {
            Self::ArgCount { .. } => "R001",
            Self::ArgType { .. } => "R002",
            Self::UnresolvedVar(_) => "R003",
            Self::UnresolvedFunc { .. } => "R004",
            Self::IndexOutOfRange { .. } => "R005",
            Self::Format(_) => "R006",
            Self::Host(_) | Self::Query(_) => "R007",
            Self::Thrown(_) => "R008",
            Self::VarExists(_) | Self::VarMissingForOp { .. } => "R009",
            Self::InvalidOperation { .. } | Self::InvalidUnary { .. } | Self::NotIndexable(_) => "R010",
            Self::InvalidControlFlow(_) => "R011",
            Self::DivisionByZero => "R012",
            Self::StackOverflow { .. } => "R013",
            Self::IterationLimit { .. } => "R014",
        }
    }
}

impl From<QueryError> for RuntimeErrorKind {
    fn from(err: QueryError) -> Self {
        RuntimeErrorKind::Query(err)
    }
}

/// Where a runtime error happened.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorLocation {
    pub file: String,
    /// Name of the enclosing block, empty for the top level.
    pub block: String,
    pub position: SourcePos,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    /// Text of the failing expression or statement.
    pub fragment: Option<String>,
    pub location: Option<ErrorLocation>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        Self {
            kind,
            fragment: None,
            location: None,
        }
    }

    pub fn with_fragment(mut self, fragment: impl FnOnce() -> String) -> Self {
        if self.fragment.is_none() {
            self.fragment = Some(fragment());
        }
        self
    }

    /// Attaches `location` unless a more precise one is already set.
    pub fn located(mut self, location: impl FnOnce() -> ErrorLocation) -> Self {
        if self.location.is_none() {
            self.location = Some(location());
        }
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let span = self.location.as_ref().map_or(Span::new(0, 0), |loc| loc.span.clone());
        let related = self
            .fragment
            .iter()
            .map(|fragment| RelatedInfo {
                span: span.clone(),
                message: format!("while evaluating `{fragment}`"),
            })
            .collect();
        let help = match &self.kind {
            RuntimeErrorKind::VarMissingForOp { .. } => Some("Create the variable with `:=` first".to_string()),
            RuntimeErrorKind::StackOverflow { .. } => Some("Raise ExecutionOptions::max_depth or check for unbounded recursion".to_string()),
            _ => None,
        };
        Diagnostic {
            severity: Severity::Error,
            message: self.kind.to_string(),
            span,
            related,
            help,
            code: Some(self.kind.code().to_string()),
        }
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        RuntimeError::new(kind)
    }
}

impl From<QueryError> for RuntimeError {
    fn from(err: QueryError) -> Self {
        RuntimeError::new(err.into())
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}:{}: ", loc.file, loc.position)?;
            if !loc.block.is_empty() {
                write!(f, "in block [{}]: ", loc.block)?;
            }
        }
        write!(f, "{}", self.kind)?;
        if let Some(fragment) = &self.fragment {
            write!(f, " (at `{fragment}`)")?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}
