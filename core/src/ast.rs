//! Arena-backed syntax tree.
//!
//! Every non-leaf node lives in a [`MemoryPool`](crate::arena::MemoryPool)
//! and is referenced by `&'a` borrows, so a tree can never outlive the pool
//! that produced it. Leaf values (numbers, strings, variables) are stored
//! inline.

use core::fmt;
use core::ops::Range;

/// Byte range into the source unit a node was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self(start..end)
    }
    pub fn str_of<'s>(&self, source: &'s str) -> &'s str {
        &source[self.0.start..self.0.end]
    }
}

/// One-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePos {
    pub row: u32,
    pub col: u32,
}

impl SourcePos {
    pub const START: SourcePos = SourcePos { row: 1, col: 1 };
}

impl Default for SourcePos {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

/// Operators usable inside expressions, also reachable as `EmbedOp.<Name>(...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbedOps {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    ValueOr,
    Not,
    CheckExist,
}

impl EmbedOps {
    pub const ALL: [EmbedOps; 16] = [
        EmbedOps::Equal,
        EmbedOps::NotEqual,
        EmbedOps::Less,
        EmbedOps::LessEqual,
        EmbedOps::Greater,
        EmbedOps::GreaterEqual,
        EmbedOps::And,
        EmbedOps::Or,
        EmbedOps::Add,
        EmbedOps::Sub,
        EmbedOps::Mul,
        EmbedOps::Div,
        EmbedOps::Rem,
        EmbedOps::ValueOr,
        EmbedOps::Not,
        EmbedOps::CheckExist,
    ];

    pub fn is_unary(self) -> bool {
        matches!(self, EmbedOps::Not | EmbedOps::CheckExist)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            EmbedOps::Equal => "==",
            EmbedOps::NotEqual => "!=",
            EmbedOps::Less => "<",
            EmbedOps::LessEqual => "<=",
            EmbedOps::Greater => ">",
            EmbedOps::GreaterEqual => ">=",
            EmbedOps::And => "&&",
            EmbedOps::Or => "||",
            EmbedOps::Add => "+",
            EmbedOps::Sub => "-",
            EmbedOps::Mul => "*",
            EmbedOps::Div => "/",
            EmbedOps::Rem => "%",
            EmbedOps::ValueOr => "??",
            EmbedOps::Not => "!",
            EmbedOps::CheckExist => "?",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EmbedOps::Equal => "Equal",
            EmbedOps::NotEqual => "NotEqual",
            EmbedOps::Less => "Less",
            EmbedOps::LessEqual => "LessEqual",
            EmbedOps::Greater => "Greater",
            EmbedOps::GreaterEqual => "GreaterEqual",
            EmbedOps::And => "And",
            EmbedOps::Or => "Or",
            EmbedOps::Add => "Add",
            EmbedOps::Sub => "Sub",
            EmbedOps::Mul => "Mul",
            EmbedOps::Div => "Div",
            EmbedOps::Rem => "Rem",
            EmbedOps::ValueOr => "ValueOr",
            EmbedOps::Not => "Not",
            EmbedOps::CheckExist => "CheckExist",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for EmbedOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which contexts a variable reference may resolve in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarScope {
    /// Innermost context outwards, then the root.
    Normal,
    /// `:name`, current context only.
    Local,
    /// `` `name ``, root context only.
    Root,
}

impl VarScope {
    pub fn prefix(self) -> &'static str {
        match self {
            VarScope::Normal => "",
            VarScope::Local => ":",
            VarScope::Root => "`",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VarNameError {
    #[error("empty variable name")]
    Empty,
    #[error("Empty name part in [{0}]")]
    EmptyPart(String),
}

/// A variable reference resolved by name at evaluation time.
///
/// Keeps the full source text; the scope prefix is parsed once and skipped
/// by [`name`](Self::name).
#[derive(Debug, Clone, Copy)]
pub struct LateBindVar<'a> {
    full: &'a str,
    scope: VarScope,
}

impl<'a> LateBindVar<'a> {
    pub fn parse(full: &'a str) -> Result<Self, VarNameError> {
        let scope = match full.chars().next() {
            Some(':') => VarScope::Local,
            Some('`') => VarScope::Root,
            Some(_) => VarScope::Normal,
            None => return Err(VarNameError::Empty),
        };
        let var = Self { full, scope };
        if var.name().is_empty() {
            return Err(VarNameError::Empty);
        }
        if var.parts().any(str::is_empty) {
            return Err(VarNameError::EmptyPart(full.to_string()));
        }
        Ok(var)
    }

    pub fn full(&self) -> &'a str {
        self.full
    }

    pub fn scope(&self) -> VarScope {
        self.scope
    }

    pub fn name(&self) -> &'a str {
        &self.full[self.scope.prefix().len()..]
    }

    /// Dot-separated name parts, `a.b.c` yields `a`, `b`, `c`.
    pub fn parts(&self) -> core::str::Split<'a, char> {
        self.name().split('.')
    }
}

impl PartialEq for LateBindVar<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope && self.name() == other.name()
    }
}

impl fmt::Display for LateBindVar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall<'a> {
    pub name: &'a str,
    pub args: &'a [RawArg<'a>],
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr<'a> {
    pub op: EmbedOps,
    pub operand: RawArg<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr<'a> {
    pub op: EmbedOps,
    pub left: RawArg<'a>,
    pub right: RawArg<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr<'a> {
    pub target: RawArg<'a>,
    pub index: RawArg<'a>,
}

/// Parse-time expression node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawArg<'a> {
    Func(&'a FuncCall<'a>),
    Unary(&'a UnaryExpr<'a>),
    Binary(&'a BinaryExpr<'a>),
    Index(&'a IndexExpr<'a>),
    Var(LateBindVar<'a>),
    Str(&'a str),
    Uint(u64),
    Int(i64),
    FP(f64),
    Bool(bool),
}

impl RawArg<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            RawArg::Func(_) => "func-call",
            RawArg::Unary(_) => "unary-expr",
            RawArg::Binary(_) => "binary-expr",
            RawArg::Index(_) => "index-expr",
            RawArg::Var(_) => "variable",
            RawArg::Str(_) => "string",
            RawArg::Uint(_) => "uint",
            RawArg::Int(_) => "int",
            RawArg::FP(_) => "fp",
            RawArg::Bool(_) => "bool",
        }
    }
}

/// What an assignment does when the target is present or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NilBehavior {
    Pass,
    Skip,
    Throw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NilCheck {
    pub when_not_null: NilBehavior,
    pub when_null: NilBehavior,
}

impl NilCheck {
    /// `=`
    pub const ASSIGN: NilCheck = NilCheck::new(NilBehavior::Pass, NilBehavior::Pass);
    /// `?=`
    pub const IF_ABSENT: NilCheck = NilCheck::new(NilBehavior::Skip, NilBehavior::Pass);
    /// `:=`
    pub const CREATE: NilCheck = NilCheck::new(NilBehavior::Throw, NilBehavior::Pass);
    /// `+=` and friends
    pub const SELF_OP: NilCheck = NilCheck::new(NilBehavior::Pass, NilBehavior::Throw);

    pub const fn new(when_not_null: NilBehavior, when_null: NilBehavior) -> Self {
        Self {
            when_not_null,
            when_null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<'a> {
    pub target: LateBindVar<'a>,
    /// Right-hand side. For self-operating forms this is already
    /// `Binary(op, target, rhs)`.
    pub statement: RawArg<'a>,
    pub check: NilCheck,
    pub self_op: Option<EmbedOps>,
}

/// A named block whose body has not been parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBlock<'a> {
    pub block_type: &'a str,
    pub name: &'a str,
    pub source: &'a str,
    pub file_name: &'a str,
    /// Position of the first body character.
    pub position: SourcePos,
    /// Byte offset of `source` within the original file.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block<'a> {
    pub raw: RawBlock<'a>,
    pub content: &'a [BlockContent<'a>],
}

impl<'a> Block<'a> {
    pub fn name(&self) -> &'a str {
        self.raw.name
    }
    pub fn len(&self) -> usize {
        self.content.len()
    }
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statement<'a> {
    Assignment(&'a Assignment<'a>),
    Call(&'a FuncCall<'a>),
    RawBlock(&'a RawBlock<'a>),
    Block(&'a Block<'a>),
}

/// One statement of a block together with the meta-functions preceding it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockContent<'a> {
    pub statement: Statement<'a>,
    pub metas: &'a [FuncCall<'a>],
    pub span: Span,
    pub position: SourcePos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawBlockWithMeta<'a> {
    pub raw: &'a RawBlock<'a>,
    pub metas: &'a [FuncCall<'a>],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_prefixes() {
        let normal = LateBindVar::parse("abc.def").unwrap();
        assert_eq!(normal.scope(), VarScope::Normal);
        assert_eq!(normal.name(), "abc.def");
        assert_eq!(normal.parts().collect::<Vec<_>>(), ["abc", "def"]);

        let local = LateBindVar::parse(":tmp").unwrap();
        assert_eq!(local.scope(), VarScope::Local);
        assert_eq!(local.name(), "tmp");
        assert_eq!(local.full(), ":tmp");

        let root = LateBindVar::parse("`cfg").unwrap();
        assert_eq!(root.scope(), VarScope::Root);
        assert_eq!(root.name(), "cfg");
    }

    #[test]
    fn var_equality_ignores_storage() {
        let source = String::from("x.y");
        assert_eq!(
            LateBindVar::parse(&source).unwrap(),
            LateBindVar::parse("x.y").unwrap()
        );
        assert_ne!(
            LateBindVar::parse(":x").unwrap(),
            LateBindVar::parse("x").unwrap()
        );
    }

    #[test]
    fn var_rejects_empty_parts() {
        assert_eq!(LateBindVar::parse(":"), Err(VarNameError::Empty));
        assert_eq!(
            LateBindVar::parse("a..b"),
            Err(VarNameError::EmptyPart("a..b".to_string()))
        );
        assert_eq!(
            LateBindVar::parse("a."),
            Err(VarNameError::EmptyPart("a.".to_string()))
        );
    }

    #[test]
    fn embed_op_names_round_trip() {
        for op in EmbedOps::ALL {
            assert_eq!(EmbedOps::from_name(op.name()), Some(op));
            assert_eq!(EmbedOps::from_symbol(op.symbol()), Some(op));
        }
        assert!(EmbedOps::Not.is_unary());
        assert!(!EmbedOps::Sub.is_unary());
    }
}
