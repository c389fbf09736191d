//! Lexer configurations used by the parser, one per parsing position.

use super::tokenizers::*;
use super::Lexer;

const BRACKETS: KeyCharTokenizer = KeyCharTokenizer { chars: "()[]" };

/// Lexers for one expression context: `arg` is used where an operand is
/// expected, `op` right after an operand.
pub struct ExprLexers {
    pub arg: Lexer,
    pub op: Lexer,
    /// Delimiters that end the expression.
    pub delims: &'static str,
    /// Reason reported when input ends before a delimiter; `None` accepts it.
    pub end_message: Option<&'static str>,
}

macro_rules! expr_lexers {
    ($name:ident, $delims:literal, $end:expr) => {
        pub static $name: ExprLexers = ExprLexers {
            arg: Lexer::new(&[
                &CommentTokenizer,
                &DelimTokenizer { delims: $delims },
                &BRACKETS,
                &FuncPrefixTokenizer,
                &StringTokenizer,
                &IntTokenizer,
                &FPTokenizer,
                &BoolTokenizer,
                &VarTokenizer,
                &EmbedOpTokenizer,
            ]),
            op: Lexer::new(&[
                &CommentTokenizer,
                &DelimTokenizer { delims: $delims },
                &BRACKETS,
                &EmbedOpTokenizer,
            ]),
            delims: $delims,
            end_message: $end,
        };
    };
}

expr_lexers!(CALL_ARGS, ",)", Some("Expect ')' before reaching end"));
expr_lexers!(GROUP, ")", Some("Expect ')' before reaching end"));
expr_lexers!(INDEX, "]", Some("Expect ']' before reaching end"));
expr_lexers!(STATEMENT, ";", Some("Expected end with ;"));
expr_lexers!(SINGLE_EXPR, ";", None);

/// Start of a statement inside a block.
pub static BLOCK_CONTENT: Lexer = Lexer::new(&[
    &CommentTokenizer,
    &MetaFuncPrefixTokenizer,
    &BlockPrefixTokenizer,
    &FuncPrefixTokenizer,
    &VarTokenizer,
    &KeyCharTokenizer { chars: "{}" },
]);

/// Top level of a file when only raw blocks are collected.
pub static RAW_LISTING: Lexer = Lexer::new(&[
    &CommentTokenizer,
    &MetaFuncPrefixTokenizer,
    &BlockPrefixTokenizer,
]);

pub static ASSIGN_OP: Lexer = Lexer::new(&[&CommentTokenizer, &AssignOpTokenizer]);

/// Block headers and function-call openers.
pub static HEADER: Lexer = Lexer::new(&[
    &CommentTokenizer,
    &KeyCharTokenizer { chars: "(){}" },
    &StringTokenizer,
]);

pub static SEMICOLON: Lexer = Lexer::new(&[&CommentTokenizer, &DelimTokenizer { delims: ";" }]);
