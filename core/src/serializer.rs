//! Renders syntax trees back to source text.
//!
//! The output parses back to an equal tree: compound operands are wrapped in
//! parentheses, unsigned integers keep their `u` suffix and strings are
//! re-escaped.

use std::fmt::Write;

use crate::ast::{Assignment, Block, FuncCall, NilCheck, RawArg, RawBlock, Statement};

pub fn stringify(arg: &RawArg<'_>) -> String {
    let mut out = String::new();
    write_arg(&mut out, arg);
    out
}

/// `$Name(args)`
pub fn stringify_call(call: &FuncCall<'_>) -> String {
    let mut out = String::new();
    write_call(&mut out, '$', call);
    out
}

/// `@Name(args)`
pub fn stringify_meta(call: &FuncCall<'_>) -> String {
    let mut out = String::new();
    write_call(&mut out, '@', call);
    out
}

pub fn stringify_assignment(assign: &Assignment<'_>) -> String {
    let mut out = String::new();
    write_assignment(&mut out, assign);
    out
}

pub fn stringify_statement(statement: &Statement<'_>) -> String {
    let mut out = String::new();
    write_statement(&mut out, statement, 0);
    out
}

/// Renders the statements of `block`, one per line, without its header.
pub fn stringify_block(block: &Block<'_>) -> String {
    let mut out = String::new();
    write_content(&mut out, block, 0);
    out
}

fn is_compound(arg: &RawArg<'_>) -> bool {
    matches!(arg, RawArg::Unary(_) | RawArg::Binary(_))
}

fn write_operand(out: &mut String, arg: &RawArg<'_>) {
    if is_compound(arg) {
        out.push('(');
        write_arg(out, arg);
        out.push(')');
    } else {
        write_arg(out, arg);
    }
}

fn write_arg(out: &mut String, arg: &RawArg<'_>) {
    match arg {
        RawArg::Func(call) => write_call(out, '$', call),
        RawArg::Unary(unary) => {
            out.push_str(unary.op.symbol());
            write_operand(out, &unary.operand);
        }
        RawArg::Binary(binary) => {
            write_operand(out, &binary.left);
            let _ = write!(out, " {} ", binary.op.symbol());
            write_operand(out, &binary.right);
        }
        RawArg::Index(index) => {
            write_operand(out, &index.target);
            out.push('[');
            write_arg(out, &index.index);
            out.push(']');
        }
        RawArg::Var(var) => out.push_str(var.full()),
        RawArg::Str(text) => write_str_literal(out, text),
        RawArg::Uint(v) => {
            let _ = write!(out, "{v}u");
        }
        RawArg::Int(v) => {
            let _ = write!(out, "{v}");
        }
        RawArg::FP(v) => {
            let _ = write!(out, "{v:?}");
        }
        RawArg::Bool(v) => {
            let _ = write!(out, "{v}");
        }
    }
}

fn write_str_literal(out: &mut String, text: &str) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
}

fn write_call(out: &mut String, prefix: char, call: &FuncCall<'_>) {
    out.push(prefix);
    out.push_str(call.name);
    out.push('(');
    for (i, arg) in call.args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_arg(out, arg);
    }
    out.push(')');
}

fn write_assignment(out: &mut String, assign: &Assignment<'_>) {
    out.push_str(assign.target.full());
    match (assign.self_op, &assign.statement) {
        (Some(op), RawArg::Binary(binary)) => {
            let _ = write!(out, " {}= ", op.symbol());
            write_arg(out, &binary.right);
        }
        _ => {
            let op = match assign.check {
                NilCheck::IF_ABSENT => "?=",
                NilCheck::CREATE => ":=",
                _ => "=",
            };
            let _ = write!(out, " {op} ");
            write_arg(out, &assign.statement);
        }
    }
}

fn write_header(out: &mut String, prefix: &str, raw: &RawBlock<'_>) {
    out.push_str(prefix);
    if !raw.block_type.is_empty() {
        out.push('.');
        out.push_str(raw.block_type);
    }
    out.push('(');
    write_str_literal(out, raw.name);
    out.push_str("){");
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("    ");
    }
}

fn write_statement(out: &mut String, statement: &Statement<'_>, level: usize) {
    match statement {
        Statement::Assignment(assign) => {
            write_assignment(out, assign);
            out.push(';');
        }
        Statement::Call(call) => {
            write_call(out, '$', call);
            out.push(';');
        }
        Statement::RawBlock(raw) => {
            // The guard is the rest of the opening line plus '}'.
            const GUARD: &str = " --raw";
            write_header(out, "#Raw", raw);
            let _ = writeln!(out, "{GUARD}");
            out.push_str(raw.source);
            let _ = write!(out, "{GUARD}}}");
        }
        Statement::Block(block) => {
            write_header(out, "#Block", &block.raw);
            out.push('\n');
            write_content(out, block, level + 1);
            indent(out, level);
            out.push('}');
        }
    }
}

fn write_content(out: &mut String, block: &Block<'_>, level: usize) {
    for content in block.content {
        indent(out, level);
        for meta in content.metas {
            write_call(out, '@', meta);
            out.push(' ');
        }
        write_statement(out, &content.statement, level);
        out.push('\n');
    }
}
