#[macro_use]
mod common;

use indoc::indoc;
use nailang::ast::EmbedOps;
use nailang::runtime::{Arg, RuntimeError, RuntimeErrorKind};
use nailang::Error;

// ======== Plain and nil-checked assignment ========

test_case! {
    name: assign_creates_and_overwrites,
    input: { "a = 1; a = \"text\"; b = a;" },
    expect: {
        "a" => Arg::str("text"),
        "b" => Arg::str("text"),
    },
}

test_case! {
    name: assign_if_absent_keeps_existing,
    input: { indoc! {r#"
        a ?= 1;
        a ?= 2;
        b ?= a + 10;
    "#} },
    expect: {
        "a" => Arg::Int(1),
        "b" => Arg::Int(11),
    },
}

test_case! {
    name: create_on_existing_fails,
    input: { "a := 1; a := 2;" },
    error: { Error::Runtime(RuntimeError { kind: RuntimeErrorKind::VarExists(_), .. }) },
}

test_case! {
    name: create_on_root_defined_var_fails,
    input: { "limit := 3;" },
    roots: { "limit" => Arg::Int(10) },
    error: { Error::Runtime(RuntimeError { kind: RuntimeErrorKind::VarExists(_), .. }) },
}

// ======== Self-operating assignment ========

test_case! {
    name: self_ops_on_numbers,
    input: { indoc! {r#"
        a = 10;
        a += 5;
        a -= 3;
        a *= 4;
        a /= 6;
        a %= 5;
        f = 1.5;
        f *= 2;
    "#} },
    expect: {
        "a" => Arg::Int(3),
        "f" => Arg::FP(3.0),
    },
}

test_case! {
    name: self_op_concatenates_strings,
    input: { "s := \"Hello \"; s += \"World\";" },
    expect: { "s" => Arg::str("Hello World") },
}

test_case! {
    name: self_op_keeps_unsigned,
    input: { "u = 5u; u += 1;" },
    expect: { "u" => Arg::Uint(6) },
}

#[test]
fn self_op_on_missing_var_names_the_op() {
    let Err(Error::Runtime(err)) = common::run_script("total *= 2;", &[]) else {
        panic!("expected a runtime error");
    };
    assert_eq!(
        err.kind,
        RuntimeErrorKind::VarMissingForOp {
            name: "total".to_string(),
            op: EmbedOps::Mul,
        }
    );
    assert_eq!(err.kind.to_string(), "Var [total] does not exists, expect perform [Mul] on it");
}

// ======== Scopes ========

test_case! {
    name: block_locals_do_not_leak,
    input: { indoc! {r#"
        outer = 1;
        #Block("inner"){
            outer = 2;
            hidden = 3;
        }
        seen = ?hidden;
    "#} },
    expect: {
        "outer" => Arg::Int(2),
        "seen" => Arg::Bool(false),
    },
}

test_case! {
    name: local_scope_shadows_outer,
    input: { indoc! {r#"
        x = 1;
        #Block("inner"){
            :x = 5;
            copy = x;
            `fromInner = copy;
        }
    "#} },
    expect: {
        "x" => Arg::Int(1),
        "fromInner" => Arg::Int(5),
    },
}

test_case! {
    name: root_scope_writes_through_functions,
    input: { indoc! {r#"
        @DefFunc(v)
        #Block("publish"){
            `published = v * 2;
        }
        $publish(21);
    "#} },
    expect: { "published" => Arg::Int(42) },
}

test_case! {
    name: assigning_empty_removes_var,
    input: { indoc! {r#"
        s = "abc";
        x = 1;
        x = $Math.ParseInt(s);
        gone = ?x;
    "#} },
    expect: { "gone" => Arg::Bool(false) },
}
