#[macro_use]
mod common;

use indoc::indoc;
use nailang::arena::MemoryPool;
use nailang::parser::parse_single_expr;
use nailang::runtime::{Arg, RuntimeError, RuntimeErrorKind};
use nailang::serializer::stringify;
use nailang::{Engine, EngineOptions, Error};
use pretty_assertions::assert_eq;

// ======== Literals ========

test_case! {
    name: numeric_literals,
    input: { indoc! {r#"
        i = -123;
        u = 123u;
        hex = 0x1F;
        bin = 0b101;
        half = .5;
        big = 1e3;
        small = 1.5E-2;
    "#} },
    expect: {
        "i" => Arg::Int(-123),
        "u" => Arg::Uint(123),
        "hex" => Arg::Uint(31),
        "bin" => Arg::Uint(5),
        "half" => Arg::FP(0.5),
        "big" => Arg::FP(1000.0),
        "small" => Arg::FP(0.015),
    },
}

test_case! {
    name: bool_literals_ignore_case,
    input: { "a = TRUE; b = False;" },
    expect: {
        "a" => Arg::Bool(true),
        "b" => Arg::Bool(false),
    },
}

test_case! {
    name: string_escapes,
    input: { r#"s = "tab\tquote\"";"# },
    expect: { "s" => Arg::str("tab\tquote\"") },
}

// ======== Operators ========

test_case! {
    name: comparisons_across_number_kinds,
    input: { indoc! {r#"
        a = 1u < 2;
        b = -1 < 0u;
        c = 2.5 >= 2;
        d = "abc" < "abd";
        e = true != false;
    "#} },
    expect: {
        "a" => Arg::Bool(true),
        "b" => Arg::Bool(true),
        "c" => Arg::Bool(true),
        "d" => Arg::Bool(true),
        "e" => Arg::Bool(true),
    },
}

test_case! {
    name: parenthesized_chains,
    input: { "x = ((1 + 2) * (10 - 4)) / 3;" },
    expect: { "x" => Arg::Int(6) },
}

test_case! {
    name: value_or_and_existence,
    input: { indoc! {r#"
        present = 3;
        a = present ?? 0;
        b = missing ?? 7;
        c = ?present;
        d = ?missing;
    "#} },
    expect: {
        "a" => Arg::Int(3),
        "b" => Arg::Int(7),
        "c" => Arg::Bool(true),
        "d" => Arg::Bool(false),
    },
}

test_case! {
    name: logic_short_circuits_unresolved_operand,
    input: { "a = false && nope; b = true || nope;" },
    expect: {
        "a" => Arg::Bool(false),
        "b" => Arg::Bool(true),
    },
}

test_case! {
    name: unresolved_var_fails,
    input: { "a = nope + 1;" },
    error: { Error::Runtime(RuntimeError { kind: RuntimeErrorKind::UnresolvedVar(_), .. }) },
}

test_case! {
    name: integer_division_by_zero_fails,
    input: { "a = 1 / 0;" },
    error: { Error::Runtime(RuntimeError { kind: RuntimeErrorKind::DivisionByZero, .. }) },
}

test_case! {
    name: mismatched_operands_fail,
    input: { "a = \"x\" * 2;" },
    error: { Error::Runtime(RuntimeError { kind: RuntimeErrorKind::InvalidOperation { .. }, .. }) },
}

// ======== Indexing and members ========

test_case! {
    name: string_index_and_length,
    input: { indoc! {r#"
        s = "héllo";
        first = s[0];
        second = s[1];
        last = s[-1];
        len = s.Length;
        nested = "abc"[1];
    "#} },
    expect: {
        "first" => Arg::str("h"),
        "second" => Arg::str("é"),
        "last" => Arg::str("o"),
        "len" => Arg::Uint(5),
        "nested" => Arg::str("b"),
    },
}

#[test]
fn index_out_of_range_reports_expression() {
    let Err(Error::Runtime(err)) = common::run_script("s = \"ab\"; i = 3; c = s[i];", &[]) else {
        panic!("expected a runtime error");
    };
    assert_eq!(err.kind.to_string(), "index out of range, access [3] of length [2] with [i]");
}

// ======== Built-in functions ========

test_case! {
    name: format_and_math,
    input: { indoc! {r#"
        id = $Format("{}-{:03}", "id", 7);
        hex = $Format("{:x}", 255);
        big = $Math.Max(3, 9u, 4);
        root = $Math.Sqrt(16);
        parsed = $Math.ParseInt("12") ?? -1;
        fallback = $Math.ParseInt("x") ?? -1;
        sum = $EmbedOp.Add(2, 3);
    "#} },
    expect: {
        "id" => Arg::str("id-007"),
        "hex" => Arg::str("ff"),
        "big" => Arg::Uint(9),
        "root" => Arg::FP(4.0),
        "parsed" => Arg::Int(12),
        "fallback" => Arg::Int(-1),
        "sum" => Arg::Int(5),
    },
}

test_case! {
    name: exists_by_name,
    input: { "a = 1; x = $Exists(a); y = $Exists(\"b\");" },
    expect: {
        "x" => Arg::Bool(true),
        "y" => Arg::Bool(false),
    },
}

test_case! {
    name: unknown_function_fails,
    input: { "$Nope(1, 2);" },
    error: { Error::Runtime(RuntimeError { kind: RuntimeErrorKind::UnresolvedFunc { args: 2, .. }, .. }) },
}

// ======== Stringify round trip ========

const ROUND_TRIP_EXPRS: &[&str] = &[
    "1 + 2",
    "-3 * (4 - 1)",
    "!(1 < 2)",
    "(7u % 4) == 3u",
    "\"a\\tb\" + \"c\"",
    "$Math.Max(1, 2.5, (3 - 1))",
    "$Format(\"{}:{}\", 1, true)",
    "\"hello\"[-1]",
    "(\"ab\" + \"c\")[2] ?? 5",
    "$Math.ParseInt(\"42\") ?? 0",
    "(?missing) || false",
    "0x10 + 0b11",
];

#[test]
fn stringified_expressions_parse_and_evaluate_the_same() {
    let pool = MemoryPool::new();
    let mut engine = Engine::new(&pool, EngineOptions::default(), |_| {});
    for source in ROUND_TRIP_EXPRS {
        let first = parse_single_expr(&pool, source).unwrap().unwrap();
        let text = stringify(&first);
        let reparsed = parse_single_expr(&pool, pool.alloc_str(&text)).unwrap().unwrap();
        assert_eq!(stringify(&reparsed), text, "unstable rendering of {source}");

        let expected = engine.evaluate(source).map_err(|err| err.to_string());
        let actual = engine.evaluate(&text).map_err(|err| err.to_string());
        assert_eq!(actual, expected, "{source} rendered as {text}");
    }
}
