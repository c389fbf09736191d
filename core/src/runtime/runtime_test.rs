use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::*;
use crate::api::ExecutionOptions;
use crate::arena::MemoryPool;
use crate::ast::EmbedOps;
use crate::parser::parse;
use crate::test_utils::init_test_logging;

type Vars = BTreeMap<String, Arg<'static>>;

fn run_with<'a>(pool: &'a MemoryPool, source: &'a str, options: ExecutionOptions, host: Option<Recorder>) -> Result<Vars, RuntimeError> {
    init_test_logging();
    let block = parse(pool, source, "test.nl").unwrap_or_else(|err| panic!("parse failed: {err}"));
    let mut runtime = NailangRuntime::new(pool, large_context()).with_options(options);
    if let Some(host) = host {
        runtime = runtime.with_host(host);
    }
    runtime.execute(block, None)?;
    let vars = runtime
        .root()
        .borrow()
        .args()
        .into_iter()
        .map(|(name, value)| (name, value.into_owned()))
        .collect();
    Ok(vars)
}

fn run(source: &str) -> Result<Vars, RuntimeError> {
    let pool = MemoryPool::new();
    run_with(&pool, source, ExecutionOptions::default(), None)
}

fn run_ok(source: &str) -> Vars {
    run(source).unwrap_or_else(|err| panic!("runtime error: {err}"))
}

fn run_err(source: &str) -> RuntimeErrorKind {
    match run(source) {
        Ok(vars) => panic!("expected an error, got {vars:?}"),
        Err(err) => err.kind,
    }
}

#[derive(Default, Clone)]
struct Recorder {
    printed: Rc<RefCell<Vec<String>>>,
    tags: Rc<RefCell<Vec<String>>>,
    raws: Rc<RefCell<Vec<String>>>,
}

impl<'a> NailangHost<'a> for Recorder {
    fn call_function(&mut self, name: &str, args: &[Arg<'a>]) -> Result<Option<Arg<'a>>, HostError> {
        match name {
            "Print" => {
                let line = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
                self.printed.borrow_mut().push(line);
                Ok(Some(Arg::Empty))
            }
            "Fail" => Err(HostError("host refused".to_string())),
            _ => Ok(None),
        }
    }

    fn handle_meta(&mut self, name: &str, args: &[Arg<'a>], _content: &'a BlockContent<'a>) -> Result<Option<MetaResult>, HostError> {
        match name {
            "Tag" => {
                self.tags.borrow_mut().extend(args.iter().map(ToString::to_string));
                Ok(Some(MetaResult::Next))
            }
            "Hide" => Ok(Some(MetaResult::Skip)),
            _ => Ok(None),
        }
    }

    fn on_raw_block(&mut self, raw: &'a RawBlock<'a>, _metas: &'a [FuncCall<'a>]) -> Result<(), HostError> {
        self.raws.borrow_mut().push(raw.name.to_string());
        Ok(())
    }
}

// ============================================================================
// Assignments
// ============================================================================

#[test]
fn assignment_forms() {
    let vars = run_ok(indoc! {r#"
        str := "Hello ";
        str += "World";
        n = 1;
        n = 2;
        n ?= 3;
        fresh ?= 4u;
    "#});
    assert_eq!(vars["str"], Arg::str("Hello World"));
    assert_eq!(vars["n"], Arg::Int(2));
    assert_eq!(vars["fresh"], Arg::Uint(4));
}

#[test]
fn skipped_assignment_does_not_evaluate() {
    let vars = run_ok(indoc! {r#"
        s = 1;
        s ?= $Throw("not evaluated");
    "#});
    assert_eq!(vars["s"], Arg::Int(1));
}

#[test]
fn create_rejects_existing() {
    assert_eq!(run_err("x := 1; x := 2;"), RuntimeErrorKind::VarExists("x".to_string()));
}

#[test]
fn self_op_requires_existing() {
    let kind = run_err("total += 1;");
    assert_eq!(kind.to_string(), "Var [total] does not exists, expect perform [Add] on it");
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn logic_short_circuits() {
    let vars = run_ok(indoc! {r#"
        a = false && $Throw("left decides");
        b = true || $Throw("left decides");
        c = !a;
    "#});
    assert_eq!(vars["a"], Arg::Bool(false));
    assert_eq!(vars["b"], Arg::Bool(true));
    assert_eq!(vars["c"], Arg::Bool(true));
}

#[test]
fn existence_checks() {
    let vars = run_ok(indoc! {r#"
        s = "x";
        e1 = ?s;
        e2 = ?nope;
        v = nope ?? 3;
        w = s ?? 3;
        x1 = $Exists("s");
        x2 = $Exists(nope);
    "#});
    assert_eq!(vars["e1"], Arg::Bool(true));
    assert_eq!(vars["e2"], Arg::Bool(false));
    assert_eq!(vars["v"], Arg::Int(3));
    assert_eq!(vars["w"], Arg::str("x"));
    assert_eq!(vars["x1"], Arg::Bool(true));
    assert_eq!(vars["x2"], Arg::Bool(false));
}

#[test]
fn arithmetic_errors() {
    assert_eq!(run_err("d = 1 / 0;"), RuntimeErrorKind::DivisionByZero);
    assert_eq!(
        run_err(r#"bad = "a" - 1;"#),
        RuntimeErrorKind::InvalidOperation {
            op: EmbedOps::Sub,
            left: "string",
            right: "int",
        }
    );
    assert_eq!(run_err("u = nope + 1;"), RuntimeErrorKind::UnresolvedVar("nope".to_string()));
}

#[test]
fn comparing_bool_with_number_is_invalid() {
    assert_eq!(
        run_err("same = 1 == true;"),
        RuntimeErrorKind::InvalidOperation {
            op: EmbedOps::Equal,
            left: "int",
            right: "bool",
        }
    );
    let vars = run_ok("n = 4 + true;");
    assert_eq!(vars["n"], Arg::Uint(5));
}

#[test]
fn string_indexing_and_length() {
    let vars = run_ok(indoc! {r#"
        s = "héllo";
        a = s[1];
        b = s[-1];
        n = s.Length;
    "#});
    assert_eq!(vars["a"], Arg::str("é"));
    assert_eq!(vars["b"], Arg::str("o"));
    assert_eq!(vars["n"], Arg::Uint(5));
}

#[test]
fn index_out_of_range_names_the_index() {
    let kind = run_err(indoc! {r#"
        s = "abc";
        idx = 7;
        c = s[idx];
    "#});
    assert_eq!(kind.to_string(), "index out of range, access [7] of length [3] with [idx]");
    assert_eq!(run_err("n = 5; c = n[0];"), RuntimeErrorKind::NotIndexable("int"));
}

#[test]
fn builtin_functions() {
    let vars = run_ok(indoc! {r#"
        f = $Format("{}-{:03d}", "id", 7);
        e = $EmbedOp.Add(1, 2);
        m = $Math.Max(1, 7u, 3);
        p = $Math.ParseInt("zz") ?? -1;
    "#});
    assert_eq!(vars["f"], Arg::str("id-007"));
    assert_eq!(vars["e"], Arg::Int(3));
    assert_eq!(vars["m"], Arg::Uint(7));
    assert_eq!(vars["p"], Arg::Int(-1));
}

#[test]
fn builtin_errors() {
    assert_eq!(
        run_err("$Math.Sqrt();").to_string(),
        "Func [Math.Sqrt] requires 1 args, get 0"
    );
    assert_eq!(run_err(r#"$Throw("bad", 1);"#), RuntimeErrorKind::Thrown("bad 1".to_string()));
    assert_eq!(
        run_err("$Nope(1, 2);").to_string(),
        "Func [Nope] with [2] args cannot be resolved."
    );
    assert_eq!(
        run_err(r#"s = $Format("{:99999999999}", 1);"#),
        RuntimeErrorKind::Format("width in [{:99999999999}] exceeds 1024".to_string())
    );
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn if_else_chain() {
    let source = indoc! {r#"
        @If(m > n)
        r = "gt";
        @Else()
        r = "le";
    "#};
    let vars = run_ok(&format!("m = 3; n = 5;\n{source}"));
    assert_eq!(vars["r"], Arg::str("le"));
    let vars = run_ok(&format!("m = 7; n = 5;\n{source}"));
    assert_eq!(vars["r"], Arg::str("gt"));
}

#[test]
fn else_needs_if() {
    assert!(matches!(run_err("@Else() r = 1;"), RuntimeErrorKind::InvalidControlFlow(_)));
}

#[test]
fn second_else_is_rejected_either_way() {
    let source = indoc! {r#"
        @If(c)
        x = 1;
        @Else()
        x = 2;
        @Else()
        x = 3;
    "#};
    for cond in ["true", "false"] {
        let kind = run_err(&format!("c = {cond};\n{source}"));
        assert!(matches!(kind, RuntimeErrorKind::InvalidControlFlow(_)), "c = {cond}: {kind:?}");
    }
}

#[test]
fn while_with_continue_and_break() {
    let vars = run_ok(indoc! {r#"
        i = 0;
        sum = 0;
        @While(i < 100)
        #Block("body"){
            i += 1;
            @If(i > 9)
            $Break();
            odd = i % 2;
            @If(odd == 0)
            $Continue();
            sum += i;
        }
    "#});
    assert_eq!(vars["i"], Arg::Int(10));
    assert_eq!(vars["sum"], Arg::Int(1 + 3 + 5 + 7 + 9));
    assert!(!vars.contains_key("odd"));
}

#[test]
fn loop_control_outside_loop() {
    assert_eq!(
        run_err("$Break();").to_string(),
        "[Break] can only be used inside LoopScope"
    );
}

#[test]
fn iteration_limit() {
    let pool = MemoryPool::new();
    let options = ExecutionOptions {
        max_iterations: Some(100),
        ..Default::default()
    };
    let err = run_with(&pool, "i = 0; @While(true) i += 1;", options, None).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::IterationLimit { limit: 100 });
    assert!(err.kind.is_resource_exceeded());
}

#[test]
fn skip_meta() {
    let vars = run_ok("@Skip() a = 1; @Skip(false) b = 2; @Skip(true) c = 3;");
    assert!(!vars.contains_key("a"));
    assert_eq!(vars["b"], Arg::Int(2));
    assert!(!vars.contains_key("c"));
}

#[test]
fn top_level_return() {
    let pool = MemoryPool::new();
    let block = parse(&pool, "$Return(5); x = 1;", "test.nl").unwrap();
    let mut runtime = NailangRuntime::new(&pool, large_context());
    let (value, status) = runtime.execute(block, None).unwrap();
    assert_eq!(value, Arg::Int(5));
    assert_eq!(status, ProgramStatus::Return);
    assert_eq!(runtime.root().borrow().lookup_arg("x"), None);
    assert!(runtime.frames().is_empty());
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn recursive_function() {
    let vars = run_ok(indoc! {r#"
        @DefFunc(m, n)
        #Block("gcd"){
            @If(n == 0)
            $Return(m);
            $Return($gcd(n, m % n));
        }
        a = $gcd(17, 5);
        b = $gcd(15, 5);
    "#});
    assert_eq!(vars["a"], Arg::Int(1));
    assert_eq!(vars["b"], Arg::Int(5));
}

#[test]
fn return_from_nested_block() {
    let vars = run_ok(indoc! {r#"
        @DefFunc(x)
        #Block("sign"){
            @If(x < 0)
            #Block("neg"){
                $Return(-1);
            }
            $Return(1);
        }
        a = $sign(-5);
        b = $sign(3);
    "#});
    assert_eq!(vars["a"], Arg::Int(-1));
    assert_eq!(vars["b"], Arg::Int(1));
}

#[test]
fn function_scope_is_isolated() {
    let vars = run_ok(indoc! {r#"
        visible = 1;
        @DefFunc()
        #Block("peek"){
            $Return(?visible);
        }
        @DefFunc()
        #Block("peekHidden"){
            $Return(?hidden);
        }
        #Block("outer"){
            hidden = 2;
            `r1 = $peek();
            `r2 = $peekHidden();
        }
    "#});
    assert_eq!(vars["r1"], Arg::Bool(true));
    assert_eq!(vars["r2"], Arg::Bool(false));
    assert!(!vars.contains_key("hidden"));
}

#[test]
fn function_arg_count() {
    let kind = run_err(indoc! {r#"
        @DefFunc(a)
        #Block("one"){
            $Return(a);
        }
        x = $one(1, 2);
    "#});
    assert_eq!(kind.to_string(), "Func [one] requires 1 args, get 2");
}

#[test]
fn deep_recursion_overflows() {
    let pool = MemoryPool::new();
    let options = ExecutionOptions {
        max_depth: 8,
        ..Default::default()
    };
    let source = indoc! {r#"
        @DefFunc()
        #Block("forever"){
            $Return($forever());
        }
        x = $forever();
    "#};
    let err = run_with(&pool, source, options, None).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::StackOverflow { depth: 8, max_depth: 8 });
}

#[test]
fn recursion_past_default_depth_is_an_error() {
    let source = indoc! {r#"
        @DefFunc(n)
        #Block("down"){
            @If(n == 0)
            $Return(0);
            $Return($down(n - 1) + 1);
        }
        shallow = $down(400);
        deep = $down(5000);
    "#};
    let max_depth = ExecutionOptions::default().max_depth;
    assert_eq!(run_err(source), RuntimeErrorKind::StackOverflow { depth: max_depth, max_depth });

    let vars = run_ok(&source.replace("deep = $down(5000);", ""));
    assert_eq!(vars["shallow"], Arg::Int(400));
}

#[test]
fn deeply_nested_expression() {
    let depth = 3000;
    let source = format!("r = {}true{};", "!(".repeat(depth), ")".repeat(depth));
    let vars = run_ok(&source);
    assert_eq!(vars["r"], Arg::Bool(true));
}

#[test]
fn captures_are_taken_at_definition() {
    let vars = run_ok(indoc! {r#"
        base = 10;
        @Capture(base)
        @Capture(scale, 3)
        @DefFunc(x)
        #Block("affine"){
            $Return((x * scale) + base);
        }
        base = 100;
        r = $affine(2);
    "#});
    assert_eq!(vars["r"], Arg::Int(16));
    assert_eq!(vars["base"], Arg::Int(100));
    assert!(!vars.contains_key("scale"));
}

#[test]
fn capture_needs_plain_variable() {
    let kind = run_err(indoc! {r#"
        @Capture(:k, 1)
        @DefFunc()
        #Block("f"){
            $Return(k);
        }
    "#});
    assert!(matches!(kind, RuntimeErrorKind::ArgType { index: 0, .. }), "{kind:?}");
    let kind = run_err(indoc! {r#"
        @Capture(missing)
        @DefFunc()
        #Block("f"){
            $Return(1);
        }
    "#});
    assert_eq!(kind, RuntimeErrorKind::UnresolvedVar("missing".to_string()));
}

// ============================================================================
// Host hooks and errors
// ============================================================================

#[test]
fn host_functions_metas_and_raw_blocks() {
    let pool = MemoryPool::new();
    let host = Recorder::default();
    let source = indoc! {r#"
        $Print("hi", 2);
        @Tag("a", 1)
        $Print("tagged");
        @Hide()
        $Print("hidden");
        @Unknown()
        $Print("after unknown");
        #Raw.txt("notes"){
        free text { not parsed
        }
    "#};
    run_with(&pool, source, ExecutionOptions::default(), Some(host.clone())).unwrap();
    assert_eq!(*host.printed.borrow(), ["hi 2", "tagged", "after unknown"]);
    assert_eq!(*host.tags.borrow(), ["a", "1"]);
    assert_eq!(*host.raws.borrow(), ["notes"]);
}

#[test]
fn host_errors_surface() {
    let pool = MemoryPool::new();
    let err = run_with(&pool, "$Fail();", ExecutionOptions::default(), Some(Recorder::default())).unwrap_err();
    assert_eq!(err.kind, RuntimeErrorKind::Host("host refused".to_string()));
}

#[test]
fn unknown_meta_without_host_is_ignored() {
    let vars = run_ok("@Whatever(1) w = 1;");
    assert_eq!(vars["w"], Arg::Int(1));
}

#[test]
fn errors_carry_location_and_fragment() {
    let err = run(indoc! {r#"
        a = 1;
        b = 2;
        c = a + nope;
    "#})
    .unwrap_err();
    let location = err.location.clone().unwrap();
    assert_eq!(location.file, "test.nl");
    assert_eq!(location.block, "");
    assert_eq!(location.position.row, 3);
    assert_eq!(err.fragment.as_deref(), Some("c = a + nope;"));
    assert_eq!(err.to_diagnostic().code.as_deref(), Some("R003"));
}

#[test]
fn evaluate_raw_statement() {
    let pool = MemoryPool::new();
    let mut runtime = NailangRuntime::new(&pool, large_context());
    runtime.root().borrow_mut().set_arg("a", Arg::Int(5), true);
    assert_eq!(runtime.evaluate_raw_statement("$Math.Max(a, 3)").unwrap(), Arg::Int(5));
    assert_eq!(runtime.evaluate_raw_statement("").unwrap(), Arg::Empty);
    assert!(runtime.evaluate_raw_statement("a +").is_err());
}
