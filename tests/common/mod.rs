//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;

use nailang::runtime::Arg;
use nailang::{Engine, EngineOptions, Error};

pub type Vars = BTreeMap<String, Arg<'static>>;

/// Runs `source` in a fresh engine whose root holds `roots`, returning the
/// root variables afterwards.
pub fn run_script(source: &str, roots: &[(&str, Arg<'static>)]) -> Result<Vars, Error> {
    let pool = EngineOptions::default().new_pool();
    let mut engine = Engine::new(&pool, EngineOptions::default(), |env| {
        for (name, value) in roots {
            env.register(name, value.clone());
        }
    });
    engine.run_source(source, "test.nl")?;
    Ok(engine
        .root_vars()
        .into_iter()
        .map(|(name, value)| (name, value.into_owned()))
        .collect())
}

/// Declares a test that runs a script and checks root variables, or the
/// error it fails with.
///
/// ```ignore
/// test_case! {
///     name: addition,
///     input: { "a = 1 + 2;" },
///     expect: { "a" => Arg::Int(3) },
/// }
/// ```
macro_rules! test_case {
    (
        name: $name:ident,
        input: { $input:expr },
        $(roots: { $($root:literal => $root_value:expr),* $(,)? },)?
        expect: { $($var:literal => $value:expr),* $(,)? } $(,)?
    ) => {
        #[test]
        fn $name() {
            let roots: Vec<(&str, nailang::runtime::Arg<'static>)> = vec![$($(($root, $root_value)),*)?];
            let vars = crate::common::run_script($input, &roots)
                .unwrap_or_else(|err| panic!("script failed: {err}\n{:#?}", err.diagnostics()));
            $(
                pretty_assertions::assert_eq!(vars.get($var), Some(&$value), "variable [{}]", $var);
            )*
        }
    };
    (
        name: $name:ident,
        input: { $input:expr },
        $(roots: { $($root:literal => $root_value:expr),* $(,)? },)?
        error: { $pattern:pat } $(,)?
    ) => {
        #[test]
        fn $name() {
            let roots: Vec<(&str, nailang::runtime::Arg<'static>)> = vec![$($(($root, $root_value)),*)?];
            match crate::common::run_script($input, &roots) {
                Err(err) => assert!(matches!(err, $pattern), "unexpected error: {err:?}"),
                Ok(vars) => panic!("expected an error, got {vars:#?}"),
            }
        }
    };
}
