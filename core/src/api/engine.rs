//! The Nailang engine.

use super::{EngineOptions, EnvironmentBuilder, Error, ExecutionOptions};
use crate::arena::MemoryPool;
use crate::ast::Block;
use crate::parser;
use crate::runtime::{Arg, EvaluateContext, NailangHost, NailangRuntime};

/// Parses and runs scripts against one root context.
///
/// The engine manages:
/// - The memory pool parsed scripts live in
/// - The root context, shared by every script it runs
/// - Runtime configuration (EngineOptions)
///
/// # Lifetimes
///
/// - `'a`: Lifetime of the pool. Parsed blocks and the values that borrow
///   from them live as long as the pool.
///
/// # Example
///
/// ```
/// use nailang_core::api::{Engine, EngineOptions};
/// use nailang_core::arena::MemoryPool;
/// use nailang_core::runtime::Arg;
///
/// let pool = MemoryPool::new();
/// let mut engine = Engine::new(&pool, EngineOptions::default(), |env| {
///     env.register("base", 40i64);
/// });
///
/// let block = engine.parse("answer = base + 2;", "answer.nl").unwrap();
/// engine.run(block).unwrap();
/// assert_eq!(engine.get_root("answer"), Some(Arg::Int(42)));
/// assert_eq!(engine.evaluate("answer * 2").unwrap(), Arg::Int(84));
/// ```
pub struct Engine<'a> {
    pool: &'a MemoryPool,
    runtime: NailangRuntime<'a>,
    options: EngineOptions,
}

impl<'a> Engine<'a> {
    /// Create a new engine. `init` registers the root variables.
    pub fn new(pool: &'a MemoryPool, options: EngineOptions, init: impl FnOnce(&mut EnvironmentBuilder<'a>)) -> Self {
        let mut env_builder = EnvironmentBuilder::new();
        init(&mut env_builder);
        let root = env_builder.build();
        let runtime = NailangRuntime::new(pool, root).with_options(options.default_execution_options.clone());
        Self { pool, runtime, options }
    }

    /// Installs the host that resolves unknown functions and meta-functions.
    pub fn with_host(mut self, host: impl NailangHost<'a> + 'a) -> Self {
        self.runtime.set_host(Some(Box::new(host)));
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn pool(&self) -> &'a MemoryPool {
        self.pool
    }

    pub fn runtime(&mut self) -> &mut NailangRuntime<'a> {
        &mut self.runtime
    }

    /// Parses a source unit. The text is copied into the pool.
    pub fn parse(&self, source: &str, file_name: &str) -> Result<&'a Block<'a>, Error> {
        let source = self.pool.alloc_str(source);
        Ok(parser::parse(self.pool, source, file_name)?)
    }

    /// Runs `block` in the root context. Yields the value passed to a
    /// top-level `Return`, or [`Arg::Empty`].
    pub fn run(&mut self, block: &'a Block<'a>) -> Result<Arg<'a>, Error> {
        let (value, _) = self.runtime.execute(block, None)?;
        Ok(value)
    }

    /// Like [`run`](Self::run), with limits for this call only.
    pub fn run_with_options(&mut self, block: &'a Block<'a>, options: ExecutionOptions) -> Result<Arg<'a>, Error> {
        let previous = self.runtime.replace_options(options);
        let result = self.run(block);
        self.runtime.replace_options(previous);
        result
    }

    /// Parses and runs a source unit.
    pub fn run_source(&mut self, source: &str, file_name: &str) -> Result<Arg<'a>, Error> {
        let block = self.parse(source, file_name)?;
        self.run(block)
    }

    /// Evaluates a single expression against the root context.
    pub fn evaluate(&mut self, expr: &str) -> Result<Arg<'a>, Error> {
        self.runtime.evaluate_raw_statement(expr)
    }

    pub fn get_root(&self, name: &str) -> Option<Arg<'a>> {
        self.runtime.root().borrow().lookup_arg(name)
    }

    /// Sets a root variable; [`Arg::Empty`] removes it. Returns whether the
    /// variable existed.
    pub fn set_root(&self, name: &str, value: impl Into<Arg<'a>>) -> bool {
        self.runtime.root().borrow_mut().set_arg(name, value.into(), true)
    }

    /// All root variables, sorted by name.
    pub fn root_vars(&self) -> Vec<(String, Arg<'a>)> {
        self.runtime.root().borrow().args()
    }
}
