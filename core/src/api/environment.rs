//! Environment builder for registering root variables.

use crate::runtime::{Arg, ContextRef, EvaluateContext, large_context};

/// Builder for the root context every script of an engine starts from.
///
/// # Example
///
/// ```
/// use nailang_core::api::{Engine, EngineOptions};
/// use nailang_core::arena::MemoryPool;
/// use nailang_core::runtime::Arg;
///
/// let pool = MemoryPool::new();
/// let engine = Engine::new(&pool, EngineOptions::default(), |env| {
///     env.register("pi", std::f64::consts::PI);
///     env.register("name", "nailang");
/// });
/// assert_eq!(engine.get_root("name"), Some(Arg::str("nailang")));
/// ```
#[derive(Default)]
pub struct EnvironmentBuilder<'a> {
    entries: Vec<(String, Arg<'a>)>,
}

impl<'a> EnvironmentBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root variable. A later registration of the same name wins.
    pub fn register(&mut self, name: &str, value: impl Into<Arg<'a>>) {
        self.entries.push((name.to_string(), value.into()));
    }

    /// Builds the root context. Called internally by `Engine::new()`.
    pub(crate) fn build(mut self) -> ContextRef<'a> {
        // Stable sort keeps registration order among equal names.
        self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        let root = large_context();
        {
            let mut context = root.borrow_mut();
            for (name, value) in self.entries {
                context.set_arg(&name, value, true);
            }
        }
        root
    }
}
