//! Configuration options for the Nailang engine.

use crate::arena::{DEFAULT_TRUNK_SIZE, MemoryPool};

/// Configuration options for script execution.
///
/// These options control resource limits during evaluation.
///
/// # Example
///
/// ```
/// use nailang_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions {
///     max_depth: 500,
///     max_iterations: Some(10_000),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Maximum number of nested frames (blocks, loops and calls).
    ///
    /// Default: 1000
    pub max_depth: usize,

    /// Maximum number of iterations of a single `@While` loop (if Some).
    ///
    /// Set to `None` for unlimited iterations (be careful with untrusted code!).
    ///
    /// Default: None
    pub max_iterations: Option<usize>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            max_iterations: None,
        }
    }
}

/// Configuration options for the Nailang engine.
///
/// # Example
///
/// ```
/// use nailang_core::api::{EngineOptions, ExecutionOptions};
///
/// let options = EngineOptions {
///     default_execution_options: ExecutionOptions {
///         max_depth: 500,
///         max_iterations: Some(10_000),
///     },
///     trunk_size: 64 * 1024,
/// };
/// let pool = options.new_pool();
/// assert!(pool.usage().total >= 64 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Default options for execution.
    ///
    /// These can be overridden when calling `Engine::run_with_options()`.
    pub default_execution_options: ExecutionOptions,

    /// Size of each chunk the memory pool reserves at once.
    pub trunk_size: usize,
}

impl EngineOptions {
    /// A memory pool sized by these options.
    pub fn new_pool(&self) -> MemoryPool {
        MemoryPool::with_trunk_size(self.trunk_size)
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_execution_options: ExecutionOptions::default(),
            trunk_size: DEFAULT_TRUNK_SIZE,
        }
    }
}
