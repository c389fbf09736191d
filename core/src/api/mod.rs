//! Public API for embedding Nailang.
//!
//! [`Engine`] bundles a memory pool, a root context and a runtime. Errors
//! from the parser and the runtime are converted to [`Error`] at this
//! boundary and can be rendered through their [`Diagnostic`]s.
//!
//! # Example
//!
//! ```
//! use nailang_core::api::{Engine, EngineOptions};
//! use nailang_core::runtime::Arg;
//!
//! let options = EngineOptions::default();
//! let pool = options.new_pool();
//! let mut engine = Engine::new(&pool, options, |env| {
//!     env.register("greeting", "Hello");
//! });
//!
//! engine.run_source(r#"text = greeting + " World";"#, "hello.nl").unwrap();
//! assert_eq!(engine.get_root("text"), Some(Arg::str("Hello World")));
//! ```

pub mod engine;
pub mod environment;
pub mod error;
pub mod options;

pub use engine::Engine;
pub use environment::EnvironmentBuilder;
pub use error::{Diagnostic, Error, RelatedInfo, Severity};
pub use options::{EngineOptions, ExecutionOptions};
