//! Nailang - an embeddable scripting language for host applications
//!
//! # Overview
//!
//! Nailang scripts are sequences of statements grouped in named blocks.
//! Statements assign variables, call functions and carry meta-functions
//! (`@If`, `@While`, `@DefFunc`, ...) that steer how they run. `#Raw`
//! blocks keep their text unparsed for the host, e.g. shader sources.
//!
//! # Quick Start
//!
//! ```
//! use nailang::{Engine, EngineOptions};
//! use nailang::runtime::Arg;
//!
//! let options = EngineOptions::default();
//! let pool = options.new_pool();
//!
//! // Create an engine with root variables
//! let mut engine = Engine::new(&pool, options, |env| {
//!     env.register("limit", 10i64);
//! });
//!
//! let source = r#"
//!     i = 0;
//!     sum = 0;
//!     @While(i < limit)
//!     #Block("step"){
//!         i += 1;
//!         sum += i;
//!     }
//! "#;
//! engine.run_source(source, "sum.nl").unwrap();
//! assert_eq!(engine.get_root("sum"), Some(Arg::Int(55)));
//! ```
//!
//! # Host Integration
//!
//! Implement [`NailangHost`](runtime::NailangHost) to supply functions and
//! meta-functions the language does not define, and expose host objects
//! through [`custom_var::AutoVarHandler`].

// Re-export public API from nailang_core
pub use nailang_core::api::{
    Diagnostic, Engine, EngineOptions, EnvironmentBuilder, Error, ExecutionOptions, RelatedInfo, Severity,
};

// Re-export the building blocks for embedding
pub use nailang_core::{arena, ast, custom_var, parser, runtime, serializer};

mod error_renderer;
pub use error_renderer::{render_error, render_error_to, render_error_to_string, render_error_to_string_no_color};
