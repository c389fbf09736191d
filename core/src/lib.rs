//! Nailang core: lexer, parser, syntax tree and runtime.
//!
//! Source text is parsed into a syntax tree allocated in a
//! [`MemoryPool`](arena::MemoryPool), then executed by a
//! [`NailangRuntime`](runtime::NailangRuntime) against a chain of evaluation
//! contexts. Host applications expose their own objects through
//! [`custom_var`] and extend the language through
//! [`NailangHost`](runtime::NailangHost).

pub mod api;
pub mod arena;
pub mod ast;
pub mod custom_var;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod serializer;
mod stack;
