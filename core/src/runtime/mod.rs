//! Tree-walking evaluator for parsed blocks.
//!
//! ## Design
//!
//! - Variables live in a [`ContextChain`]: a root context plus one context
//!   per executing block or function call.
//! - Every executing block gets a [`StackFrame`] whose [`ProgramStatus`]
//!   carries `Break`/`Continue`/`Return` outward until a frame with the
//!   matching flag absorbs it. Frames are popped by [`FrameGuard`] on drop,
//!   errors included.
//! - Errors are never caught inside the runtime; they unwind to the caller
//!   with the failing statement attached.
//!
//! ## Example
//!
//! ```
//! use nailang_core::arena::MemoryPool;
//! use nailang_core::parser::parse;
//! use nailang_core::runtime::{Arg, EvaluateContext, NailangRuntime, large_context};
//!
//! let pool = MemoryPool::new();
//! let block = parse(&pool, "x := 40; x += 2;", "answer.nl").unwrap();
//! let mut runtime = NailangRuntime::new(&pool, large_context());
//! runtime.execute(block, None).unwrap();
//! assert_eq!(runtime.root().borrow().lookup_arg("x"), Some(Arg::Int(42)));
//! ```

mod arg;
mod builtins;
mod context;
mod context_chain;
mod error;
mod eval;
mod format;
mod frame;
mod math;
mod meta;
mod operators;

#[cfg(test)]
mod runtime_test;

pub use arg::Arg;
pub use context::{
    CompactEvaluateContext, ContextRef, EvaluateContext, LargeEvaluateContext, LocalFunc, compact_context,
    large_context,
};
pub use context_chain::{ContextChain, PopError};
pub use error::{ErrorLocation, RuntimeError, RuntimeErrorKind};
pub use frame::{FrameFlags, FrameGuard, ProgramStatus, StackFrame};
pub use meta::MetaResult;
pub use operators::{handle_binary, handle_unary};

use crate::api::{Error, ExecutionOptions};
use crate::arena::MemoryPool;
use crate::ast::{Block, BlockContent, FuncCall, RawArg, RawBlock};
use crate::parser;

/// Failure reported by a host hook, surfaced unchanged to the script caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

/// Extension points the embedding application implements.
///
/// Every hook defaults to "not handled".
pub trait NailangHost<'a> {
    /// Called for functions that are neither built in nor defined by the
    /// script. `Ok(None)` leaves the function unresolved.
    fn call_function(&mut self, _name: &str, _args: &[Arg<'a>]) -> Result<Option<Arg<'a>>, HostError> {
        Ok(None)
    }

    /// Called for meta-functions the runtime does not know. `Ok(None)`
    /// ignores the meta-function.
    fn handle_meta(
        &mut self,
        _name: &str,
        _args: &[Arg<'a>],
        _content: &'a BlockContent<'a>,
    ) -> Result<Option<MetaResult>, HostError> {
        Ok(None)
    }

    /// Called when a raw block is reached as a statement.
    fn on_raw_block(&mut self, _raw: &'a RawBlock<'a>, _metas: &'a [FuncCall<'a>]) -> Result<(), HostError> {
        Ok(())
    }
}

pub struct NailangRuntime<'a> {
    pool: &'a MemoryPool,
    chain: ContextChain<'a>,
    frames: Vec<StackFrame<'a>>,
    options: ExecutionOptions,
    host: Option<Box<dyn NailangHost<'a> + 'a>>,
    /// Value carried by a `Return` until a flow scope picks it up.
    pending_return: Arg<'a>,
}

impl<'a> NailangRuntime<'a> {
    pub fn new(pool: &'a MemoryPool, root: ContextRef<'a>) -> Self {
        Self {
            pool,
            chain: ContextChain::new(root),
            frames: Vec::new(),
            options: ExecutionOptions::default(),
            host: None,
            pending_return: Arg::Empty,
        }
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_host(mut self, host: impl NailangHost<'a> + 'a) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    /// Swaps the execution limits, returning the previous ones.
    pub fn replace_options(&mut self, options: ExecutionOptions) -> ExecutionOptions {
        std::mem::replace(&mut self.options, options)
    }

    pub fn set_host(&mut self, host: Option<Box<dyn NailangHost<'a> + 'a>>) {
        self.host = host;
    }

    pub fn pool(&self) -> &'a MemoryPool {
        self.pool
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn root(&self) -> &ContextRef<'a> {
        self.chain.root()
    }

    pub fn chain(&self) -> &ContextChain<'a> {
        &self.chain
    }

    /// Runs `block` to completion. With a `context` the block runs inside
    /// it, otherwise in the current innermost context. The status is
    /// `Return` when the block returned a value and `End` otherwise.
    pub fn execute(
        &mut self,
        block: &'a Block<'a>,
        context: Option<ContextRef<'a>>,
    ) -> Result<(Arg<'a>, ProgramStatus), RuntimeError> {
        tracing::debug!(file = block.raw.file_name, block = block.name(), statements = block.len(), "execute block");
        let mut frame = self.enter_frame(FrameFlags::FLOW_SCOPE, Some(block), context)?;
        frame.execute_content(block)?;
        let status = frame.status();
        drop(frame);
        match status {
            ProgramStatus::Return => Ok((std::mem::take(&mut self.pending_return), ProgramStatus::Return)),
            _ => Ok((Arg::Empty, ProgramStatus::End)),
        }
    }

    /// Evaluates an already parsed expression in the current context.
    pub fn evaluate(&mut self, arg: &RawArg<'a>) -> Result<Arg<'a>, RuntimeError> {
        self.eval_arg(arg)
            .map_err(|err| err.with_fragment(|| crate::serializer::stringify(arg)))
    }

    /// Parses and evaluates one expression, e.g. `"$Math.Max(a, 3)"`.
    /// Empty input evaluates to [`Arg::Empty`].
    pub fn evaluate_raw_statement(&mut self, source: &str) -> Result<Arg<'a>, Error> {
        let source = self.pool.alloc_str(source);
        match parser::parse_single_expr(self.pool, source)? {
            Some(arg) => Ok(self.evaluate(&arg)?),
            None => Ok(Arg::Empty),
        }
    }

    /// Pushes a frame, and `context` with it when given. A call scope also
    /// isolates the context from its callers.
    pub(crate) fn enter_frame(
        &mut self,
        flags: FrameFlags,
        block: Option<&'a Block<'a>>,
        context: Option<ContextRef<'a>>,
    ) -> Result<FrameGuard<'_, 'a>, RuntimeError> {
        let depth = self.frames.len();
        if depth >= self.options.max_depth {
            return Err(RuntimeErrorKind::StackOverflow {
                depth,
                max_depth: self.options.max_depth,
            }
            .into());
        }
        let owns_context = context.is_some();
        if let Some(context) = context {
            self.chain.push(context, flags.contains(FrameFlags::CALL_SCOPE));
        }
        self.frames.push(StackFrame {
            flags,
            status: ProgramStatus::Next,
            block,
            owns_context,
            last_if: None,
        });
        tracing::trace!(depth, ?flags, "push frame");
        Ok(FrameGuard { runtime: self })
    }

    pub fn frames(&self) -> &[StackFrame<'a>] {
        &self.frames
    }

    fn status(&self) -> ProgramStatus {
        self.frames.last().map_or(ProgramStatus::Next, |frame| frame.status)
    }

    fn set_status(&mut self, status: ProgramStatus) {
        if let Some(frame) = self.frames.last_mut() {
            frame.status = status;
        }
    }
}
