//! Meta-functions: `@If`, `@Else`, `@While`, `@Skip`, `@DefFunc`, `@Capture`.
//!
//! Metas run in order before their statement. Each one may let the next
//! meta run, skip the statement, or take over the statement entirely (a
//! loop runs the remaining metas and the statement itself).

use super::error::{RuntimeError, RuntimeErrorKind};
use super::frame::{FrameFlags, ProgramStatus};
use super::{Arg, LocalFunc, NailangRuntime};
use crate::ast::{BlockContent, FuncCall, RawArg, Statement};
use crate::serializer;

/// Outcome of one meta-function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaResult {
    /// Not a meta this handler knows; the next handler or meta runs.
    Unhandled,
    /// Continue with the next meta, then the statement.
    Next,
    /// Skip the statement.
    Skip,
    /// The meta already took care of the statement.
    Return,
}

impl<'a> NailangRuntime<'a> {
    /// Runs `metas` in order and then `content`'s statement unless a meta
    /// skipped or consumed it.
    pub(super) fn run_with_metas(
        &mut self,
        content: &'a BlockContent<'a>,
        metas: &'a [FuncCall<'a>],
        previous_if: Option<bool>,
    ) -> Result<(), RuntimeError> {
        for (i, meta) in metas.iter().enumerate() {
            let result = self
                .handle_meta(meta, content, &metas[i + 1..], previous_if)
                .map_err(|err| err.with_fragment(|| serializer::stringify_meta(meta)))?;
            match result {
                MetaResult::Unhandled | MetaResult::Next => {}
                MetaResult::Skip | MetaResult::Return => return Ok(()),
            }
        }
        self.execute_statement(content)
    }

    fn handle_meta(
        &mut self,
        meta: &'a FuncCall<'a>,
        content: &'a BlockContent<'a>,
        rest: &'a [FuncCall<'a>],
        previous_if: Option<bool>,
    ) -> Result<MetaResult, RuntimeError> {
        match meta.name {
            "If" => {
                let cond = self.condition(meta)?;
                self.record_if(cond);
                Ok(if cond { MetaResult::Next } else { MetaResult::Skip })
            }
            "Else" => {
                if !meta.args.is_empty() {
                    return Err(meta_args(meta, "0"));
                }
                match previous_if {
                    Some(false) => Ok(MetaResult::Next),
                    Some(true) => Ok(MetaResult::Skip),
                    None => Err(RuntimeErrorKind::InvalidControlFlow(
                        "[Else] must follow a statement with [If]".into(),
                    )
                    .into()),
                }
            }
            "Skip" => match meta.args {
                [] => Ok(MetaResult::Skip),
                [_] => Ok(if self.condition(meta)? { MetaResult::Skip } else { MetaResult::Next }),
                _ => Err(meta_args(meta, "0 or 1")),
            },
            "While" => self.run_loop(meta, content, rest),
            "DefFunc" => self.define_func(meta, content),
            // Consumed by the `@DefFunc` on the same statement.
            "Capture" if content.metas.iter().any(|m| m.name == "DefFunc") => Ok(MetaResult::Next),
            name => {
                if self.host.is_none() {
                    tracing::warn!(meta = name, "unknown meta-function ignored");
                    return Ok(MetaResult::Unhandled);
                }
                let args = self.eval_args(meta.args)?;
                let handled = match self.host.as_mut() {
                    Some(host) => host
                        .handle_meta(name, &args, content)
                        .map_err(|err| RuntimeError::from(RuntimeErrorKind::Host(err.0)))?,
                    None => None,
                };
                Ok(handled.unwrap_or_else(|| {
                    tracing::warn!(meta = name, "unknown meta-function ignored");
                    MetaResult::Unhandled
                }))
            }
        }
    }

    fn record_if(&mut self, value: bool) {
        if let Some(frame) = self.frames.last_mut() {
            frame.last_if = Some(value);
        }
    }

    /// Evaluates the single argument of `meta` as a boolean.
    fn condition(&mut self, meta: &'a FuncCall<'a>) -> Result<bool, RuntimeError> {
        let [arg] = meta.args else {
            return Err(meta_args(meta, "1"));
        };
        let value = self.eval_arg(arg)?;
        value.get_bool().ok_or_else(|| {
            RuntimeErrorKind::ArgType {
                func: meta.name.to_string(),
                index: 0,
                expected: "bool",
                actual: value.type_name(),
            }
            .into()
        })
    }

    /// `@While(cond)`: reruns the remaining metas and the statement in a
    /// loop frame while `cond` holds.
    fn run_loop(
        &mut self,
        meta: &'a FuncCall<'a>,
        content: &'a BlockContent<'a>,
        rest: &'a [FuncCall<'a>],
    ) -> Result<MetaResult, RuntimeError> {
        let limit = self.options.max_iterations;
        let mut frame = self.enter_frame(FrameFlags::VIRTUAL | FrameFlags::IN_LOOP, None, None)?;
        let mut iterations = 0usize;
        let status = loop {
            if !frame.condition(meta)? {
                break ProgramStatus::Next;
            }
            if let Some(limit) = limit
                && iterations >= limit
            {
                return Err(RuntimeErrorKind::IterationLimit { limit }.into());
            }
            iterations += 1;
            frame.set_status(ProgramStatus::Next);
            frame.run_with_metas(content, rest, None)?;
            match frame.status() {
                ProgramStatus::Break => break ProgramStatus::Next,
                ProgramStatus::Next | ProgramStatus::Continue => {}
                other => break other,
            }
        };
        drop(frame);
        tracing::trace!(iterations, ?status, "loop finished");
        if status != ProgramStatus::Next {
            self.set_status(status);
        }
        Ok(MetaResult::Return)
    }

    /// `@DefFunc(params...)` turns the annotated block into a function named
    /// after the block.
    fn define_func(&mut self, meta: &'a FuncCall<'a>, content: &'a BlockContent<'a>) -> Result<MetaResult, RuntimeError> {
        let Statement::Block(body) = content.statement else {
            return Err(RuntimeErrorKind::InvalidControlFlow("[DefFunc] can only be applied to a #Block".into()).into());
        };
        if body.name().is_empty() {
            return Err(RuntimeErrorKind::InvalidControlFlow("[DefFunc] requires a named block".into()).into());
        }
        let mut params = Vec::with_capacity(meta.args.len());
        for (index, arg) in meta.args.iter().enumerate() {
            match arg {
                RawArg::Var(var) if !var.name().contains('.') && var.full() == var.name() => params.push(var.name()),
                other => {
                    return Err(RuntimeErrorKind::ArgType {
                        func: meta.name.to_string(),
                        index,
                        expected: "plain variable name",
                        actual: other.type_name(),
                    }
                    .into());
                }
            }
        }
        let captures = self.captures(content)?;
        let params = self.pool.create_array_from(params);
        tracing::debug!(func = body.name(), params = params.len(), captures = captures.len(), "define function");
        self.chain.set_func(LocalFunc {
            name: body.name(),
            body,
            params,
            captures: captures.into(),
        });
        Ok(MetaResult::Return)
    }

    /// Evaluates every `@Capture(name)` and `@Capture(name, expr)` on the
    /// statement. Values are taken now, not when the function is called.
    fn captures(&mut self, content: &'a BlockContent<'a>) -> Result<Vec<(&'a str, Arg<'a>)>, RuntimeError> {
        let mut captures = Vec::new();
        for meta in content.metas.iter().filter(|m| m.name == "Capture") {
            let (var, value) = match meta.args {
                [RawArg::Var(var)] => (var, self.eval_arg(&meta.args[0])?),
                [RawArg::Var(var), expr] if var.full() == var.name() => (var, self.eval_arg(expr)?),
                [other, ..] if meta.args.len() <= 2 => {
                    return Err(RuntimeErrorKind::ArgType {
                        func: meta.name.to_string(),
                        index: 0,
                        expected: if meta.args.len() == 1 { "variable" } else { "plain variable name" },
                        actual: other.type_name(),
                    }
                    .into());
                }
                _ => return Err(meta_args(meta, "1 or 2")),
            };
            if value.is_empty() {
                return Err(RuntimeErrorKind::InvalidControlFlow(format!("[Capture] of [{}] has no value", var.name())).into());
            }
            captures.push((var.name(), value));
        }
        Ok(captures)
    }
}

fn meta_args(meta: &FuncCall<'_>, expected: &str) -> RuntimeError {
    RuntimeErrorKind::ArgCount {
        func: format!("@{}", meta.name),
        expected: expected.to_string(),
        actual: meta.args.len(),
    }
    .into()
}
