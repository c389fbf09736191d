//! Function call dispatch.
//!
//! A call name is resolved in this order:
//!
//! 1. `EmbedOp.<Op>` runs an operator on already evaluated arguments.
//! 2. Built-ins: `Return`, `Break`, `Continue`, `Throw`, `Exists`, `Format`.
//! 3. `Math.<Name>` from the math table.
//! 4. Functions the script defined with `@DefFunc`.
//! 5. The host's [`call_function`](super::NailangHost::call_function).
//!
//! Anything left is an unresolved function.

use super::context::compact_context;
use super::error::{RuntimeError, RuntimeErrorKind};
use super::eval::ArgList;
use super::frame::{FrameFlags, ProgramStatus};
use super::math::{self, ArgIssue};
use super::operators::{divides_by_zero, handle_binary, handle_unary};
use super::{Arg, LocalFunc, NailangRuntime, format};
use crate::ast::{EmbedOps, FuncCall, LateBindVar, RawArg};
use crate::serializer;

fn arg_count(func: &str, expected: &str, actual: usize) -> RuntimeError {
    RuntimeErrorKind::ArgCount {
        func: func.to_string(),
        expected: expected.to_string(),
        actual,
    }
    .into()
}

impl<'a> NailangRuntime<'a> {
    pub(super) fn call_func(&mut self, call: &'a FuncCall<'a>) -> Result<Arg<'a>, RuntimeError> {
        tracing::trace!(func = call.name, args = call.args.len(), "call");
        let result = self.dispatch(call);
        result.map_err(|err| err.with_fragment(|| serializer::stringify_call(call)))
    }

    fn dispatch(&mut self, call: &'a FuncCall<'a>) -> Result<Arg<'a>, RuntimeError> {
        if let Some(op) = call.name.strip_prefix("EmbedOp.") {
            return self.call_embed_op(call, op);
        }
        match call.name {
            "Return" => return self.flow_return(call),
            "Break" | "Continue" => return self.flow_loop(call),
            "Throw" => {
                let args = self.eval_args(call.args)?;
                let message = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
                return Err(RuntimeErrorKind::Thrown(message).into());
            }
            "Exists" => return self.exists(call),
            "Format" => return self.format(call),
            _ => {}
        }
        if let Some(name) = call.name.strip_prefix("Math.")
            && let Some(f) = math::lookup(name)
        {
            let args = self.eval_args(call.args)?;
            return f(&args).map_err(|issue| match issue {
                ArgIssue::Count(expected) => arg_count(call.name, expected, args.len()),
                ArgIssue::Type { index, expected, actual } => RuntimeErrorKind::ArgType {
                    func: call.name.to_string(),
                    index,
                    expected,
                    actual,
                }
                .into(),
            });
        }
        if let Some(func) = self.chain.lookup_func(call.name) {
            let args = self.eval_args(call.args)?;
            return self.call_local(func, args);
        }
        let args = self.eval_args(call.args)?;
        if let Some(host) = self.host.as_mut() {
            match host.call_function(call.name, &args) {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(err) => return Err(RuntimeErrorKind::Host(err.0).into()),
            }
        }
        Err(RuntimeErrorKind::UnresolvedFunc {
            name: call.name.to_string(),
            args: args.len(),
        }
        .into())
    }

    fn call_embed_op(&mut self, call: &'a FuncCall<'a>, op_name: &str) -> Result<Arg<'a>, RuntimeError> {
        let Some(op) = EmbedOps::from_name(op_name) else {
            return Err(RuntimeErrorKind::UnresolvedFunc {
                name: call.name.to_string(),
                args: call.args.len(),
            }
            .into());
        };
        if op.is_unary() {
            let [operand] = call.args else {
                return Err(arg_count(call.name, "1", call.args.len()));
            };
            if op == EmbedOps::CheckExist
                && let RawArg::Var(var) = operand
            {
                return Ok(Arg::Bool(self.lookup_var(var)?.is_some()));
            }
            let value = self.eval_arg(operand)?;
            return match handle_unary(op, &value) {
                Arg::Empty => Err(RuntimeErrorKind::InvalidUnary {
                    op,
                    operand: value.type_name(),
                }
                .into()),
                result => Ok(result),
            };
        }
        let [left, right] = call.args else {
            return Err(arg_count(call.name, "2", call.args.len()));
        };
        let left = self.eval_arg(left)?;
        let right = self.eval_arg(right)?;
        if divides_by_zero(op, &left, &right) {
            return Err(RuntimeErrorKind::DivisionByZero.into());
        }
        match handle_binary(op, &left, &right) {
            Arg::Empty if op != EmbedOps::ValueOr => Err(RuntimeErrorKind::InvalidOperation {
                op,
                left: left.type_name(),
                right: right.type_name(),
            }
            .into()),
            result => Ok(result),
        }
    }

    /// Walks outward from the current frame and reports whether a frame with
    /// `wanted` is reached before one with `boundary`.
    fn inside(&self, wanted: FrameFlags, boundary: FrameFlags) -> bool {
        for frame in self.frames.iter().rev() {
            if frame.flags.contains(wanted) {
                return true;
            }
            if frame.flags.contains(boundary) {
                return false;
            }
        }
        false
    }

    fn flow_return(&mut self, call: &'a FuncCall<'a>) -> Result<Arg<'a>, RuntimeError> {
        if !self.frames.iter().any(|frame| frame.flags.contains(FrameFlags::FLOW_SCOPE)) {
            return Err(RuntimeErrorKind::InvalidControlFlow("[Return] can only be used inside FlowScope".into()).into());
        }
        let value = match call.args {
            [] => Arg::Empty,
            [value] => self.eval_arg(value)?,
            more => return Err(arg_count(call.name, "0 or 1", more.len())),
        };
        self.pending_return = value;
        self.set_status(ProgramStatus::Return);
        Ok(Arg::Empty)
    }

    fn flow_loop(&mut self, call: &'a FuncCall<'a>) -> Result<Arg<'a>, RuntimeError> {
        if !call.args.is_empty() {
            return Err(arg_count(call.name, "0", call.args.len()));
        }
        if !self.inside(FrameFlags::IN_LOOP, FrameFlags::FLOW_SCOPE) {
            return Err(RuntimeErrorKind::InvalidControlFlow(format!(
                "[{}] can only be used inside LoopScope",
                call.name
            ))
            .into());
        }
        let status = if call.name == "Break" {
            ProgramStatus::Break
        } else {
            ProgramStatus::Continue
        };
        self.set_status(status);
        Ok(Arg::Empty)
    }

    /// `Exists(var)` or `Exists("name")`.
    fn exists(&mut self, call: &'a FuncCall<'a>) -> Result<Arg<'a>, RuntimeError> {
        let [target] = call.args else {
            return Err(arg_count(call.name, "1", call.args.len()));
        };
        let found = match target {
            RawArg::Var(var) => self.lookup_var(var)?.is_some(),
            RawArg::Str(name) => match LateBindVar::parse(name) {
                Ok(var) => self.lookup_var(&var)?.is_some(),
                Err(_) => false,
            },
            other => {
                return Err(RuntimeErrorKind::ArgType {
                    func: call.name.to_string(),
                    index: 0,
                    expected: "variable or string",
                    actual: other.type_name(),
                }
                .into());
            }
        };
        Ok(Arg::Bool(found))
    }

    fn format(&mut self, call: &'a FuncCall<'a>) -> Result<Arg<'a>, RuntimeError> {
        let args = self.eval_args(call.args)?;
        let Some((fmt, rest)) = args.split_first() else {
            return Err(arg_count(call.name, "at least 1", 0));
        };
        let Arg::Str(fmt) = fmt else {
            return Err(RuntimeErrorKind::ArgType {
                func: call.name.to_string(),
                index: 0,
                expected: "string",
                actual: fmt.type_name(),
            }
            .into());
        };
        format::format(fmt, rest)
            .map(Arg::from)
            .map_err(|msg| RuntimeErrorKind::Format(msg).into())
    }

    /// Runs a script function in a fresh, isolated context holding its
    /// captured values and then its parameters.
    fn call_local(&mut self, func: LocalFunc<'a>, args: ArgList<'a>) -> Result<Arg<'a>, RuntimeError> {
        if args.len() != func.params.len() {
            return Err(arg_count(func.name, &func.params.len().to_string(), args.len()));
        }
        let context = compact_context();
        {
            let mut scope = context.borrow_mut();
            for (name, value) in func.captures.iter() {
                scope.set_arg(name, value.clone(), true);
            }
            for (param, value) in func.params.iter().zip(args) {
                scope.set_arg(param, value, true);
            }
        }
        tracing::debug!(func = func.name, depth = self.frames.len(), "enter function");
        let mut frame = self.enter_frame(FrameFlags::CALL_SCOPE | FrameFlags::FLOW_SCOPE, Some(func.body), Some(context))?;
        frame.execute_content(func.body)?;
        let status = frame.status();
        drop(frame);
        Ok(match status {
            ProgramStatus::Return => std::mem::take(&mut self.pending_return),
            _ => Arg::Empty,
        })
    }
}
