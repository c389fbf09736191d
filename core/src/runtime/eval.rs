//! Expression and statement evaluation.

use std::borrow::Cow;

use smallvec::SmallVec;

use super::context::compact_context;
use super::error::{ErrorLocation, RuntimeError, RuntimeErrorKind};
use super::frame::{FrameFlags, ProgramStatus};
use super::operators::{divides_by_zero, handle_binary, handle_unary};
use super::{Arg, NailangRuntime};
use crate::ast::{
    Assignment, BinaryExpr, Block, BlockContent, EmbedOps, IndexExpr, LateBindVar, NilBehavior, RawArg, Statement,
    UnaryExpr,
};
use crate::custom_var::{AssignOutcome, CustomVar, Query, QueryError, bidir_index};
use crate::serializer;

/// Evaluated call arguments; calls rarely take more than four.
pub(super) type ArgList<'a> = SmallVec<[Arg<'a>; 4]>;

impl<'a> NailangRuntime<'a> {
    pub(super) fn eval_arg(&mut self, arg: &RawArg<'a>) -> Result<Arg<'a>, RuntimeError> {
        crate::stack::ensure_sufficient_stack(|| match *arg {
            RawArg::Func(call) => self.call_func(call),
            RawArg::Unary(unary) => self.eval_unary(unary),
            RawArg::Binary(binary) => self.eval_binary(binary),
            RawArg::Index(index) => self.eval_index(index),
            RawArg::Var(var) => self
                .lookup_var(&var)?
                .ok_or_else(|| RuntimeErrorKind::UnresolvedVar(var.full().to_string()).into()),
            RawArg::Str(text) => Ok(Arg::Str(Cow::Borrowed(text))),
            RawArg::Uint(v) => Ok(Arg::Uint(v)),
            RawArg::Int(v) => Ok(Arg::Int(v)),
            RawArg::FP(v) => Ok(Arg::FP(v)),
            RawArg::Bool(v) => Ok(Arg::Bool(v)),
        })
    }

    pub(super) fn eval_args(&mut self, args: &'a [RawArg<'a>]) -> Result<ArgList<'a>, RuntimeError> {
        args.iter().map(|arg| self.eval_arg(arg)).collect()
    }

    /// Like [`eval_arg`](Self::eval_arg), but a missing variable yields
    /// `None` instead of an error.
    fn eval_optional(&mut self, arg: &RawArg<'a>) -> Result<Option<Arg<'a>>, RuntimeError> {
        match arg {
            RawArg::Var(var) => self.lookup_var(var),
            other => self.eval_arg(other).map(|value| Some(value).filter(|v| !v.is_empty())),
        }
    }

    fn eval_unary(&mut self, unary: &'a UnaryExpr<'a>) -> Result<Arg<'a>, RuntimeError> {
        if unary.op == EmbedOps::CheckExist {
            return Ok(Arg::Bool(self.eval_optional(&unary.operand)?.is_some()));
        }
        let operand = self.eval_arg(&unary.operand)?;
        match handle_unary(unary.op, &operand) {
            Arg::Empty => Err(RuntimeError::new(RuntimeErrorKind::InvalidUnary {
                op: unary.op,
                operand: operand.type_name(),
            })
            .with_fragment(|| serializer::stringify(&RawArg::Unary(unary)))),
            value => Ok(value),
        }
    }

    fn logic_operand(&mut self, binary: &'a BinaryExpr<'a>, arg: &RawArg<'a>, other: &'static str) -> Result<bool, RuntimeError> {
        let value = self.eval_arg(arg)?;
        value.get_bool().ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::InvalidOperation {
                op: binary.op,
                left: value.type_name(),
                right: other,
            })
            .with_fragment(|| serializer::stringify(&RawArg::Binary(binary)))
        })
    }

    fn eval_binary(&mut self, binary: &'a BinaryExpr<'a>) -> Result<Arg<'a>, RuntimeError> {
        match binary.op {
            // Short-circuit: the right side only runs when it decides.
            EmbedOps::And | EmbedOps::Or => {
                let left = self.logic_operand(binary, &binary.left, "bool")?;
                if left == (binary.op == EmbedOps::Or) {
                    return Ok(Arg::Bool(left));
                }
                Ok(Arg::Bool(self.logic_operand(binary, &binary.right, "bool")?))
            }
            EmbedOps::ValueOr => match self.eval_optional(&binary.left)? {
                Some(value) => Ok(value),
                None => self.eval_arg(&binary.right),
            },
            op => {
                let left = self.eval_arg(&binary.left)?;
                let right = self.eval_arg(&binary.right)?;
                let fragment = || serializer::stringify(&RawArg::Binary(binary));
                if divides_by_zero(op, &left, &right) {
                    return Err(RuntimeError::new(RuntimeErrorKind::DivisionByZero).with_fragment(fragment));
                }
                match handle_binary(op, &left, &right) {
                    Arg::Empty => Err(RuntimeError::new(RuntimeErrorKind::InvalidOperation {
                        op,
                        left: left.type_name(),
                        right: right.type_name(),
                    })
                    .with_fragment(fragment)),
                    value => Ok(value),
                }
            }
        }
    }

    fn eval_index(&mut self, index: &'a IndexExpr<'a>) -> Result<Arg<'a>, RuntimeError> {
        let target = self.eval_arg(&index.target)?;
        let position = self.eval_arg(&index.index)?;
        let out_of_range = |err: QueryError| -> RuntimeError {
            match err {
                QueryError::IndexOutOfBound { index: wanted, len } => RuntimeErrorKind::IndexOutOfRange {
                    index: wanted,
                    len,
                    expr: serializer::stringify(&index.index),
                }
                .into(),
                other => RuntimeError::from(other).with_fragment(|| serializer::stringify(&RawArg::Index(index))),
            }
        };
        match target {
            Arg::Str(text) => {
                let len = text.chars().count();
                let at = bidir_index(len, &position).map_err(out_of_range)?;
                Ok(Arg::Str(char_at(text, at)))
            }
            Arg::Custom(var) => match var.query(Query::Index(&position)).map_err(out_of_range)? {
                Some(value) => Ok(value),
                None => Err(RuntimeErrorKind::NotIndexable("custom").into()),
            },
            other => Err(RuntimeError::new(RuntimeErrorKind::NotIndexable(other.type_name()))
                .with_fragment(|| serializer::stringify(&RawArg::Index(index)))),
        }
    }

    /// Resolves a variable. A dotted name is first looked up as a whole,
    /// then as members of its leading part.
    pub(super) fn lookup_var(&self, var: &LateBindVar<'a>) -> Result<Option<Arg<'a>>, RuntimeError> {
        let name = var.name();
        if let Some(value) = self.chain.lookup(var.scope(), name) {
            return Ok(Some(value));
        }
        let Some((head, members)) = name.split_once('.') else {
            return Ok(None);
        };
        let Some(mut value) = self.chain.lookup(var.scope(), head) else {
            return Ok(None);
        };
        for member in members.split('.') {
            match member_of(&value, member)? {
                Some(next) => value = next,
                None => return Ok(None),
            }
        }
        Ok(Some(value))
    }

    /// Stores into a variable. Members of host objects and host objects
    /// themselves are written through their handler.
    fn store_var(&mut self, var: &LateBindVar<'a>, value: Arg<'a>) -> Result<(), RuntimeError> {
        let name = var.name();
        match self.chain.lookup(var.scope(), name) {
            Some(Arg::Custom(existing)) if !matches!(value, Arg::Custom(_)) => {
                return assign_host(&existing, None, value);
            }
            Some(_) => {
                self.chain.set(var.scope(), name, value, true);
                return Ok(());
            }
            None => {}
        }
        if let Some((_, member)) = name.rsplit_once('.') {
            let full = var.full();
            if let Ok(parent) = LateBindVar::parse(&full[..full.len() - member.len() - 1])
                && let Some(Arg::Custom(host)) = self.lookup_var(&parent)?
            {
                return assign_host(&host, Some(member), value);
            }
        }
        self.chain.set(var.scope(), name, value, true);
        Ok(())
    }

    fn assign(&mut self, assign: &'a Assignment<'a>) -> Result<(), RuntimeError> {
        let target = &assign.target;
        let exists = self.lookup_var(target)?.is_some();
        let behavior = if exists {
            assign.check.when_not_null
        } else {
            assign.check.when_null
        };
        match behavior {
            NilBehavior::Pass => {}
            NilBehavior::Skip => return Ok(()),
            NilBehavior::Throw if exists => {
                return Err(RuntimeErrorKind::VarExists(target.full().to_string()).into());
            }
            NilBehavior::Throw => {
                return Err(RuntimeErrorKind::VarMissingForOp {
                    name: target.full().to_string(),
                    op: assign.self_op.unwrap_or(EmbedOps::Add),
                }
                .into());
            }
        }
        let value = self.eval_arg(&assign.statement)?;
        self.store_var(target, value)
    }

    /// Runs the statements of `block` in the current frame until one of them
    /// changes the frame status.
    pub(super) fn execute_content(&mut self, block: &'a Block<'a>) -> Result<(), RuntimeError> {
        for content in block.content {
            self.execute_item(content).map_err(|err| {
                err.with_fragment(|| statement_fragment(content)).located(|| ErrorLocation {
                    file: block.raw.file_name.to_string(),
                    block: block.name().to_string(),
                    position: content.position,
                    span: content.span.clone(),
                })
            })?;
            if self.status() != ProgramStatus::Next {
                break;
            }
        }
        Ok(())
    }

    fn execute_item(&mut self, content: &'a BlockContent<'a>) -> Result<(), RuntimeError> {
        let previous_if = self.frames.last_mut().and_then(|frame| frame.last_if.take());
        self.run_with_metas(content, content.metas, previous_if)
    }

    pub(super) fn execute_statement(&mut self, content: &'a BlockContent<'a>) -> Result<(), RuntimeError> {
        crate::stack::ensure_sufficient_stack(|| match content.statement {
            Statement::Assignment(assign) => self.assign(assign),
            Statement::Call(call) => self.call_func(call).map(drop),
            Statement::RawBlock(raw) => {
                tracing::debug!(block = raw.name, block_type = raw.block_type, "raw block reached");
                match self.host.as_mut() {
                    Some(host) => host
                        .on_raw_block(raw, content.metas)
                        .map_err(|err| RuntimeErrorKind::Host(err.0).into()),
                    None => Ok(()),
                }
            }
            Statement::Block(block) => {
                let mut frame = self.enter_frame(FrameFlags::NONE, Some(block), Some(compact_context()))?;
                frame.execute_content(block)?;
                let status = frame.status();
                drop(frame);
                if status != ProgramStatus::Next {
                    self.set_status(status);
                }
                Ok(())
            }
        })
    }
}

/// The `at`-th character of `text`, borrowed when `text` is.
fn char_at(text: Cow<'_, str>, at: usize) -> Cow<'_, str> {
    match text {
        Cow::Borrowed(s) => match s.char_indices().nth(at) {
            Some((start, ch)) => Cow::Borrowed(&s[start..start + ch.len_utf8()]),
            None => Cow::Borrowed(""),
        },
        Cow::Owned(s) => Cow::Owned(s.chars().nth(at).map(String::from).unwrap_or_default()),
    }
}

fn member_of<'a>(value: &Arg<'a>, member: &str) -> Result<Option<Arg<'a>>, RuntimeError> {
    match value {
        Arg::Str(text) if member == "Length" => Ok(Some(Arg::Uint(text.chars().count() as u64))),
        Arg::Custom(var) => Ok(var.query(Query::Member(member))?),
        _ => Ok(None),
    }
}

fn assign_host(var: &CustomVar, member: Option<&str>, value: Arg<'_>) -> Result<(), RuntimeError> {
    let value = value.into_owned();
    let outcome = match member {
        Some(member) => var.assign_member(member, value)?,
        None => var.assign(value)?,
    };
    if outcome == AssignOutcome::NotSupported {
        tracing::warn!(target_var = ?var, member, "host object ignored the assignment");
    }
    Ok(())
}

fn statement_fragment(content: &BlockContent<'_>) -> String {
    match content.statement {
        Statement::Block(block) => format!("#Block(\"{}\")", block.name()),
        Statement::RawBlock(raw) => format!("#Raw(\"{}\")", raw.name),
        ref other => serializer::stringify_statement(other),
    }
}
