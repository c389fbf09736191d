//! Embedded operator semantics.
//!
//! Operators never fail: a combination they cannot handle produces
//! [`Arg::Empty`], which the evaluator reports as an invalid operation.
//! Integer division by zero is detected up front with [`divides_by_zero`].

use std::borrow::Cow;
use std::cmp::Ordering;

use super::Arg;
use crate::ast::EmbedOps;

#[derive(Debug, Clone, Copy)]
enum Num {
    U(u64),
    I(i64),
    F(f64),
}

impl Num {
    fn of(arg: &Arg<'_>) -> Option<Num> {
        match arg {
            Arg::Uint(v) => Some(Num::U(*v)),
            Arg::Int(v) => Some(Num::I(*v)),
            Arg::FP(v) => Some(Num::F(*v)),
            _ => None,
        }
    }

    /// Arithmetic also takes a bool on the right side, as 0 or 1.
    /// Comparisons do not.
    fn of_right(arg: &Arg<'_>) -> Option<Num> {
        match arg {
            Arg::Bool(b) => Some(Num::U(*b as u64)),
            other => Num::of(other),
        }
    }

    fn as_fp(self) -> f64 {
        match self {
            Num::U(v) => v as f64,
            Num::I(v) => v as f64,
            Num::F(v) => v,
        }
    }

    fn as_u64(self) -> u64 {
        match self {
            Num::U(v) => v,
            Num::I(v) => v as u64,
            Num::F(v) => v as u64,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            Num::U(v) => v as i64,
            Num::I(v) => v,
            Num::F(v) => v as i64,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::U(v) => v == 0,
            Num::I(v) => v == 0,
            Num::F(v) => v == 0.0,
        }
    }
}

fn compare_nums(left: Num, right: Num) -> Option<Ordering> {
    match (left, right) {
        (Num::F(_), _) | (_, Num::F(_)) => left.as_fp().partial_cmp(&right.as_fp()),
        (Num::U(l), Num::U(r)) => Some(l.cmp(&r)),
        (Num::I(l), Num::I(r)) => Some(l.cmp(&r)),
        // A negative signed value is below every unsigned one.
        (Num::U(l), Num::I(r)) => Some(if r < 0 { Ordering::Greater } else { l.cmp(&(r as u64)) }),
        (Num::I(l), Num::U(r)) => Some(if l < 0 { Ordering::Less } else { (l as u64).cmp(&r) }),
    }
}

fn ordering_result(op: EmbedOps, ordering: Option<Ordering>) -> bool {
    let Some(ordering) = ordering else {
        // Unordered (NaN) only satisfies `!=`.
        return op == EmbedOps::NotEqual;
    };
    match op {
        EmbedOps::Equal => ordering.is_eq(),
        EmbedOps::NotEqual => ordering.is_ne(),
        EmbedOps::Less => ordering.is_lt(),
        EmbedOps::LessEqual => ordering.is_le(),
        EmbedOps::Greater => ordering.is_gt(),
        EmbedOps::GreaterEqual => ordering.is_ge(),
        _ => false,
    }
}

fn compare<'a>(op: EmbedOps, left: &Arg<'a>, right: &Arg<'a>) -> Arg<'a> {
    let ordering = match (left, right) {
        (Arg::Str(l), Arg::Str(r)) => Some(l.as_ref().cmp(r.as_ref())),
        (Arg::Bool(l), Arg::Bool(r)) => match op {
            EmbedOps::Equal => return Arg::Bool(l == r),
            EmbedOps::NotEqual => return Arg::Bool(l != r),
            _ => return Arg::Empty,
        },
        _ => match (Num::of(left), Num::of(right)) {
            (Some(l), Some(r)) => compare_nums(l, r),
            _ => return Arg::Empty,
        },
    };
    Arg::Bool(ordering_result(op, ordering))
}

fn arithmetic<'a>(op: EmbedOps, left: &Arg<'a>, right: &Arg<'a>) -> Arg<'a> {
    if let (Arg::Str(l), Arg::Str(r)) = (left, right) {
        return match op {
            EmbedOps::Add => Arg::Str(Cow::Owned(format!("{l}{r}"))),
            _ => Arg::Empty,
        };
    }
    let (Some(l), Some(r)) = (Num::of(left), Num::of_right(right)) else {
        return Arg::Empty;
    };
    match (l, r) {
        (Num::F(_), _) | (_, Num::F(_)) => {
            let (l, r) = (l.as_fp(), r.as_fp());
            Arg::FP(match op {
                EmbedOps::Add => l + r,
                EmbedOps::Sub => l - r,
                EmbedOps::Mul => l * r,
                EmbedOps::Div => l / r,
                EmbedOps::Rem => l % r,
                _ => return Arg::Empty,
            })
        }
        (Num::U(_), _) | (_, Num::U(_)) => {
            let (l, r) = (l.as_u64(), r.as_u64());
            let value = match op {
                EmbedOps::Add => Some(l.wrapping_add(r)),
                EmbedOps::Sub => Some(l.wrapping_sub(r)),
                EmbedOps::Mul => Some(l.wrapping_mul(r)),
                EmbedOps::Div => l.checked_div(r),
                EmbedOps::Rem => l.checked_rem(r),
                _ => None,
            };
            value.map_or(Arg::Empty, Arg::Uint)
        }
        _ => {
            let (l, r) = (l.as_i64(), r.as_i64());
            let value = match op {
                EmbedOps::Add => Some(l.wrapping_add(r)),
                EmbedOps::Sub => Some(l.wrapping_sub(r)),
                EmbedOps::Mul => Some(l.wrapping_mul(r)),
                EmbedOps::Div if r != 0 => Some(l.wrapping_div(r)),
                EmbedOps::Rem if r != 0 => Some(l.wrapping_rem(r)),
                _ => None,
            };
            value.map_or(Arg::Empty, Arg::Int)
        }
    }
}

fn logic<'a>(op: EmbedOps, left: &Arg<'a>, right: &Arg<'a>) -> Arg<'a> {
    match (left.get_bool(), right.get_bool()) {
        (Some(l), Some(r)) if op == EmbedOps::And => Arg::Bool(l && r),
        (Some(l), Some(r)) => Arg::Bool(l || r),
        _ => Arg::Empty,
    }
}

/// Applies a binary operator to two evaluated operands.
///
/// `ValueOr` only picks between present values here; skipping the
/// evaluation of its right side is up to the caller.
pub fn handle_binary<'a>(op: EmbedOps, left: &Arg<'a>, right: &Arg<'a>) -> Arg<'a> {
    match op {
        EmbedOps::Equal
        | EmbedOps::NotEqual
        | EmbedOps::Less
        | EmbedOps::LessEqual
        | EmbedOps::Greater
        | EmbedOps::GreaterEqual => compare(op, left, right),
        EmbedOps::And | EmbedOps::Or => logic(op, left, right),
        EmbedOps::Add | EmbedOps::Sub | EmbedOps::Mul | EmbedOps::Div | EmbedOps::Rem => arithmetic(op, left, right),
        EmbedOps::ValueOr if left.is_empty() => right.clone(),
        EmbedOps::ValueOr => left.clone(),
        EmbedOps::Not | EmbedOps::CheckExist => Arg::Empty,
    }
}

pub fn handle_unary<'a>(op: EmbedOps, operand: &Arg<'a>) -> Arg<'a> {
    match op {
        EmbedOps::Not => operand.get_bool().map_or(Arg::Empty, |b| Arg::Bool(!b)),
        EmbedOps::CheckExist => Arg::Bool(!operand.is_empty()),
        _ => Arg::Empty,
    }
}

/// Whether `left op right` is an integer division or remainder by zero.
pub fn divides_by_zero(op: EmbedOps, left: &Arg<'_>, right: &Arg<'_>) -> bool {
    if !matches!(op, EmbedOps::Div | EmbedOps::Rem) {
        return false;
    }
    match (Num::of(left), Num::of_right(right)) {
        (Some(Num::F(_)), _) | (_, Some(Num::F(_))) => false,
        (Some(_), Some(r)) => r.is_zero(),
        _ => false,
    }
}
