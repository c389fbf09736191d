//! Bridge exposing host objects to scripts.
//!
//! A [`CustomVar`] is a non-owning handle: the host keeps the object alive
//! behind an `Rc` and the script only holds a `Weak` to it, so a released
//! object turns into a [`QueryError::Released`] instead of a dangling read.
//! Behavior lives in a [`CustomVarHandler`], one per exposed host type.

mod auto_var;

#[cfg(test)]
mod custom_var_test;

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::runtime::Arg;

pub use auto_var::{Accessor, AccessorBuilder, AutoVarHandler};

/// Name and in-memory size of an exposed host type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor<'a> {
    pub name: &'a str,
    pub size: usize,
}

/// What a script asks of a custom variable.
#[derive(Debug, Clone, Copy)]
pub enum Query<'q, 'a> {
    /// `var.member`
    Member(&'q str),
    /// `var[index]`
    Index(&'q Arg<'a>),
}

/// Result of an assignment the handler accepted without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned,
    /// The type has no assigner; the value was dropped.
    NotSupported,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("index out of bound, access [{index}] of length [{len}]")]
    IndexOutOfBound { index: i128, len: usize },
    #[error("Require integer as indexer, get [{0}]")]
    IndexType(&'static str),
    #[error("no member [{member}] on [{type_name}]")]
    NoMember { type_name: String, member: String },
    #[error("[{0}] is not assignable")]
    NotAssignable(String),
    #[error("member [{0}] rejected the value")]
    Rejected(String),
    #[error("cannot assign to an array as a whole")]
    ArrayAssign,
    #[error("host object has been released")]
    Released,
    #[error("host object is already borrowed")]
    Busy,
    #[error("handle does not refer to a [{0}]")]
    TypeMismatch(String),
    #[error("{0}")]
    Host(String),
}

/// Capabilities a host type provides to scripts.
pub trait CustomVarHandler {
    fn describe_type(&self) -> TypeDescriptor<'_>;

    /// Resolves a member or index. `Ok(None)` means the query does not apply
    /// to this type.
    fn query(&self, var: &CustomVar, query: Query<'_, '_>) -> Result<Option<Arg<'static>>, QueryError>;

    fn assign_member(&self, var: &CustomVar, member: &str, _value: Arg<'static>) -> Result<AssignOutcome, QueryError> {
        Err(QueryError::NoMember {
            type_name: self.describe_type().name.to_string(),
            member: member.to_string(),
        })
    }

    /// Replaces the whole object. Types without an assigner report
    /// [`AssignOutcome::NotSupported`] instead of failing.
    fn assign(&self, _var: &CustomVar, _value: Arg<'static>) -> Result<AssignOutcome, QueryError> {
        Ok(AssignOutcome::NotSupported)
    }

    fn to_display_string(&self, var: &CustomVar) -> String {
        let name = self.describe_type().name;
        match var.slot {
            VarSlot::Element(index) => format!("[{name}@{index}]"),
            VarSlot::Whole if var.flags.array => format!("[{name}[]]"),
            VarSlot::Whole => format!("[{name}]"),
        }
    }
}

/// Which part of the target a handle designates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarSlot {
    Whole,
    Element(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VarFlags {
    /// The target is a sequence of host objects.
    pub array: bool,
    pub mutable: bool,
}

#[derive(Clone)]
pub struct CustomVar {
    handler: Rc<dyn CustomVarHandler>,
    target: Weak<dyn Any>,
    pub slot: VarSlot,
    pub flags: VarFlags,
}

impl CustomVar {
    pub fn new(handler: Rc<dyn CustomVarHandler>, target: Weak<dyn Any>, flags: VarFlags) -> Self {
        Self {
            handler,
            target,
            slot: VarSlot::Whole,
            flags,
        }
    }

    pub fn handler(&self) -> &dyn CustomVarHandler {
        self.handler.as_ref()
    }

    /// The host object, if it is still alive.
    pub fn target(&self) -> Result<Rc<dyn Any>, QueryError> {
        self.target.upgrade().ok_or(QueryError::Released)
    }

    /// Handle to one element of an array target.
    pub fn element(&self, index: usize) -> Self {
        Self {
            slot: VarSlot::Element(index),
            ..self.clone()
        }
    }

    pub fn is_whole_array(&self) -> bool {
        self.flags.array && self.slot == VarSlot::Whole
    }

    pub fn query(&self, query: Query<'_, '_>) -> Result<Option<Arg<'static>>, QueryError> {
        self.handler.query(self, query)
    }

    pub fn assign_member(&self, member: &str, value: Arg<'static>) -> Result<AssignOutcome, QueryError> {
        self.handler.assign_member(self, member, value)
    }

    pub fn assign(&self, value: Arg<'static>) -> Result<AssignOutcome, QueryError> {
        self.handler.assign(self, value)
    }

    pub fn to_display_string(&self) -> String {
        self.handler.to_display_string(self)
    }
}

impl PartialEq for CustomVar {
    /// Same handler, same object, same slot.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.handler, &other.handler) && Weak::ptr_eq(&self.target, &other.target) && self.slot == other.slot
    }
}

impl fmt::Debug for CustomVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomVar")
            .field("type", &self.handler.describe_type().name)
            .field("slot", &self.slot)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Resolves a script index against a sequence of `len` items. Negative
/// indices count from the end.
pub fn bidir_index(len: usize, index: &Arg<'_>) -> Result<usize, QueryError> {
    let wanted: i128 = match index {
        Arg::Uint(v) => *v as i128,
        Arg::Int(v) => *v as i128,
        other => return Err(QueryError::IndexType(other.type_name())),
    };
    let resolved = if wanted < 0 { wanted + len as i128 } else { wanted };
    if (0..len as i128).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(QueryError::IndexOutOfBound { index: wanted, len })
    }
}
