//! Frames track control flow for each block being executed.

use std::fmt;
use std::ops::{BitOr, Deref, DerefMut};

use super::NailangRuntime;
use crate::ast::Block;

/// Small bitset describing what a frame absorbs.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags(u8);

impl FrameFlags {
    pub const NONE: Self = Self(0);
    /// Absorbs `Break` and `Continue`.
    pub const IN_LOOP: Self = Self(1);
    /// Absorbs `Return`.
    pub const FLOW_SCOPE: Self = Self(1 << 1);
    /// Hides the caller's variables.
    pub const CALL_SCOPE: Self = Self(1 << 2);
    /// Has no context of its own.
    pub const VIRTUAL: Self = Self(1 << 3);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FrameFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for FrameFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::IN_LOOP, "InLoop"),
            (Self::FLOW_SCOPE, "FlowScope"),
            (Self::CALL_SCOPE, "CallScope"),
            (Self::VIRTUAL, "Virtual"),
        ];
        let set: Vec<_> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "[{}]", set.join("|"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgramStatus {
    #[default]
    Next,
    Break,
    Continue,
    Return,
    End,
}

#[derive(Debug)]
pub struct StackFrame<'a> {
    pub flags: FrameFlags,
    pub status: ProgramStatus,
    /// Block executing in this frame; `None` for loop frames.
    pub block: Option<&'a Block<'a>>,
    /// Whether a context was pushed along with the frame.
    pub owns_context: bool,
    /// Outcome of the `@If` on the previous statement, consumed by `@Else`.
    pub last_if: Option<bool>,
}

/// Pops its frame, and the context pushed with it, when dropped. Derefs to
/// the runtime so execution continues through the guard.
pub struct FrameGuard<'r, 'a> {
    pub(super) runtime: &'r mut NailangRuntime<'a>,
}

impl<'a> Deref for FrameGuard<'_, 'a> {
    type Target = NailangRuntime<'a>;

    fn deref(&self) -> &Self::Target {
        self.runtime
    }
}

impl DerefMut for FrameGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.runtime
    }
}

impl Drop for FrameGuard<'_, '_> {
    fn drop(&mut self) {
        let Some(frame) = self.runtime.frames.pop() else {
            return;
        };
        tracing::trace!(depth = self.runtime.frames.len(), flags = ?frame.flags, status = ?frame.status, "pop frame");
        if frame.owns_context && self.runtime.chain.pop().is_err() {
            tracing::warn!("frame owned a context but the chain was empty");
        }
    }
}
