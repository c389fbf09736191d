//! Stack growth for the recursive parts of the parser and the runtime.
//!
//! Nested expressions, blocks and script function calls all recurse on the
//! native stack. Every recursion point goes through
//! [`ensure_sufficient_stack`], so deep input hits the runtime's
//! `max_depth` check (or just parses) instead of overflowing the thread.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 256 * 1024;

/// Size of each newly allocated segment.
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
