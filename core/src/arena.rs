//! Bump-allocated memory pool owning every AST node of one parsed unit.
//!
//! The pool never frees individual objects. Everything is released at once
//! when the pool is dropped, so AST references carry the pool's lifetime.

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use bumpalo::Bump;

/// Default size of a pool trunk (2 MiB).
pub const DEFAULT_TRUNK_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("invalid allocation layout: size {size}, align {align}")]
    InvalidLayout { size: usize, align: usize },
}

/// Snapshot of how much of the pool is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolUsage {
    /// Bytes handed out by the pool.
    pub used: usize,
    /// Bytes reserved across all trunks.
    pub total: usize,
}

pub struct MemoryPool {
    bump: Bump,
    used: Cell<usize>,
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::with_trunk_size(DEFAULT_TRUNK_SIZE)
    }

    /// Creates a pool whose first trunk holds `trunk_size` bytes.
    pub fn with_trunk_size(trunk_size: usize) -> Self {
        Self {
            bump: Bump::with_capacity(trunk_size),
            used: Cell::new(0),
        }
    }

    fn track(&self, bytes: usize) {
        self.used.set(self.used.get() + bytes);
    }

    /// Moves `value` into the pool.
    pub fn create<T>(&self, value: T) -> &T {
        self.track(core::mem::size_of::<T>());
        self.bump.alloc(value)
    }

    /// Copies a slice into the pool.
    pub fn create_array<T: Clone>(&self, items: &[T]) -> &[T] {
        self.track(core::mem::size_of_val(items));
        self.bump.alloc_slice_clone(items)
    }

    /// Collects an exact-size iterator into a pool-owned slice.
    pub fn create_array_from<T, I>(&self, items: I) -> &[T]
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = items.into_iter();
        self.track(iter.len() * core::mem::size_of::<T>());
        self.bump.alloc_slice_fill_iter(iter)
    }

    pub fn alloc_str(&self, text: &str) -> &str {
        self.track(text.len());
        self.bump.alloc_str(text)
    }

    /// Reserves `size` uninitialized bytes aligned to `align`.
    ///
    /// Requests larger than the current trunk land in a fresh trunk sized
    /// for them; earlier allocations are never moved.
    pub fn alloc_raw(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        let layout =
            Layout::from_size_align(size, align).map_err(|_| ArenaError::InvalidLayout { size, align })?;
        self.track(size);
        Ok(self.bump.alloc_layout(layout))
    }

    pub fn usage(&self) -> PoolUsage {
        PoolUsage {
            used: self.used.get(),
            total: self.bump.allocated_bytes(),
        }
    }
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for MemoryPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let usage = self.usage();
        f.debug_struct("MemoryPool")
            .field("used", &usage.used)
            .field("total", &usage.total)
            .finish()
    }
}
