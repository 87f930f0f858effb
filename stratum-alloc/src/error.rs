//! Error types for allocation.

use std::fmt;

use thiserror::Error;

/// Failure reported by a backing allocator or while configuring a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The backing allocator could not supply the requested memory.
    #[error("out of memory ({size} bytes, align {align})")]
    OutOfMemory {
        /// Requested size in bytes.
        size: usize,
        /// Requested alignment in bytes.
        align: usize,
    },
    /// The requested size/alignment cannot be expressed as a layout, or the
    /// allocator cannot honour the alignment.
    #[error("invalid layout")]
    InvalidLayout,
    /// The pool already holds its configured maximum number of chunks.
    #[error("chunk limit reached ({max_chunks} chunks)")]
    ChunkLimit {
        /// Configured chunk limit.
        max_chunks: usize,
    },
    /// A pool was configured with zero blocks per chunk.
    #[error("blocks per chunk cannot be zero")]
    ZeroBlocksPerChunk,
    /// Block numbering would exceed the `u32` handle space.
    #[error("block index space exhausted")]
    IndexOverflow,
    /// Pinning pages in physical memory failed (likely `RLIMIT_MEMLOCK`).
    #[error("failed to lock pages in memory")]
    LockFailed,
}

/// Error returned by [`ObjectAllocator::create`](crate::ObjectAllocator::create).
///
/// Hands back the value that could not be placed, together with the reason.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CreateError<T> {
    value: T,
    error: AllocError,
}

impl<T> CreateError<T> {
    pub(crate) const fn new(value: T, error: AllocError) -> Self {
        Self { value, error }
    }

    /// Returns the underlying allocation failure.
    #[inline]
    pub const fn error(&self) -> AllocError {
        self.error
    }

    /// Returns the value that could not be placed.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> fmt::Debug for CreateError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for CreateError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot create object: {}", self.error)
    }
}

impl<T> std::error::Error for CreateError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
