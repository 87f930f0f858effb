//! Block bookkeeping for the pool.

/// Sentinel for an empty free list.
pub(crate) const BLOCK_NONE: u32 = u32::MAX;

/// A block in a pool chunk - either vacant or occupied.
///
/// Blocks live in memory obtained from the backing allocator and are only
/// touched through raw pointers. The discriminant lets the pool tell live
/// blocks from released ones.
pub(crate) enum Slot<T> {
    /// Block is on the free list. `next_free` is a global block number.
    Vacant { next_free: u32 },
    /// Block holds a value.
    Occupied { value: T },
}

impl<T> Slot<T> {
    #[inline]
    pub(crate) const fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }
}

/// Handle to a block in a [`Pool`](crate::Pool).
///
/// A global block number: chunk `index / blocks_per_chunk`, offset
/// `index % blocks_per_chunk`. Handles stay valid until the block is
/// released or the pool is reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    /// Reserved handle that never names a block.
    pub const NONE: BlockId = BlockId(BLOCK_NONE);

    /// Returns the global block number.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Builds a handle from a raw block number.
    ///
    /// The pool validates the number on every access, so a forged handle can
    /// at worst name the wrong live block.
    #[inline]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns true if this is [`BlockId::NONE`].
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == BLOCK_NONE
    }
}
