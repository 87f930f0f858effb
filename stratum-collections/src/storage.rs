//! Storage trait for node containers with stable indices.
//!
//! The list never owns its nodes. Whatever holds them (a `Vec`, a
//! [`Pool`](stratum_alloc::Pool)) is passed to every list operation through
//! this access-only contract. Allocation and release stay with the container.

use stratum_alloc::{BlockId, Pool, RawAllocator};

use crate::Index;

/// Indexed access to nodes.
///
/// # Requirements
///
/// - **Stable indices**: an index keeps naming the same node until the
///   container itself removes it
/// - **O(1)** access
///
/// # Implementations
///
/// - `Vec<T>`: index `usize`
/// - [`stratum_alloc::Pool<T, A>`]: index [`BlockId`]
pub trait Storage<T> {
    /// Index type for this storage.
    type Index: Index;

    /// Returns a reference to the node at `index`, if present.
    fn get(&self, index: Self::Index) -> Option<&T>;

    /// Returns a mutable reference to the node at `index`, if present.
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T>;

    /// Returns a reference without checking.
    ///
    /// # Safety
    ///
    /// `index` must name a present node.
    unsafe fn get_unchecked(&self, index: Self::Index) -> &T;

    /// Returns a mutable reference without checking.
    ///
    /// # Safety
    ///
    /// `index` must name a present node.
    unsafe fn get_unchecked_mut(&mut self, index: Self::Index) -> &mut T;

    /// Number of nodes present.
    fn len(&self) -> usize;

    /// Returns `true` if no node is present.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Storage<T> for Vec<T> {
    type Index = usize;

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    #[inline]
    fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    #[inline]
    unsafe fn get_unchecked(&self, index: usize) -> &T {
        unsafe { self.as_slice().get_unchecked(index) }
    }

    #[inline]
    unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        unsafe { self.as_mut_slice().get_unchecked_mut(index) }
    }

    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl<T, A: RawAllocator> Storage<T> for Pool<T, A> {
    type Index = BlockId;

    #[inline]
    fn get(&self, index: BlockId) -> Option<&T> {
        Pool::get(self, index)
    }

    #[inline]
    fn get_mut(&mut self, index: BlockId) -> Option<&mut T> {
        Pool::get_mut(self, index)
    }

    #[inline]
    unsafe fn get_unchecked(&self, index: BlockId) -> &T {
        unsafe { Pool::get_unchecked(self, index) }
    }

    #[inline]
    unsafe fn get_unchecked_mut(&mut self, index: BlockId) -> &mut T {
        unsafe { Pool::get_unchecked_mut(self, index) }
    }

    #[inline]
    fn len(&self) -> usize {
        Pool::len(self)
    }
}
