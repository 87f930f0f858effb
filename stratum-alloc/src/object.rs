//! Typed object allocation contract.

use crate::CreateError;

/// Places values into allocator-owned storage and takes them back.
///
/// Handles are plain values; the allocator owns the memory they name.
pub trait ObjectAllocator<T> {
    /// Handle naming a created object.
    type Handle: Copy + Eq;

    /// Moves `value` into a fresh block.
    ///
    /// On failure the value is returned inside the error.
    fn create(&mut self, value: T) -> Result<Self::Handle, CreateError<T>>;

    /// Drops the object named by `handle` and recycles its block.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not name a live object of this allocator.
    fn release(&mut self, handle: Self::Handle);

    /// Drops every live object and returns all memory to the backing allocator.
    ///
    /// Every outstanding handle is invalidated.
    fn reset(&mut self);
}
