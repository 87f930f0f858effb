//! Backing ("auxiliary") allocators.
//!
//! A [`RawAllocator`] hands out untyped memory for a [`Layout`]. Pools sit on
//! top of one and only call it when they need a whole new chunk, so the
//! backing allocator is off the hot path.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::AllocError;

/// Untyped memory provider.
///
/// # Example
///
/// ```
/// use std::alloc::Layout;
/// use stratum_alloc::{DefaultAllocator, RawAllocator};
///
/// let mut heap = DefaultAllocator::new();
/// let layout = Layout::array::<u64>(16).unwrap();
///
/// let ptr = heap.allocate(layout).unwrap();
/// assert_eq!(heap.allocated_bytes(), 128);
///
/// unsafe { heap.deallocate(ptr, layout) };
/// assert_eq!(heap.allocated_bytes(), 0);
/// ```
pub trait RawAllocator {
    /// Allocates a block of memory satisfying `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::OutOfMemory`] when memory is exhausted and
    /// [`AllocError::InvalidLayout`] when the layout is zero-sized or cannot
    /// be served by this allocator.
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Returns a block to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this allocator with the
    /// same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout);

    /// Discards allocator-wide state. Stateless allocators do nothing.
    fn reset(&mut self) {}
}

impl<A: RawAllocator + ?Sized> RawAllocator for &mut A {
    #[inline]
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { (**self).deallocate(ptr, layout) }
    }

    #[inline]
    fn reset(&mut self) {
        (**self).reset();
    }
}

// =============================================================================
// DefaultAllocator
// =============================================================================

/// General-purpose allocator backed by the global heap.
///
/// Keeps running totals of live bytes and live allocations.
#[derive(Debug, Default)]
pub struct DefaultAllocator {
    allocated_bytes: usize,
    allocations: usize,
}

impl DefaultAllocator {
    /// Creates a heap allocator with zeroed counters.
    pub const fn new() -> Self {
        Self {
            allocated_bytes: 0,
            allocations: 0,
        }
    }

    /// Bytes currently allocated through this instance.
    #[inline]
    pub const fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Number of live allocations made through this instance.
    #[inline]
    pub const fn allocations(&self) -> usize {
        self.allocations
    }
}

impl RawAllocator for DefaultAllocator {
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if layout.size() == 0 {
            return Err(AllocError::InvalidLayout);
        }

        // Safety: layout has non-zero size
        let ptr = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(ptr).ok_or(AllocError::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        })?;

        self.allocated_bytes += layout.size();
        self.allocations += 1;
        Ok(ptr)
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        debug_assert!(self.allocations > 0, "deallocate without allocation");

        unsafe { alloc::dealloc(ptr.as_ptr(), layout) };

        self.allocated_bytes -= layout.size();
        self.allocations -= 1;
    }
}

// =============================================================================
// NullAllocator
// =============================================================================

/// Allocator that never has memory.
///
/// Every request fails with [`AllocError::OutOfMemory`]. Useful to exercise
/// exhaustion paths, or as a placeholder backing for pools that must never
/// grow.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAllocator;

impl RawAllocator for NullAllocator {
    #[inline]
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        Err(AllocError::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        })
    }

    unsafe fn deallocate(&mut self, _ptr: NonNull<u8>, _layout: Layout) {
        unreachable!("NullAllocator never hands out memory");
    }
}
