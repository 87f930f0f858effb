//! OS page allocator.

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::raw::RawAllocator;
use crate::{AllocError, sys};

/// Backing allocator that maps whole pages straight from the OS.
///
/// Every request is rounded up to a multiple of the page size and served by
/// its own anonymous mapping (`mmap` on unix). Pages are prefaulted on
/// allocation so the pool never takes a first-touch fault while carving
/// blocks. Alignments larger than a page are rejected.
///
/// With [`lock_pages`](Self::lock_pages) enabled, each mapping is also pinned
/// with `mlock`. A failed lock unmaps the region and reports
/// [`AllocError::LockFailed`].
#[derive(Debug, Default)]
pub struct PageAllocator {
    lock: bool,
    mapped_bytes: usize,
}

impl PageAllocator {
    /// Creates a page allocator that does not lock its pages.
    pub const fn new() -> Self {
        Self {
            lock: false,
            mapped_bytes: 0,
        }
    }

    /// Pin every mapping in physical memory. Default: false.
    pub const fn lock_pages(mut self, enabled: bool) -> Self {
        self.lock = enabled;
        self
    }

    /// Returns the OS page size.
    #[inline]
    pub fn page_size() -> usize {
        sys::page_size()
    }

    /// Bytes currently mapped through this instance (page-rounded).
    #[inline]
    pub const fn mapped_bytes(&self) -> usize {
        self.mapped_bytes
    }

    fn mapping_size(layout: Layout) -> Result<usize, AllocError> {
        if layout.size() == 0 || layout.align() > sys::page_size() {
            return Err(AllocError::InvalidLayout);
        }
        sys::round_to_pages(layout.size()).ok_or(AllocError::InvalidLayout)
    }
}

impl RawAllocator for PageAllocator {
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let size = Self::mapping_size(layout)?;

        let ptr = sys::map_pages(size).map_err(|_| AllocError::OutOfMemory {
            size,
            align: layout.align(),
        })?;

        if self.lock {
            if let Err(err) = sys::lock_pages(ptr, size) {
                tracing::warn!(size, error = %err, "failed to lock pages");
                unsafe { sys::unmap_pages(ptr, size) };
                return Err(AllocError::LockFailed);
            }
        }

        self.mapped_bytes += size;
        Ok(ptr)
    }

    unsafe fn deallocate(&mut self, ptr: NonNull<u8>, layout: Layout) {
        // allocate already validated this layout
        let size = match Self::mapping_size(layout) {
            Ok(size) => size,
            Err(_) => unreachable!("deallocate with a layout that was never allocated"),
        };

        unsafe { sys::unmap_pages(ptr, size) };
        self.mapped_bytes -= size;
    }
}
