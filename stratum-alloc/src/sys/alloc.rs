//! Fallback implementation using std::alloc.

use std::alloc::Layout;
use std::io;
use std::ptr::NonNull;

const PAGE_SIZE: usize = 4096;

pub(crate) fn page_size() -> usize {
    PAGE_SIZE
}

pub(crate) fn map_pages(size: usize) -> io::Result<NonNull<u8>> {
    debug_assert!(size > 0 && size % PAGE_SIZE == 0);

    let layout = Layout::from_size_align(size, PAGE_SIZE)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let ptr = unsafe { std::alloc::alloc_zeroed(layout) };

    NonNull::new(ptr).ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "allocation failed"))
}

pub(crate) fn lock_pages(_ptr: NonNull<u8>, _size: usize) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "page locking is not supported on this platform",
    ))
}

/// # Safety
/// `ptr` and `size` must come from a previous `map_pages` call.
pub(crate) unsafe fn unmap_pages(ptr: NonNull<u8>, size: usize) {
    unsafe {
        let layout = Layout::from_size_align_unchecked(size, PAGE_SIZE);
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }
}
