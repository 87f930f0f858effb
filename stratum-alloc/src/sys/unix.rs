//! Unix implementation using mmap.

use std::io;
use std::ptr::NonNull;

pub(crate) fn page_size() -> usize {
    #[cfg(miri)]
    {
        4096
    }

    #[cfg(not(miri))]
    {
        static PAGE_SIZE: std::sync::OnceLock<usize> = std::sync::OnceLock::new();
        *PAGE_SIZE.get_or_init(|| {
            let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
            if size > 0 { size as usize } else { 4096 }
        })
    }
}

/// Maps `size` bytes (a whole number of pages) of private anonymous memory.
///
/// Pages are touched once so the first write on the hot path does not fault.
#[cfg(not(miri))]
pub(crate) fn map_pages(size: usize) -> io::Result<NonNull<u8>> {
    debug_assert!(size > 0 && size % page_size() == 0);

    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };

    if ptr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }

    let ptr = NonNull::new(ptr as *mut u8)
        .ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "mmap returned null"))?;

    // Request THP for large mappings
    #[cfg(target_os = "linux")]
    if size >= 2 * 1024 * 1024 {
        unsafe {
            libc::madvise(ptr.as_ptr() as *mut libc::c_void, size, libc::MADV_HUGEPAGE);
        }
    }

    for offset in (0..size).step_by(page_size()) {
        unsafe {
            std::ptr::write_volatile(ptr.as_ptr().add(offset), 0);
        }
    }

    Ok(ptr)
}

#[cfg(miri)]
pub(crate) fn map_pages(size: usize) -> io::Result<NonNull<u8>> {
    let layout = std::alloc::Layout::from_size_align(size, page_size())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
    NonNull::new(ptr).ok_or_else(|| io::Error::new(io::ErrorKind::OutOfMemory, "allocation failed"))
}

/// Pins pages in physical memory.
pub(crate) fn lock_pages(ptr: NonNull<u8>, size: usize) -> io::Result<()> {
    #[cfg(miri)]
    {
        let _ = (ptr, size);
        Ok(())
    }

    #[cfg(not(miri))]
    {
        let result = unsafe { libc::mlock(ptr.as_ptr() as *const libc::c_void, size) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

/// # Safety
/// `ptr` and `size` must come from a previous `map_pages` call.
pub(crate) unsafe fn unmap_pages(ptr: NonNull<u8>, size: usize) {
    #[cfg(miri)]
    unsafe {
        let layout = std::alloc::Layout::from_size_align_unchecked(size, page_size());
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }

    // munmap unlocks any mlocked range as well
    #[cfg(not(miri))]
    unsafe {
        libc::munmap(ptr.as_ptr() as *mut libc::c_void, size);
    }
}
