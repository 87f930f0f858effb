//! Platform-specific page mapping (internal).

#[cfg(not(unix))]
mod alloc;

#[cfg(unix)]
mod unix;

#[cfg(not(unix))]
pub(crate) use alloc::{lock_pages, map_pages, page_size, unmap_pages};

#[cfg(unix)]
pub(crate) use unix::{lock_pages, map_pages, page_size, unmap_pages};

/// Rounds `size` up to a whole number of pages.
///
/// Returns `None` on overflow.
#[inline]
pub(crate) fn round_to_pages(size: usize) -> Option<usize> {
    let page = page_size();
    size.checked_add(page - 1).map(|s| s & !(page - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_power_of_two() {
        assert!(page_size().is_power_of_two());
        assert!(page_size() >= 4096);
    }

    #[test]
    fn rounding() {
        let page = page_size();
        assert_eq!(round_to_pages(1), Some(page));
        assert_eq!(round_to_pages(page), Some(page));
        assert_eq!(round_to_pages(page + 1), Some(2 * page));
        assert_eq!(round_to_pages(usize::MAX), None);
    }

    #[test]
    fn mapping_is_page_aligned_and_writable() {
        let size = 4 * page_size();
        let ptr = map_pages(size).unwrap();
        assert_eq!(ptr.as_ptr() as usize % page_size(), 0);

        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0xAB, size);
            assert_eq!(*ptr.as_ptr(), 0xAB);
            assert_eq!(*ptr.as_ptr().add(size - 1), 0xAB);
            unmap_pages(ptr, size);
        }
    }

    #[test]
    fn distinct_mappings() {
        let size = page_size();
        let mappings: Vec<_> = (0..8).map(|_| map_pages(size).unwrap()).collect();
        for i in 0..mappings.len() {
            for j in (i + 1)..mappings.len() {
                assert_ne!(mappings[i], mappings[j]);
            }
        }
        for ptr in mappings {
            unsafe { unmap_pages(ptr, size) };
        }
    }

    #[test]
    fn lock_does_not_panic() {
        let size = page_size();
        let ptr = map_pages(size).unwrap();
        let _ = lock_pages(ptr, size);
        unsafe { unmap_pages(ptr, size) };
    }
}
