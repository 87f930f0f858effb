//! Sentinel-based index trait for zero-cost optional links.
//!
//! Uses a reserved sentinel value (e.g., `u32::MAX`) instead of `Option<Idx>`
//! so link fields embedded in nodes stay the size of the index itself.

use stratum_alloc::BlockId;

/// A copyable handle into node storage with a sentinel "none" value.
///
/// # Example
///
/// ```
/// use stratum_collections::Index;
///
/// let idx: u32 = 5;
/// let none: u32 = u32::NONE;
///
/// assert!(idx.is_some());
/// assert!(none.is_none());
/// ```
pub trait Index: Copy + Eq {
    /// Sentinel value representing "no node".
    const NONE: Self;

    /// Returns `true` if this is the sentinel value.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Returns `true` if this is not the sentinel value.
    #[inline]
    fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Converts to `Option`, mapping the sentinel to `None`.
    #[inline]
    fn into_option(self) -> Option<Self> {
        if self.is_none() { None } else { Some(self) }
    }
}

macro_rules! impl_index_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Index for $ty {
                const NONE: Self = <$ty>::MAX;
            }
        )*
    };
}

impl_index_for_unsigned!(u8, u16, u32, u64, usize);

impl Index for BlockId {
    const NONE: Self = BlockId::NONE;
}
