//! Pool allocator over composable backing allocators.
//!
//! Two layers:
//!
//! - [`RawAllocator`]: untyped memory provider. [`DefaultAllocator`] (global
//!   heap), [`PageAllocator`] (anonymous pages from the OS, optionally locked)
//!   and [`NullAllocator`] (always out of memory).
//! - [`Pool`]: fixed-size blocks carved from chunks of a backing allocator,
//!   recycled through a free list. Implements [`ObjectAllocator`].
//!
//! # Example
//!
//! ```
//! use stratum_alloc::{ObjectAllocator, Pool, PoolBuilder};
//!
//! struct Order {
//!     id: u64,
//!     qty: u32,
//! }
//!
//! let mut pool: Pool<Order> = PoolBuilder::default().blocks_per_chunk(256).build()?;
//!
//! let id = pool.create(Order { id: 1, qty: 100 }).map_err(|e| e.error())?;
//! pool.get_mut(id).unwrap().qty -= 40;
//! assert_eq!(pool.get(id).map(|o| (o.id, o.qty)), Some((1, 60)));
//!
//! pool.release(id);
//! assert!(pool.is_empty());
//!
//! // All chunks go back to the heap
//! pool.reset();
//! assert_eq!(pool.chunk_count(), 0);
//! # Ok::<(), stratum_alloc::AllocError>(())
//! ```

mod error;
mod meta;
mod object;
mod page;
mod pool;
mod raw;
mod sys;

pub use error::{AllocError, CreateError};
pub use meta::BlockId;
pub use object::ObjectAllocator;
pub use page::PageAllocator;
pub use pool::{Pool, PoolBuilder, PoolStats};
pub use raw::{DefaultAllocator, NullAllocator, RawAllocator};
