//! Intrusive collections over external storage.
//!
//! Structure is kept apart from storage:
//!
//! ```text
//! Storage (Vec, Pool) - owns nodes, provides stable indices
//! List                - links indices, owns nothing
//! ```
//!
//! Nodes embed their own links (see [`Linked`]), so pushing, popping and
//! moving nodes between lists never allocates. Every list operation takes the
//! storage as an explicit argument.
//!
//! # Quick Start
//!
//! ```
//! use stratum_collections::{Index, List, linked};
//!
//! struct Order {
//!     id: u64,
//!     qty: u64,
//!     next: usize,
//!     prev: usize,
//! }
//!
//! linked!(Order, usize);
//!
//! let mut orders: Vec<Order> = (0..3)
//!     .map(|id| Order { id, qty: 10 * id, next: usize::NONE, prev: usize::NONE })
//!     .collect();
//!
//! let mut level: List<usize> = List::from_keys(&mut orders, [0, 1, 2]);
//!
//! // Cancel the middle order - O(1)
//! level.pop_current(&mut orders, 1);
//!
//! let ids: Vec<_> = level.iter(&orders).map(|o| o.id).collect();
//! assert_eq!(ids, [0, 2]);
//! ```
//!
//! # Pool-backed nodes
//!
//! A [`stratum_alloc::Pool`] is itself a [`Storage`], indexed by
//! [`BlockId`](stratum_alloc::BlockId):
//!
//! ```
//! use stratum_alloc::{BlockId, Pool};
//! use stratum_collections::{List, linked};
//!
//! struct Timer {
//!     deadline: u64,
//!     next: BlockId,
//!     prev: BlockId,
//! }
//!
//! linked!(Timer, BlockId);
//!
//! let mut pool: Pool<Timer> = Pool::new()?;
//! let mut wheel: List<BlockId> = List::new();
//!
//! for deadline in [5, 10, 15] {
//!     let id = pool
//!         .create(Timer { deadline, next: BlockId::NONE, prev: BlockId::NONE })
//!         .map_err(|e| e.error())?;
//!     wheel.push_back(&mut pool, id);
//! }
//!
//! let expired = wheel.pop_front(&mut pool).unwrap();
//! assert_eq!(pool.take(expired).map(|t| t.deadline), Some(5));
//! assert_eq!(wheel.len(&pool), 2);
//! # Ok::<(), stratum_alloc::AllocError>(())
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod index;
pub mod iter;
pub mod linked;
pub mod storage;

pub use error::LinkError;
pub use index::Index;
pub use iter::{Iter, Keys};
pub use linked::{Linked, List};
pub use storage::Storage;
