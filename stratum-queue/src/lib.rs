//! # stratum-queue
//!
//! Wait-free ring queue for handing values between exactly two threads.
//!
//! ## Design Goals
//!
//! - No allocation after construction
//! - One Release store per operation on the fast path
//! - Cache-line isolated cursors to prevent false sharing
//! - Exact capacity: a queue built for `C` items holds `C` items
//!
//! ## Example
//!
//! ```
//! use stratum_queue::spsc;
//!
//! let (mut tx, mut rx) = spsc::ring_queue::<u64>(1000);
//! assert_eq!(tx.capacity(), 1000);
//!
//! tx.enqueue(42).unwrap();
//! assert_eq!(rx.dequeue(), Some(42));
//! assert_eq!(rx.dequeue(), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod spsc;
