//! Single-producer single-consumer ring queue.
//!
//! [`ring_queue`] returns a [`Producer`] and a [`Consumer`] sharing one
//! fixed buffer. Each handle is `Send` but not `Sync`, and both operations
//! take `&mut self`, so the one-producer one-consumer rule is checked by the
//! compiler.
//!
//! Neither operation blocks. A full queue hands the item back in [`Full`];
//! an empty queue returns `None`. How to wait (spin, yield, park) is up to
//! the caller.
//!
//! # Example
//!
//! ```
//! use stratum_queue::spsc;
//!
//! let (mut tx, mut rx) = spsc::ring_queue::<u64>(4);
//!
//! let consumer = std::thread::spawn(move || {
//!     let mut sum = 0;
//!     let mut seen = 0;
//!     while seen < 100 {
//!         match rx.dequeue() {
//!             Some(v) => {
//!                 sum += v;
//!                 seen += 1;
//!             }
//!             None => std::hint::spin_loop(),
//!         }
//!     }
//!     sum
//! });
//!
//! for i in 0..100 {
//!     let mut item = i;
//!     while let Err(full) = tx.enqueue(item) {
//!         item = full.into_inner();
//!         std::hint::spin_loop();
//!     }
//! }
//!
//! assert_eq!(consumer.join().unwrap(), 4950);
//! ```
//!
//! # Capacity
//!
//! Exactly `capacity` items fit. The buffer is rounded up to a power of two
//! internally so slot lookup is a mask, but the extra slots are never used.
//!
//! # Ordering
//!
//! The producer publishes `tail` with Release after writing a slot, and the
//! consumer publishes `head` with Release after reading one. Each side keeps
//! a cached copy of the other's cursor and only reloads it (Acquire) when
//! the queue looks full or empty.

use std::fmt;
use std::ptr::NonNull;

mod ring;

use ring::Ring;

/// Creates a queue holding exactly `capacity` items.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn ring_queue<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let ring = Ring::allocate(capacity);

    (
        Producer {
            ring,
            tail: 0,
            cached_head: 0,
        },
        Consumer {
            ring,
            head: 0,
            cached_tail: 0,
        },
    )
}

/// The queue was full; the item is returned unchanged.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the item that could not be enqueued.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ring queue is full")
    }
}

impl<T> std::error::Error for Full<T> {}

/// The writing half of a ring queue.
pub struct Producer<T> {
    ring: NonNull<Ring<T>>,
    /// Next cursor to write. Mirrors the shared `tail`.
    tail: usize,
    /// Last observed consumer cursor.
    cached_head: usize,
}

// Safety: the producer only touches slots outside `[head, tail)` and its
// own cursor. NonNull keeps it !Sync.
unsafe impl<T: Send> Send for Producer<T> {}

impl<T> Producer<T> {
    /// Enqueues `item`, or returns it in [`Full`] if no slot is free.
    #[inline]
    pub fn enqueue(&mut self, item: T) -> Result<(), Full<T>> {
        // Safety: valid until both handles drop
        let ring = unsafe { self.ring.as_ref() };
        let tail = self.tail;

        if tail.wrapping_sub(self.cached_head) == ring.capacity() {
            return self.enqueue_slow(ring, tail, item);
        }

        self.commit(ring, tail, item);
        Ok(())
    }

    #[cold]
    fn enqueue_slow(&mut self, ring: &Ring<T>, tail: usize, item: T) -> Result<(), Full<T>> {
        self.cached_head = ring.load_head();

        if tail.wrapping_sub(self.cached_head) == ring.capacity() {
            return Err(Full(item));
        }

        self.commit(ring, tail, item);
        Ok(())
    }

    #[inline(always)]
    fn commit(&mut self, ring: &Ring<T>, tail: usize, item: T) {
        // Safety: tail - head < capacity, so the slot is free and ours
        unsafe { ring.write(tail, item) };
        self.tail = tail.wrapping_add(1);
        ring.publish_tail(self.tail);
    }

    /// Number of items currently queued.
    ///
    /// A snapshot: the consumer may dequeue concurrently.
    pub fn len(&self) -> usize {
        let ring = unsafe { self.ring.as_ref() };
        self.tail.wrapping_sub(ring.load_head())
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the next `enqueue` would fail, absent a concurrent
    /// dequeue.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        unsafe { self.ring.as_ref() }.capacity()
    }

    /// Returns `true` once the [`Consumer`] has been dropped.
    pub fn is_disconnected(&self) -> bool {
        unsafe { self.ring.as_ref() }.is_consumer_dropped()
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        // Safety: last use of this handle's reference
        unsafe {
            self.ring.as_ref().set_producer_dropped();
            Ring::release(self.ring);
        }
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// The reading half of a ring queue.
pub struct Consumer<T> {
    ring: NonNull<Ring<T>>,
    /// Next cursor to read. Mirrors the shared `head`.
    head: usize,
    /// Last observed producer cursor.
    cached_tail: usize,
}

// Safety: the consumer only touches slots inside `[head, tail)` and its own
// cursor. NonNull keeps it !Sync.
unsafe impl<T: Send> Send for Consumer<T> {}

impl<T> Consumer<T> {
    /// Dequeues the oldest item, or `None` if the queue is empty.
    #[inline]
    pub fn dequeue(&mut self) -> Option<T> {
        let ring = unsafe { self.ring.as_ref() };
        let head = self.head;

        if head == self.cached_tail {
            return self.dequeue_slow(ring, head);
        }

        Some(self.take(ring, head))
    }

    #[cold]
    fn dequeue_slow(&mut self, ring: &Ring<T>, head: usize) -> Option<T> {
        self.cached_tail = ring.load_tail();

        if head == self.cached_tail {
            return None;
        }

        Some(self.take(ring, head))
    }

    #[inline(always)]
    fn take(&mut self, ring: &Ring<T>, head: usize) -> T {
        // Safety: head != tail (Acquire), so the slot holds a published item
        let item = unsafe { ring.read(head) };
        self.head = head.wrapping_add(1);
        ring.publish_head(self.head);
        item
    }

    /// Number of items currently queued.
    ///
    /// A snapshot: the producer may enqueue concurrently.
    pub fn len(&self) -> usize {
        let ring = unsafe { self.ring.as_ref() };
        ring.load_tail().wrapping_sub(self.head)
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        unsafe { self.ring.as_ref() }.capacity()
    }

    /// Returns `true` once the [`Producer`] has been dropped.
    ///
    /// Items enqueued before the drop can still be dequeued.
    pub fn is_disconnected(&self) -> bool {
        unsafe { self.ring.as_ref() }.is_producer_dropped()
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        unsafe {
            self.ring.as_ref().set_consumer_dropped();
            Ring::release(self.ring);
        }
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn fifo() {
        let (mut tx, mut rx) = ring_queue::<u64>(8);

        tx.enqueue(1).unwrap();
        tx.enqueue(2).unwrap();
        tx.enqueue(3).unwrap();

        assert_eq!(rx.dequeue(), Some(1));
        assert_eq!(rx.dequeue(), Some(2));
        assert_eq!(rx.dequeue(), Some(3));
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn full_at_requested_capacity() {
        let (mut tx, mut rx) = ring_queue::<u64>(4);

        for i in 1..=4 {
            tx.enqueue(i).unwrap();
        }
        assert!(tx.is_full());
        assert_eq!(tx.enqueue(5), Err(Full(5)));

        assert_eq!(rx.dequeue(), Some(1));
        tx.enqueue(5).unwrap();

        let drained: Vec<_> = std::iter::from_fn(|| rx.dequeue()).collect();
        assert_eq!(drained, [2, 3, 4, 5]);
    }

    #[test]
    fn capacity_is_not_rounded() {
        for capacity in [1, 3, 5, 100] {
            let (mut tx, rx) = ring_queue::<usize>(capacity);
            assert_eq!(tx.capacity(), capacity);
            assert_eq!(rx.capacity(), capacity);

            for i in 0..capacity {
                tx.enqueue(i).unwrap();
            }
            assert_eq!(tx.enqueue(capacity).map_err(Full::into_inner), Err(capacity));
            assert_eq!(rx.len(), capacity);
            assert!(rx.is_full());
        }
    }

    #[test]
    fn capacity_one() {
        let (mut tx, mut rx) = ring_queue::<&str>(1);

        tx.enqueue("a").unwrap();
        assert!(tx.enqueue("b").is_err());
        assert_eq!(rx.dequeue(), Some("a"));
        assert!(rx.is_empty());
        tx.enqueue("b").unwrap();
        assert_eq!(rx.dequeue(), Some("b"));
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn zero_capacity_panics() {
        let _ = ring_queue::<u64>(0);
    }

    #[test]
    fn len_from_both_sides() {
        let (mut tx, mut rx) = ring_queue::<u64>(8);
        assert!(tx.is_empty() && rx.is_empty());

        tx.enqueue(1).unwrap();
        tx.enqueue(2).unwrap();
        assert_eq!(tx.len(), 2);
        assert_eq!(rx.len(), 2);

        rx.dequeue();
        assert_eq!(tx.len(), 1);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn cursors_wrap_many_times() {
        let (mut tx, mut rx) = ring_queue::<usize>(3);

        for i in 0..1000 {
            tx.enqueue(i).unwrap();
            tx.enqueue(i + 1).unwrap();
            assert_eq!(rx.dequeue(), Some(i));
            assert_eq!(rx.dequeue(), Some(i + 1));
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn cursors_wrap_at_usize_max() {
        let (mut tx, mut rx) = ring_queue::<usize>(3);

        // Start both sides just below the wrap point
        let start = usize::MAX - 1;
        tx.tail = start;
        tx.cached_head = start;
        rx.head = start;
        rx.cached_tail = start;
        let ring = unsafe { tx.ring.as_ref() };
        ring.publish_head(start);
        ring.publish_tail(start);

        for i in 0..3 {
            tx.enqueue(i).unwrap();
        }
        assert!(tx.enqueue(3).is_err());
        assert_eq!(rx.len(), 3);
        for i in 0..3 {
            assert_eq!(rx.dequeue(), Some(i));
        }
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn disconnect_flags() {
        let (mut tx, mut rx) = ring_queue::<u64>(4);
        assert!(!tx.is_disconnected());
        assert!(!rx.is_disconnected());

        tx.enqueue(7).unwrap();
        drop(tx);

        assert!(rx.is_disconnected());
        assert_eq!(rx.dequeue(), Some(7));
        assert_eq!(rx.dequeue(), None);

        let (tx, rx) = ring_queue::<u64>(4);
        drop(rx);
        assert!(tx.is_disconnected());
    }

    #[derive(Debug)]
    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn remaining_items_dropped() {
        let drops = Arc::new(AtomicUsize::new(0));

        let (mut tx, mut rx) = ring_queue::<DropCounter>(8);
        for _ in 0..5 {
            tx.enqueue(DropCounter(Arc::clone(&drops))).unwrap();
        }
        drop(rx.dequeue());
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        drop(tx);
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        drop(rx);
        assert_eq!(drops.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn full_returns_ownership() {
        let drops = Arc::new(AtomicUsize::new(0));
        let (mut tx, _rx) = ring_queue::<DropCounter>(1);

        tx.enqueue(DropCounter(Arc::clone(&drops))).unwrap();
        let rejected = tx.enqueue(DropCounter(Arc::clone(&drops))).unwrap_err();
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        drop(rejected.into_inner());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_sized_items() {
        let (mut tx, mut rx) = ring_queue::<()>(2);
        tx.enqueue(()).unwrap();
        tx.enqueue(()).unwrap();
        assert!(tx.enqueue(()).is_err());
        assert_eq!(rx.dequeue(), Some(()));
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn cross_thread_fifo() {
        const COUNT: u64 = 100_000;

        let (mut tx, mut rx) = ring_queue::<u64>(64);

        let producer = std::thread::spawn(move || {
            for i in 0..COUNT {
                let mut item = i;
                while let Err(Full(back)) = tx.enqueue(item) {
                    item = back;
                    std::hint::spin_loop();
                }
            }
        });

        let mut expected = 0;
        while expected < COUNT {
            if let Some(v) = rx.dequeue() {
                assert_eq!(v, expected);
                expected += 1;
            } else {
                std::hint::spin_loop();
            }
        }

        producer.join().unwrap();
        assert!(rx.is_disconnected());
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn full_display() {
        let err = Full(3u8);
        assert_eq!(err.to_string(), "ring queue is full");
        assert_eq!(format!("{err:?}"), "Full(..)");
    }

    #[test]
    fn handles_debug() {
        let (tx, rx) = ring_queue::<u8>(2);
        assert!(format!("{tx:?}").starts_with("Producer { capacity: 2, len: 0"));
        assert!(format!("{rx:?}").starts_with("Consumer { capacity: 2, len: 0"));
    }
}
