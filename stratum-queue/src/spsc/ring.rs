//! Shared storage behind a [`Producer`](super::Producer) /
//! [`Consumer`](super::Consumer) pair.
//!
//! One heap allocation for the header and one for the slots:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │ head (cache-line padded) - consumer read cursor       │
//! ├───────────────────────────────────────────────────────┤
//! │ tail (cache-line padded) - producer write cursor      │
//! ├───────────────────────────────────────────────────────┤
//! │ capacity, mask, ref count, disconnect flags           │
//! └───────────────────────────────────────────────────────┘
//!   slots: [MaybeUninit<T>; capacity.next_power_of_two()]
//! ```
//!
//! Slots in `[head, tail)` are initialized. Cursors increase monotonically
//! and wrap at `usize::MAX`; the physical slot is `cursor & mask`.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

#[repr(C)]
pub(crate) struct Ring<T> {
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,

    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    capacity: usize,
    mask: usize,

    ref_count: AtomicUsize,
    producer_dropped: AtomicBool,
    consumer_dropped: AtomicBool,
}

// Safety: each slot is accessed by exactly one side at a time, handed over
// through the Release/Acquire cursor pair.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Allocates a ring holding exactly `capacity` items.
    ///
    /// The returned pointer carries two references, one per handle.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or its next power of two overflows.
    pub(crate) fn allocate(capacity: usize) -> NonNull<Self> {
        assert!(capacity > 0, "ring queue capacity must be non-zero");
        let slots = capacity
            .checked_next_power_of_two()
            .expect("ring queue capacity overflow");

        tracing::trace!(capacity, slots, "ring queue created");

        let ring = Box::new(Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            slots: (0..slots)
                .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
                .collect(),
            capacity,
            mask: slots - 1,
            ref_count: AtomicUsize::new(2),
            producer_dropped: AtomicBool::new(false),
            consumer_dropped: AtomicBool::new(false),
        });

        NonNull::from(Box::leak(ring))
    }

    /// Requested capacity, not the physical slot count.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub(crate) fn load_head(&self) -> usize {
        self.head.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub(crate) fn load_tail(&self) -> usize {
        self.tail.load(Ordering::Acquire)
    }

    /// Makes every slot before `head` available to the producer.
    #[inline(always)]
    pub(crate) fn publish_head(&self, head: usize) {
        self.head.store(head, Ordering::Release);
    }

    /// Makes every slot before `tail` visible to the consumer.
    #[inline(always)]
    pub(crate) fn publish_tail(&self, tail: usize) {
        self.tail.store(tail, Ordering::Release);
    }

    #[inline(always)]
    fn slot(&self, cursor: usize) -> *mut MaybeUninit<T> {
        // Masked, always in bounds
        self.slots[cursor & self.mask].get()
    }

    /// Writes `value` into the slot for `cursor`.
    ///
    /// # Safety
    ///
    /// Caller is the producer, and the slot is outside `[head, tail)`.
    #[inline(always)]
    pub(crate) unsafe fn write(&self, cursor: usize, value: T) {
        unsafe { (*self.slot(cursor)).write(value) };
    }

    /// Moves the value out of the slot for `cursor`.
    ///
    /// # Safety
    ///
    /// Caller is the consumer, and the slot is inside `[head, tail)` as
    /// observed through an Acquire load of `tail`.
    #[inline(always)]
    pub(crate) unsafe fn read(&self, cursor: usize) -> T {
        unsafe { (*self.slot(cursor)).assume_init_read() }
    }

    pub(crate) fn is_producer_dropped(&self) -> bool {
        self.producer_dropped.load(Ordering::Acquire)
    }

    pub(crate) fn is_consumer_dropped(&self) -> bool {
        self.consumer_dropped.load(Ordering::Acquire)
    }

    pub(crate) fn set_producer_dropped(&self) {
        self.producer_dropped.store(true, Ordering::Release);
    }

    pub(crate) fn set_consumer_dropped(&self) {
        self.consumer_dropped.store(true, Ordering::Release);
    }

    /// Drops one handle's reference, freeing the ring on the last one.
    ///
    /// # Safety
    ///
    /// Called once per handle, from its `Drop`. `this` is not used afterwards.
    pub(crate) unsafe fn release(this: NonNull<Self>) {
        let last = unsafe { this.as_ref() }
            .ref_count
            .fetch_sub(1, Ordering::AcqRel)
            == 1;

        if last {
            drop(unsafe { Box::from_raw(this.as_ptr()) });
        }
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Sole owner
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();

        let mut cursor = head;
        while cursor != tail {
            unsafe { self.slots[cursor & self.mask].get_mut().assume_init_drop() };
            cursor = cursor.wrapping_add(1);
        }
    }
}
