//! Intrusive doubly-linked list.
//!
//! Nodes embed their own prev/next links, so linking and unlinking never
//! allocate and removal given a node's index is O(1). The list only records
//! the front and back indices; the nodes live in caller-owned
//! [`Storage`], which is passed to every operation.
//!
//! # Storage Invariant
//!
//! A list instance must always be used with the same storage instance, and a
//! node may be linked into at most one list (per link pair) at a time. Both
//! are the caller's responsibility. An index missing from storage panics with
//! `invalid index`.
//!
//! Debug builds additionally assert that:
//!
//! - a node being linked has clear links and is not this list's front
//! - popped neighbours link back to the node being removed
//! - no walk takes more than `storage.len()` steps (a cycle)
//! - the list passes [`List::check_links`] after [`List::reverse`]
//!
//! Linking the sole member of *another* list is not caught at link time: its
//! links are clear, exactly like an unlinked node. The other list is left
//! pointing into this one, which `check_links` on that list then reports.

use std::mem;

use crate::iter::{Iter, Keys, WalkBound};
use crate::{Index, LinkError, Storage};

/// Trait for types that can participate in a doubly-linked list.
///
/// Implementors embed prev/next indices directly in their struct. Use
/// [`linked!`](crate::linked!) to generate the impl for plain fields.
///
/// # Example
///
/// ```
/// use stratum_collections::{Index, Linked};
///
/// struct Order {
///     id: u64,
///     price: u64,
///     qty: u64,
///     // Links for price-level queue
///     next: u32,
///     prev: u32,
/// }
///
/// impl Linked<u32> for Order {
///     fn next(&self) -> u32 { self.next }
///     fn prev(&self) -> u32 { self.prev }
///     fn set_next(&mut self, idx: u32) { self.next = idx; }
///     fn set_prev(&mut self, idx: u32) { self.prev = idx; }
/// }
/// ```
pub trait Linked<Idx: Index> {
    /// Returns the next node's index, or `Idx::NONE` if this is the back.
    fn next(&self) -> Idx;

    /// Returns the previous node's index, or `Idx::NONE` if this is the front.
    fn prev(&self) -> Idx;

    /// Sets the next node's index.
    fn set_next(&mut self, idx: Idx);

    /// Sets the previous node's index.
    fn set_prev(&mut self, idx: Idx);
}

/// Implements [`Linked`] for a struct with plain link fields.
///
/// `linked!(Type, Idx)` uses fields named `next` and `prev`;
/// `linked!(Type, Idx, next_field, prev_field)` names them explicitly.
///
/// ```
/// use stratum_collections::{Index, Linked, linked};
///
/// struct Task {
///     id: u32,
///     run_next: u16,
///     run_prev: u16,
/// }
///
/// linked!(Task, u16, run_next, run_prev);
///
/// let task = Task { id: 1, run_next: u16::NONE, run_prev: 3 };
/// assert!(task.next().is_none());
/// assert_eq!(task.prev(), 3);
/// ```
#[macro_export]
macro_rules! linked {
    ($ty:ty, $idx:ty) => {
        $crate::linked!($ty, $idx, next, prev);
    };
    ($ty:ty, $idx:ty, $next:ident, $prev:ident) => {
        impl $crate::Linked<$idx> for $ty {
            #[inline]
            fn next(&self) -> $idx {
                self.$next
            }

            #[inline]
            fn prev(&self) -> $idx {
                self.$prev
            }

            #[inline]
            fn set_next(&mut self, idx: $idx) {
                self.$next = idx;
            }

            #[inline]
            fn set_prev(&mut self, idx: $idx) {
                self.$prev = idx;
            }
        }
    };
}

/// A doubly-linked list over external storage.
///
/// The list only stores its front and back indices. There is no cached
/// length: [`len`](List::len) walks the list. Dropping a list never touches
/// its nodes.
///
/// # Example
///
/// ```
/// use stratum_collections::{Index, List, linked};
///
/// #[derive(Debug)]
/// struct Node {
///     value: u64,
///     next: usize,
///     prev: usize,
/// }
///
/// linked!(Node, usize);
///
/// fn node(value: u64) -> Node {
///     Node { value, next: usize::NONE, prev: usize::NONE }
/// }
///
/// let mut storage = vec![node(1), node(2), node(3)];
/// let mut list: List<usize> = List::new();
///
/// list.push_back(&mut storage, 0);
/// list.push_back(&mut storage, 1);
/// list.push_back(&mut storage, 2);
/// assert_eq!(list.len(&storage), 3);
///
/// // Remove from middle - O(1)
/// list.pop_current(&mut storage, 1);
/// let values: Vec<_> = list.iter(&storage).map(|n| n.value).collect();
/// assert_eq!(values, [1, 3]);
/// ```
#[derive(Debug)]
pub struct List<Idx: Index> {
    front: Idx,
    back: Idx,
}

impl<Idx: Index> Default for List<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> List<Idx> {
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            front: Idx::NONE,
            back: Idx::NONE,
        }
    }

    /// Builds a list by pushing each key at the back, in order.
    ///
    /// # Panics
    ///
    /// Panics if a key is not valid in storage.
    pub fn from_keys<T, S, I>(storage: &mut S, keys: I) -> Self
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
        I: IntoIterator<Item = Idx>,
    {
        let mut list = Self::new();
        for key in keys {
            list.push_back(storage, key);
        }
        list
    }

    /// Returns the front node's index, or `None` if empty.
    #[inline]
    pub fn front(&self) -> Option<Idx> {
        self.front.into_option()
    }

    /// Returns the back node's index, or `None` if empty.
    #[inline]
    pub fn back(&self) -> Option<Idx> {
        self.back.into_option()
    }

    /// Returns `true` if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.front.is_none()
    }

    /// Counts the nodes by walking from the front. O(n).
    pub fn len<T, S>(&self, storage: &S) -> usize
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        self.keys(storage).count()
    }

    /// Exchanges the contents of two lists. O(1); no node is touched.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    // ========================================================================
    // Link operations
    // ========================================================================

    /// Links `item` at the front.
    ///
    /// `item` must not be linked into any list.
    ///
    /// # Panics
    ///
    /// Panics if `item` is not valid in storage.
    #[inline]
    pub fn push_front<T, S>(&mut self, storage: &mut S, item: Idx)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        self.debug_assert_unlinked(storage, item);
        {
            let node = node_mut(storage, item);
            node.set_next(self.front);
            node.set_prev(Idx::NONE);
        }

        if self.front.is_some() {
            node_mut(storage, self.front).set_prev(item);
        } else {
            self.back = item;
        }

        self.front = item;
    }

    /// Links `item` at the back.
    ///
    /// `item` must not be linked into any list.
    ///
    /// # Panics
    ///
    /// Panics if `item` is not valid in storage.
    #[inline]
    pub fn push_back<T, S>(&mut self, storage: &mut S, item: Idx)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        self.debug_assert_unlinked(storage, item);
        {
            let node = node_mut(storage, item);
            node.set_prev(self.back);
            node.set_next(Idx::NONE);
        }

        if self.back.is_some() {
            node_mut(storage, self.back).set_next(item);
        } else {
            self.front = item;
        }

        self.back = item;
    }

    /// Links `item` immediately after `base`.
    ///
    /// `base` must be a member of this list; `item` must not be linked.
    ///
    /// # Panics
    ///
    /// Panics if `base` or `item` is not valid in storage.
    #[inline]
    pub fn push_next<T, S>(&mut self, storage: &mut S, base: Idx, item: Idx)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        self.debug_assert_unlinked(storage, item);
        let next = node(storage, base).next();

        {
            let node = node_mut(storage, item);
            node.set_prev(base);
            node.set_next(next);
        }

        node_mut(storage, base).set_next(item);

        if next.is_some() {
            node_mut(storage, next).set_prev(item);
        } else {
            debug_assert!(self.back == base, "base is not a member of this list");
            self.back = item;
        }
    }

    /// Links `item` immediately before `base`.
    ///
    /// `base` must be a member of this list; `item` must not be linked.
    ///
    /// # Panics
    ///
    /// Panics if `base` or `item` is not valid in storage.
    #[inline]
    pub fn push_prev<T, S>(&mut self, storage: &mut S, base: Idx, item: Idx)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        self.debug_assert_unlinked(storage, item);
        let prev = node(storage, base).prev();

        {
            let node = node_mut(storage, item);
            node.set_next(base);
            node.set_prev(prev);
        }

        node_mut(storage, base).set_prev(item);

        if prev.is_some() {
            node_mut(storage, prev).set_next(item);
        } else {
            debug_assert!(self.front == base, "base is not a member of this list");
            self.front = item;
        }
    }

    // ========================================================================
    // Unlink operations
    // ========================================================================

    /// Unlinks and returns the front node, or `None` if empty.
    ///
    /// The node stays in storage with its links cleared.
    #[inline]
    pub fn pop_front<T, S>(&mut self, storage: &mut S) -> Option<Idx>
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if self.front.is_none() {
            return None;
        }
        let idx = self.front;
        Some(self.pop_current(storage, idx))
    }

    /// Unlinks and returns the back node, or `None` if empty.
    ///
    /// The node stays in storage with its links cleared.
    #[inline]
    pub fn pop_back<T, S>(&mut self, storage: &mut S) -> Option<Idx>
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if self.back.is_none() {
            return None;
        }
        let idx = self.back;
        Some(self.pop_current(storage, idx))
    }

    /// Unlinks `base` and splices its neighbours together. O(1).
    ///
    /// `base` must be a member of this list. Returns `base` with its links
    /// cleared.
    ///
    /// # Panics
    ///
    /// Panics if `base` is not valid in storage.
    #[inline]
    pub fn pop_current<T, S>(&mut self, storage: &mut S, base: Idx) -> Idx
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let (prev, next) = {
            let node = node(storage, base);
            (node.prev(), node.next())
        };

        if prev.is_some() {
            let prev_node = node_mut(storage, prev);
            debug_assert!(prev_node.next() == base, "predecessor does not link to base");
            prev_node.set_next(next);
        } else {
            debug_assert!(self.front == base, "base is not a member of this list");
            self.front = next;
        }

        if next.is_some() {
            let next_node = node_mut(storage, next);
            debug_assert!(next_node.prev() == base, "successor does not link back to base");
            next_node.set_prev(prev);
        } else {
            debug_assert!(self.back == base, "base is not a member of this list");
            self.back = prev;
        }

        let node = node_mut(storage, base);
        node.set_prev(Idx::NONE);
        node.set_next(Idx::NONE);

        base
    }

    /// Unlinks and returns the node after `base`, or `None` if `base` is the
    /// back.
    #[inline]
    pub fn pop_next<T, S>(&mut self, storage: &mut S, base: Idx) -> Option<Idx>
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let next = node(storage, base).next();
        if next.is_none() {
            return None;
        }
        Some(self.pop_current(storage, next))
    }

    /// Unlinks and returns the node before `base`, or `None` if `base` is the
    /// front.
    #[inline]
    pub fn pop_prev<T, S>(&mut self, storage: &mut S, base: Idx) -> Option<Idx>
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let prev = node(storage, base).prev();
        if prev.is_none() {
            return None;
        }
        Some(self.pop_current(storage, prev))
    }

    /// Unlinks every node, clearing their links. O(n).
    ///
    /// Nodes remain in storage.
    pub fn clear<T, S>(&mut self, storage: &mut S)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let mut bound = WalkBound::new(storage.len());
        let mut idx = self.front;
        while idx.is_some() {
            bound.step();
            let node = node_mut(storage, idx);
            let next = node.next();
            node.set_prev(Idx::NONE);
            node.set_next(Idx::NONE);
            idx = next;
        }

        self.front = Idx::NONE;
        self.back = Idx::NONE;
    }

    // ========================================================================
    // Whole-list operations
    // ========================================================================

    /// Reverses the list in place. O(n).
    pub fn reverse<T, S>(&mut self, storage: &mut S)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let mut bound = WalkBound::new(storage.len());
        let mut idx = self.front;
        while idx.is_some() {
            bound.step();
            let node = node_mut(storage, idx);
            let next = node.next();
            let prev = node.prev();
            node.set_next(prev);
            node.set_prev(next);
            idx = next;
        }

        mem::swap(&mut self.front, &mut self.back);
        debug_assert!(
            self.check_links(storage).is_ok(),
            "list links are inconsistent after reverse"
        );
    }

    /// Returns `true` if `idx` is linked into this list. O(n).
    pub fn contains<T, S>(&self, storage: &S, idx: Idx) -> bool
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        idx.is_some() && self.keys(storage).any(|key| key == idx)
    }

    /// Validates the list structure and returns its node count.
    ///
    /// Checks that front and back agree on emptiness, that every `prev`
    /// link mirrors the forward walk, that the walk ends on `back`, and that
    /// it terminates within `storage.len()` steps.
    pub fn check_links<T, S>(&self, storage: &S) -> Result<usize, LinkError>
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if self.front.is_none() != self.back.is_none() {
            return Err(LinkError::EndsMismatch);
        }

        let limit = storage.len();
        let mut prev = Idx::NONE;
        let mut idx = self.front;
        let mut count = 0;

        while idx.is_some() {
            if count >= limit {
                return Err(LinkError::Cycle { limit });
            }

            let node = storage
                .get(idx)
                .ok_or(LinkError::MissingNode { position: count })?;
            if node.prev() != prev {
                return Err(LinkError::BrokenBackLink { position: count });
            }

            prev = idx;
            idx = node.next();
            count += 1;
        }

        if prev != self.back {
            return Err(LinkError::BackUnreachable { position: count });
        }

        Ok(count)
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Iterates over node references, front to back.
    #[inline]
    pub fn iter<'a, T, S>(&self, storage: &'a S) -> Iter<'a, T, S>
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        Iter::new(storage, self.front, self.back)
    }

    /// Calls `f` with exclusive access to each node, front to back.
    ///
    /// The successor is read before `f` runs, so `f` may change the node's
    /// links without affecting which node is visited next.
    ///
    /// # Example
    ///
    /// ```
    /// use stratum_collections::{Index, List, linked};
    ///
    /// struct Level { qty: u64, next: usize, prev: usize }
    /// linked!(Level, usize);
    ///
    /// let mut levels: Vec<Level> = (1..=3)
    ///     .map(|qty| Level { qty, next: usize::NONE, prev: usize::NONE })
    ///     .collect();
    /// let list = List::from_keys(&mut levels, [0, 1, 2]);
    ///
    /// list.for_each_mut(&mut levels, |l| l.qty *= 10);
    /// let qty: Vec<_> = list.iter(&levels).map(|l| l.qty).collect();
    /// assert_eq!(qty, [10, 20, 30]);
    /// ```
    pub fn for_each_mut<T, S, F>(&self, storage: &mut S, mut f: F)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
        F: FnMut(&mut T),
    {
        let mut bound = WalkBound::new(storage.len());
        let mut idx = self.front;
        while idx.is_some() {
            bound.step();
            let node = node_mut(storage, idx);
            idx = node.next();
            f(node);
        }
    }

    /// Like [`for_each_mut`](List::for_each_mut), back to front.
    pub fn for_each_mut_rev<T, S, F>(&self, storage: &mut S, mut f: F)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
        F: FnMut(&mut T),
    {
        let mut bound = WalkBound::new(storage.len());
        let mut idx = self.back;
        while idx.is_some() {
            bound.step();
            let node = node_mut(storage, idx);
            idx = node.prev();
            f(node);
        }
    }

    /// Iterates over node indices, front to back.
    #[inline]
    pub fn keys<'a, T, S>(&self, storage: &'a S) -> Keys<'a, T, S>
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        Keys::new(storage, self.front, self.back)
    }

    /// Sole members of other lists pass; see the module docs.
    #[inline]
    fn debug_assert_unlinked<T, S>(&self, storage: &S, item: Idx)
    where
        T: Linked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if cfg!(debug_assertions) {
            let node = node(storage, item);
            assert!(
                node.next().is_none() && node.prev().is_none() && self.front != item,
                "node is already linked"
            );
        }
    }
}

#[inline]
fn node<T, S: Storage<T>>(storage: &S, idx: S::Index) -> &T {
    storage.get(idx).expect("invalid index")
}

#[inline]
fn node_mut<T, S: Storage<T>>(storage: &mut S, idx: S::Index) -> &mut T {
    storage.get_mut(idx).expect("invalid index")
}
