//! Iterators over a [`List`](crate::List).
//!
//! Both walk front to back and are double-ended: `.rev()` walks back to
//! front. A front and a back cursor advance toward each other and the
//! iterator ends once they meet, so mixing `next` and `next_back` visits
//! every node exactly once.
//!
//! There is no mutable iterator. Links are plain node fields, so a yielded
//! `&mut T` could rewrite them and steer the walk back onto a node already
//! handed out. Use [`List::for_each_mut`](crate::List::for_each_mut), which
//! lends one node at a time.

use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::{Index, Linked, Storage};

/// Step budget for a list walk.
///
/// A well-formed list visits each node once, so a walk longer than
/// `storage.len()` steps has run into a cycle. Checked in debug builds only.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WalkBound {
    remaining: usize,
}

impl WalkBound {
    #[inline]
    pub(crate) fn new(limit: usize) -> Self {
        Self { remaining: limit }
    }

    #[inline]
    pub(crate) fn step(&mut self) {
        if cfg!(debug_assertions) {
            assert!(
                self.remaining > 0,
                "list walk exceeds storage length: links form a cycle"
            );
            self.remaining -= 1;
        }
    }
}

/// Iterator over references to list nodes.
pub struct Iter<'a, T, S: Storage<T>> {
    storage: &'a S,
    front: S::Index,
    back: S::Index,
    bound: WalkBound,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, S: Storage<T>> Iter<'a, T, S> {
    pub(crate) fn new(storage: &'a S, front: S::Index, back: S::Index) -> Self {
        Self {
            storage,
            front,
            back,
            bound: WalkBound::new(storage.len()),
            _marker: PhantomData,
        }
    }
}

impl<'a, T: 'a, S> Iterator for Iter<'a, T, S>
where
    T: Linked<S::Index>,
    S: Storage<T>,
{
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front.is_none() {
            return None;
        }
        self.bound.step();

        let node = self.storage.get(self.front).expect("invalid index");

        // Met in the middle
        if self.front == self.back {
            self.front = <S::Index>::NONE;
            self.back = <S::Index>::NONE;
        } else {
            self.front = node.next();
        }

        Some(node)
    }
}

impl<'a, T: 'a, S> DoubleEndedIterator for Iter<'a, T, S>
where
    T: Linked<S::Index>,
    S: Storage<T>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back.is_none() {
            return None;
        }
        self.bound.step();

        let node = self.storage.get(self.back).expect("invalid index");

        if self.front == self.back {
            self.front = <S::Index>::NONE;
            self.back = <S::Index>::NONE;
        } else {
            self.back = node.prev();
        }

        Some(node)
    }
}

impl<'a, T: 'a, S> FusedIterator for Iter<'a, T, S>
where
    T: Linked<S::Index>,
    S: Storage<T>,
{
}

/// Iterator over the indices of list nodes.
pub struct Keys<'a, T, S: Storage<T>> {
    storage: &'a S,
    front: S::Index,
    back: S::Index,
    bound: WalkBound,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, S: Storage<T>> Keys<'a, T, S> {
    pub(crate) fn new(storage: &'a S, front: S::Index, back: S::Index) -> Self {
        Self {
            storage,
            front,
            back,
            bound: WalkBound::new(storage.len()),
            _marker: PhantomData,
        }
    }
}

impl<'a, T: 'a, S> Iterator for Keys<'a, T, S>
where
    T: Linked<S::Index>,
    S: Storage<T>,
{
    type Item = S::Index;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front.is_none() {
            return None;
        }
        self.bound.step();

        let key = self.front;
        let node = self.storage.get(key).expect("invalid index");

        if self.front == self.back {
            self.front = <S::Index>::NONE;
            self.back = <S::Index>::NONE;
        } else {
            self.front = node.next();
        }

        Some(key)
    }
}

impl<'a, T: 'a, S> DoubleEndedIterator for Keys<'a, T, S>
where
    T: Linked<S::Index>,
    S: Storage<T>,
{
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back.is_none() {
            return None;
        }
        self.bound.step();

        let key = self.back;
        let node = self.storage.get(key).expect("invalid index");

        if self.front == self.back {
            self.front = <S::Index>::NONE;
            self.back = <S::Index>::NONE;
        } else {
            self.back = node.prev();
        }

        Some(key)
    }
}

impl<'a, T: 'a, S> FusedIterator for Keys<'a, T, S>
where
    T: Linked<S::Index>,
    S: Storage<T>,
{
}
