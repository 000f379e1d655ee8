//! # Bounded Top-K
//!
//! Keeps the `K` strongest elements of a stream in `O(n log K)`.
//!
//! Survivors sit in a **min**-oriented [`Heap`] so the root is always the weakest
//! retained element and eviction only touches the root.

use std::cmp::Ordering;

use crate::heap::{Compare, Heap, Reversed};

/// Upper bound on the survivors allocated up front, larger `K` grows on demand.
const PREALLOCATE_LIMIT: usize = 1024;

#[derive(Debug, Clone)]
pub struct TopK<T, C> {
    capacity: usize,
    survivors: Heap<T, Reversed<C>>,
}

impl<T, C: Compare<T>> TopK<T, C> {
    pub fn new(capacity: usize, comparator: C) -> Self {
        Self {
            capacity,
            survivors: Heap::with_capacity(capacity.min(PREALLOCATE_LIMIT), Reversed(comparator)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.survivors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.survivors.is_empty()
    }

    /// Weakest retained element.
    pub fn threshold(&self) -> Option<&T> {
        self.survivors.peek()
    }

    /// Returns `true` when the element was retained.
    pub fn insert(&mut self, item: T) -> bool {
        if self.survivors.len() < self.capacity {
            self.survivors.insert(item);
            return true;
        }

        let Some(weakest) = self.survivors.peek() else {
            return false;
        };

        // strictly stronger only, equal elements keep the incumbent
        if self.rank(&item, weakest) != Ordering::Greater {
            return false;
        }

        self.survivors.extract_top();
        self.survivors.insert(item);
        true
    }

    /// Survivors, strongest first.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut ranked = self.survivors.as_unordered_slice().to_vec();
        ranked.sort_by(|a, b| self.rank(b, a));
        ranked
    }

    pub fn into_sorted_vec(self) -> Vec<T> {
        let mut ranked = self.survivors.into_sorted_vec();
        ranked.reverse();
        ranked
    }

    fn rank(&self, a: &T, b: &T) -> Ordering {
        self.survivors.comparator().0.compare(a, b)
    }
}

impl<T, C: Compare<T>> Extend<T> for TopK<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}
