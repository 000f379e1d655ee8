//! # Heap
//!
//! Array-backed binary heap ordered by a [`Compare`] implementation.
//!
//! The root is always the element that compares **greatest**. A min-heap is the
//! same structure built with [`Reversed`] around the comparator.
//!
//! ## Layout
//! - Children of index `i` live at `2i + 1` and `2i + 2`
//! - Parent of index `i` lives at `(i - 1) / 2`
//! - Only the root is ordered relative to everything else, the rest of the array is not ranked

use std::cmp::Ordering;

pub trait Compare<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Uses the element's own [`Ord`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Natural;

impl<T: Ord> Compare<T> for Natural {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Inverts the wrapped comparator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reversed<C>(pub C);

impl<T, C: Compare<T>> Compare<T> for Reversed<C> {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}

/// Adapts a closure or `fn` item.
#[derive(Debug, Clone, Copy)]
pub struct By<F>(pub F);

impl<T, F> Compare<T> for By<F>
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.0)(a, b)
    }
}

#[derive(Debug, Clone)]
pub struct Heap<T, C> {
    items: Vec<T>,
    comparator: C,
}

impl<T: Ord> Heap<T, Natural> {
    pub fn max() -> Self {
        Self::new(Natural)
    }
}

impl<T: Ord> Heap<T, Reversed<Natural>> {
    pub fn min() -> Self {
        Self::new(Reversed(Natural))
    }
}

impl<T, C: Compare<T>> Heap<T, C> {
    pub fn new(comparator: C) -> Self {
        Self {
            items: Vec::new(),
            comparator,
        }
    }

    pub fn with_capacity(capacity: usize, comparator: C) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            comparator,
        }
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn insert(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Backing array in heap order, not rank order.
    pub(crate) fn as_unordered_slice(&self) -> &[T] {
        &self.items
    }

    pub fn extract_top(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }

        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let top = self.items.pop();

        if !self.items.is_empty() {
            self.sift_down(0);
        }

        top
    }

    /// Drains the heap top first.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.items.len());
        while let Some(item) = self.extract_top() {
            sorted.push(item);
        }

        sorted
    }

    fn outranks(&self, a: usize, b: usize) -> bool {
        self.comparator.compare(&self.items[a], &self.items[b]) == Ordering::Greater
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.outranks(index, parent) {
                break;
            }

            self.items.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.items.len();

        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut best = index;

            if left < len && self.outranks(left, best) {
                best = left;
            }
            if right < len && self.outranks(right, best) {
                best = right;
            }
            if best == index {
                break;
            }

            self.items.swap(index, best);
            index = best;
        }
    }
}

impl<T, C: Compare<T>> Extend<T> for Heap<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}
