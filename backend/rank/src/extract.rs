//! # Extraction Policies
//!
//! Two cardinality policies over the same max-oriented [`Heap`].
//!
//! - [`take_top`]: a fixed number of maxima
//! - [`take_tied`]: every element tied with the overall maximum, however many there are

use crate::heap::{Compare, Heap};

/// Extracts `min(count, heap.len())` elements, top first.
pub fn take_top<T, C: Compare<T>>(heap: &mut Heap<T, C>, count: usize) -> Vec<T> {
    let mut taken = Vec::with_capacity(count.min(heap.len()));

    while taken.len() < count {
        let Some(item) = heap.extract_top() else {
            break;
        };
        taken.push(item);
    }

    taken
}

/// Extracts elements while their score equals the score of the first one.
///
/// Elements after the tie group stay in the heap.
pub fn take_tied<T, C, S, F>(heap: &mut Heap<T, C>, score: F) -> Vec<T>
where
    C: Compare<T>,
    S: PartialEq,
    F: Fn(&T) -> S,
{
    let Some(first) = heap.extract_top() else {
        return Vec::new();
    };

    let best = score(&first);
    let mut tied = vec![first];

    while heap.peek().is_some_and(|next| score(next) == best) {
        if let Some(item) = heap.extract_top() {
            tied.push(item);
        }
    }

    tied
}
