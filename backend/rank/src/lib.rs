//! # Rank
//!
//! Selection primitives behind every ranked view.
//!
//! - [`Heap`]: binary heap over a [`Compare`], max or min depending on the comparator
//! - [`TopK`]: bounded selector keeping the `K` strongest elements of a stream
//! - [`take_top`] / [`take_tied`]: fixed-count and tie-complete extraction from a heap
//!
//! Nothing here knows about users or posts. Callers pick the comparator, and with
//! it the tie-break key.

pub mod extract;
pub mod heap;
pub mod top_k;

pub use extract::{take_tied, take_top};
pub use heap::{By, Compare, Heap, Natural, Reversed};
pub use top_k::TopK;
