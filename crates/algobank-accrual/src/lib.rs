//! Interest accrual for AlgoBank.
//!
//! Each logical index is a day. A rate change or bonus that applies to a
//! range of days is a single [`SegmentTree::range_add`]; the accumulated
//! delta for one day is a [`SegmentTree::point_query`]. Both are O(log n).

pub mod error;
pub mod tree;

pub use error::{AccrualError, AccrualResult};
pub use tree::SegmentTree;
