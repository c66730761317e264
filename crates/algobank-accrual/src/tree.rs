use std::ops::AddAssign;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AccrualError, AccrualResult};

/// Range-add / point-query segment tree.
///
/// The backing array has `2 * capacity` slots where `capacity` is the next
/// power of two `>= len`. Slot 1 is the root and slot `capacity + i` is the
/// leaf for day `i`. A range update stores its delta on the O(log n) nodes
/// that exactly cover the range, walking bottom-up; a point query sums the
/// deltas on the leaf-to-root path. Nothing is ever pushed down.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentTree<T> {
    len: usize,
    capacity: usize,
    lazy: Vec<T>,
}

impl<T> SegmentTree<T>
where
    T: Copy + Default + AddAssign,
{
    /// Create a counter over days `0..len`, every value starting at zero.
    pub fn new(len: usize) -> Self {
        let capacity = len.next_power_of_two();
        Self {
            len,
            capacity,
            lazy: vec![T::default(); 2 * capacity],
        }
    }

    /// Size of the logical domain.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the domain is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of leaves in the backing array (a power of two).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add `delta` to every day in the inclusive range `[first, last]`.
    pub fn range_add(&mut self, first: usize, last: usize, delta: T) -> AccrualResult<()> {
        self.check(first)?;
        self.check(last)?;
        if first > last {
            return Err(AccrualError::EmptyRange { first, last });
        }

        let mut l = first + self.capacity;
        let mut r = last + self.capacity;
        while l <= r {
            if l % 2 == 1 {
                self.lazy[l] += delta;
                l += 1;
            }
            if r % 2 == 0 {
                self.lazy[r] += delta;
                r -= 1;
            }
            l /= 2;
            r /= 2;
        }

        debug!(first, last, "accrual range updated");
        Ok(())
    }

    /// Accumulated value for day `index`.
    pub fn point_query(&self, index: usize) -> AccrualResult<T> {
        self.check(index)?;
        Ok(self.accumulated(index))
    }

    /// Accumulated value of every day, in day order.
    pub fn values(&self) -> Vec<T> {
        (0..self.len).map(|day| self.accumulated(day)).collect()
    }

    /// Sum of all days' values.
    pub fn total(&self) -> T {
        let mut sum = T::default();
        for v in self.values() {
            sum += v;
        }
        sum
    }

    fn accumulated(&self, index: usize) -> T {
        let mut i = index + self.capacity;
        let mut total = T::default();
        while i > 0 {
            total += self.lazy[i];
            i /= 2;
        }
        total
    }

    fn check(&self, index: usize) -> AccrualResult<()> {
        if index >= self.len {
            return Err(AccrualError::OutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }
}
