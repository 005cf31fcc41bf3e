//! The contiguous slice of a linear index space owned by one rank.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A contiguous, inclusive index range `[start, end]`.
///
/// An empty partition is one whose `end` lies before `start` (`end == start - 1`).
/// It means "owns zero elements" and is a normal outcome whenever a group has
/// more ranks than there are elements to share; it is never an error.
/// `end` is exposed as `i64` so the empty partition at index 0 (`end == -1`) is
/// representable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    start: u32,
    len: u32,
}

impl Partition {
    pub fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// The empty partition positioned at `start`.
    pub fn empty_at(start: u32) -> Self {
        Self { start, len: 0 }
    }

    /// First owned index (inclusive).
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last owned index (inclusive). Equals `start - 1` when empty.
    pub fn end(&self) -> i64 {
        self.start as i64 + self.len as i64 - 1
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The owned indices as a half-open range, convenient for slicing.
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.start as usize + self.len as usize
    }

    pub fn contains(&self, index: u32) -> bool {
        self.range().contains(&(index as usize))
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end())
    }
}
