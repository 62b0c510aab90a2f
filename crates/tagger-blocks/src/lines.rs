//! Inclusive line spans

use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive, 1-based `{start, end}` line span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Lines {
    pub start: usize,
    pub end: usize,
}

impl Lines {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start >= 1 && start <= end, "invalid span {start}-{end}");
        Self { start, end }
    }

    /// Number of lines covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// A span always covers at least one line.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }

    pub fn contains_span(&self, other: &Lines) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &Lines) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Zero-based index range into a line vector.
    pub(crate) fn indices(&self) -> std::ops::RangeInclusive<usize> {
        (self.start - 1)..=(self.end - 1)
    }
}

impl fmt::Display for Lines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_is_inclusive() {
        assert_eq!(Lines::new(3, 13).len(), 11);
        assert_eq!(Lines::new(5, 5).len(), 1);
    }

    #[test]
    fn overlap_and_containment() {
        let a = Lines::new(2, 5);
        let b = Lines::new(6, 15);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Lines::new(5, 9)));
        assert!(Lines::new(1, 31).contains_span(&b));
        assert!(!b.contains_span(&Lines::new(14, 16)));
        assert!(b.contains(6) && b.contains(15) && !b.contains(16));
    }

    #[test]
    fn indices_are_zero_based() {
        assert_eq!(Lines::new(3, 4).indices(), 2..=3);
    }

    #[test]
    fn display_uses_dash() {
        assert_eq!(Lines::new(21, 31).to_string(), "21-31");
    }
}
