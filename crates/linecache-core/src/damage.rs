//! Row damage tracking.
//!
//! Applying a delta reports which visual rows must be redrawn as a
//! `DamageList`: an ordered set of half-open `[start, end)` row ranges,
//! coalesced as it is built. Renderers walk the list and repaint exactly
//! those rows, nothing else.
//!
//! ## Design
//!
//! The list never sorts or merges after the fact. Delta application only
//! ever marks ranges in non-decreasing start order, so coalescing reduces
//! to one check against the last range. Callers that mark out of order get
//! a well-defined but uncoalesced list; monotonic insertion is a caller
//! obligation, not something this type repairs.

use std::fmt;

/// A half-open range of row indices, `start <= row < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRange {
    /// First damaged row.
    pub start: usize,
    /// One past the last damaged row.
    pub end: usize,
}

impl DamageRange {
    /// Number of rows covered by this range.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the range covers no rows.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns true if `row` falls inside this range.
    #[must_use]
    #[inline]
    pub const fn contains(&self, row: usize) -> bool {
        self.start <= row && row < self.end
    }
}

impl fmt::Display for DamageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Ordered, coalesced set of damaged row ranges.
///
/// # Example
///
/// ```rust
/// use linecache_core::damage::DamageList;
///
/// let mut damage = DamageList::new();
/// damage.mark_range(5, 10);
/// damage.mark_range(10, 12); // abuts, merges into [5, 12)
/// damage.mark_range(20, 22);
/// assert_eq!(damage.ranges().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageList {
    ranges: Vec<DamageRange>,
}

impl DamageList {
    /// Create an empty damage list.
    #[must_use]
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Mark rows `[start, end)` as damaged.
    ///
    /// Merges with the previous range when `start` abuts its end. Empty
    /// ranges are ignored.
    pub fn mark_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        if let Some(last) = self.ranges.last_mut() {
            if last.end == start {
                last.end = end;
                return;
            }
        }
        self.ranges.push(DamageRange { start, end });
    }

    /// Mark `n` rows starting at `start` as damaged.
    #[inline]
    pub fn mark_span(&mut self, start: usize, n: usize) {
        self.mark_range(start, start + n);
    }

    /// The damaged ranges, in insertion order.
    #[must_use]
    #[inline]
    pub fn ranges(&self) -> &[DamageRange] {
        &self.ranges
    }

    /// Returns true if no rows are damaged.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of damaged rows across all ranges.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.ranges.iter().map(DamageRange::len).sum()
    }

    /// Returns true if `row` is covered by any range.
    #[must_use]
    pub fn covers(&self, row: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(row))
    }

    /// Iterate over every damaged row index.
    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|r| r.start..r.end)
    }
}

impl fmt::Display for DamageList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for range in &self.ranges {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{range}")?;
            first = false;
        }
        Ok(())
    }
}
