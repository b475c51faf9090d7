//! Output intervals and their tab-separated text layouts.
//!
//! Two literal layouts are in use and downstream tools parse both:
//!
//! ```text
//! chr21   0       46709983        1843            <- whole reference
//! chr1    0       1215324         <empty> 50000   <- partition chunk
//! ```
//!
//! A whole-reference interval is `name, 0, length, count`. Every interval produced by a
//! partition scan (full or trailing) carries an extra empty field before the count.

use std::fmt;

/// How an interval was produced, which also decides its text layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalKind {
    /// The reference fits in one chunk and was emitted without scanning.
    Whole,
    /// The interval was cut from a record scan of the reference.
    Partition,
}

/// A coordinate range on one reference sequence tagged with its mapped-record count.
///
/// Coordinates are 0-based. For partition intervals the record whose position closes a
/// window is counted in that window and its position also opens the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    /// Name of the reference sequence.
    pub reference_name: String,
    /// Start of the interval.
    pub start: u64,
    /// End of the interval.
    pub end: u64,
    /// Number of mapped records counted in the interval.
    pub record_count: u64,
    /// True for the trailing interval holding the leftover records of a scan.
    pub is_partial: bool,
    /// Whole-reference fast path or partition scan.
    pub kind: IntervalKind,
}

impl Interval {
    /// An interval covering an entire reference that was not scanned.
    #[must_use]
    pub fn whole(reference_name: impl Into<String>, length: u64, record_count: u64) -> Self {
        Self {
            reference_name: reference_name.into(),
            start: 0,
            end: length,
            record_count,
            is_partial: false,
            kind: IntervalKind::Whole,
        }
    }

    /// An interval cut from a partition scan.
    #[must_use]
    pub fn partition(
        reference_name: impl Into<String>,
        start: u64,
        end: u64,
        record_count: u64,
        is_partial: bool,
    ) -> Self {
        Self {
            reference_name: reference_name.into(),
            start,
            end,
            record_count,
            is_partial,
            kind: IntervalKind::Partition,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // TODO: settle on one layout once downstream parsers accept the extra column everywhere.
        match self.kind {
            IntervalKind::Whole => write!(
                f,
                "{}\t{}\t{}\t{}",
                self.reference_name, self.start, self.end, self.record_count
            ),
            IntervalKind::Partition => write!(
                f,
                "{}\t{}\t{}\t\t{}",
                self.reference_name, self.start, self.end, self.record_count
            ),
        }
    }
}
