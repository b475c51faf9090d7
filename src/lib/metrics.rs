//! Summary counts for one chunking run.

use crate::interval::{Interval, IntervalKind};
use crate::planner::Plan;

/// Counts gathered while consuming the merged interval stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkingMetrics {
    /// Total mapped records according to the index.
    pub total_mapped: u64,
    /// Target records per chunk.
    pub records_per_chunk: u64,
    /// References with at least one mapped record.
    pub references: usize,
    /// References emitted whole.
    pub whole_references: usize,
    /// References that were scanned.
    pub partitioned_references: usize,
    /// Intervals written.
    pub intervals: u64,
    /// Trailing partial intervals written.
    pub partial_intervals: u64,
    /// Sum of record counts over written intervals.
    pub records_in_intervals: u64,
    /// Smallest record count of a non-partial interval.
    pub min_interval_records: Option<u64>,
    /// Largest record count of any interval.
    pub max_interval_records: Option<u64>,
}

impl ChunkingMetrics {
    /// Starts metrics from a plan.
    #[must_use]
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            total_mapped: plan.total_mapped,
            records_per_chunk: plan.records_per_chunk,
            references: plan.references.len(),
            whole_references: plan.whole().count(),
            partitioned_references: plan.partitioned().count(),
            ..Self::default()
        }
    }

    /// Adds one emitted interval.
    pub fn record(&mut self, interval: &Interval) {
        self.intervals += 1;
        self.records_in_intervals += interval.record_count;
        if interval.is_partial {
            self.partial_intervals += 1;
        } else if interval.kind == IntervalKind::Partition {
            self.min_interval_records = Some(
                self.min_interval_records.map_or(interval.record_count, |m| m.min(interval.record_count)),
            );
        }
        self.max_interval_records = Some(
            self.max_interval_records.map_or(interval.record_count, |m| m.max(interval.record_count)),
        );
    }

    /// True once every mapped record from the index landed in some interval.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.records_in_intervals == self.total_mapped
    }
}
