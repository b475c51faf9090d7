//! Single-pass chunking of one reference sequence.
//!
//! [`ReferenceChunker`] is the per-reference state machine:
//!
//! ```text
//! Streaming --(end of records)--> Flushing --(trailing interval, if any)--> Done
//! ```
//!
//! While streaming, every mapped record bumps a counter. When the counter reaches the
//! target an interval `[window_start, position)` is emitted, the counter resets, and the
//! next window starts at that same position. Unmapped records are skipped entirely. At the
//! end of the stream any leftover records become one trailing partial interval that ends at
//! the last counted record's position, not at the reference length.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::errors::{BamChunkError, Result};
use crate::interval::Interval;
use crate::progress::ProgressTracker;
use crate::source::{AlignedRecord, IndexedRecordSource, ReferenceSequence};

/// Records scanned locally before the shared progress counter is updated.
const PROGRESS_BATCH: u64 = 10_000;

/// Shared stop signal checked before every record read.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests every scan sharing this flag to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Lifecycle of a [`ReferenceChunker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkerState {
    Streaming,
    Flushing,
    Done,
}

/// Running state for chunking one reference.
#[derive(Debug)]
pub struct ReferenceChunker {
    reference_name: String,
    target: u64,
    count: u64,
    window_start: u64,
    last_position: Option<u64>,
    state: ChunkerState,
}

impl ReferenceChunker {
    /// Starts a chunker that cuts an interval every `target` mapped records.
    #[must_use]
    pub fn new(reference: &ReferenceSequence, target: u64) -> Self {
        Self {
            reference_name: reference.name.clone(),
            target,
            count: 0,
            window_start: 0,
            last_position: None,
            state: ChunkerState::Streaming,
        }
    }

    #[must_use]
    pub fn state(&self) -> ChunkerState {
        self.state
    }

    /// Mapped records counted since the last emitted interval.
    #[must_use]
    pub fn pending(&self) -> u64 {
        self.count
    }

    /// Feeds one record, returning an interval if it completes a window.
    ///
    /// Records fed after [`finish`](Self::finish) are ignored.
    pub fn push(&mut self, record: AlignedRecord) -> Option<Interval> {
        if self.state != ChunkerState::Streaming || record.is_unmapped {
            return None;
        }
        let position = record.position?;

        self.count += 1;
        self.last_position = Some(position);

        if self.count == self.target {
            let interval = Interval::partition(
                self.reference_name.as_str(),
                self.window_start,
                position,
                self.count,
                false,
            );
            self.count = 0;
            self.window_start = position;
            Some(interval)
        } else {
            None
        }
    }

    /// Ends the stream, returning the trailing partial interval if records are left over.
    pub fn finish(&mut self) -> Option<Interval> {
        if self.state != ChunkerState::Streaming {
            return None;
        }
        self.state = ChunkerState::Flushing;

        let trailing = match self.last_position {
            Some(end) if self.count > 0 => Some(Interval::partition(
                self.reference_name.as_str(),
                self.window_start,
                end,
                self.count,
                true,
            )),
            _ => None,
        };

        self.count = 0;
        self.state = ChunkerState::Done;
        trailing
    }
}

/// The single interval for a reference that fits in one chunk.
#[must_use]
pub fn whole_interval(reference: &ReferenceSequence, mapped: u64) -> Interval {
    Interval::whole(reference.name.as_str(), reference.length, mapped)
}

/// How a scan ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every record was read and all intervals were emitted.
    Completed { records: u64, intervals: u64 },
    /// The cancellation flag was raised before the scan finished.
    Cancelled,
    /// The consumer stopped accepting intervals.
    Disconnected,
}

/// Scans one reference from `source`, passing each interval to `emit` as soon as it is cut.
///
/// `emit` returns `false` once nobody is listening, which ends the scan early.
///
/// # Errors
///
/// Returns [`BamChunkError::StreamReadError`] if the index query or any record read fails.
/// Intervals emitted before the failure stay emitted.
pub fn scan_reference<S, F>(
    source: &mut S,
    reference: &ReferenceSequence,
    target: u64,
    cancel: &CancellationFlag,
    progress: &ProgressTracker,
    mut emit: F,
) -> Result<ScanOutcome>
where
    S: IndexedRecordSource + ?Sized,
    F: FnMut(Interval) -> bool,
{
    let read_error = |error| BamChunkError::StreamReadError {
        reference_id: reference.id,
        reference_name: reference.name.clone(),
        source: error,
    };

    let mut chunker = ReferenceChunker::new(reference, target);
    let mut records = source.records_in(reference).map_err(read_error)?;
    let mut scanned: u64 = 0;
    let mut unreported: u64 = 0;
    let mut intervals: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            progress.log_if_needed(unreported);
            debug!("Scan of {} cancelled after {} records", reference.name, scanned);
            return Ok(ScanOutcome::Cancelled);
        }

        let Some(result) = records.next() else { break };
        let record = result.map_err(read_error)?;
        scanned += 1;
        unreported += 1;
        if unreported == PROGRESS_BATCH {
            progress.log_if_needed(unreported);
            unreported = 0;
        }

        if let Some(interval) = chunker.push(record) {
            intervals += 1;
            if !emit(interval) {
                return Ok(ScanOutcome::Disconnected);
            }
        }
    }

    progress.log_if_needed(unreported);

    if let Some(interval) = chunker.finish() {
        intervals += 1;
        if !emit(interval) {
            return Ok(ScanOutcome::Disconnected);
        }
    }

    debug!("Finished {}: {} records in {} intervals", reference.name, scanned, intervals);
    Ok(ScanOutcome::Completed { records: scanned, intervals })
}
