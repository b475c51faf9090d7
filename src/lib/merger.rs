//! Fan-in of concurrently produced per-reference interval streams.
//!
//! Every partitioned reference is scanned on its own thread with its own source handle.
//! All producers write into one bounded channel; each finishes by sending either `Done` or
//! `Failed`. The consumer side, [`ChunkStream`], is the only place that tracks which
//! producers are still active, and it ends exactly when that set is empty.
//!
//! ```text
//!  chr1 scan ──┐
//!  chr2 scan ──┼──> bounded channel ──> ChunkStream ──> caller
//!  chrX scan ──┘         ^
//!  whole refs ───────────┘ (queued up front, no thread)
//! ```
//!
//! Output is unordered across references and position-ordered within one reference.
//! The first producer failure is yielded as a terminal `Err`; intervals already yielded are
//! not retracted, and every other producer is cancelled.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, info};

use crate::chunker::{CancellationFlag, ScanOutcome, scan_reference, whole_interval};
use crate::errors::{BamChunkError, Result};
use crate::interval::Interval;
use crate::planner::{ChunkPlan, Plan, plan};
use crate::progress::ProgressTracker;
use crate::source::{IndexedRecordSource, ReferenceSequence, SourceFactory};

/// Intervals buffered between producers and the consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Messages sent from a producer thread to the stream.
#[derive(Debug)]
enum ProducerEvent {
    Interval(Interval),
    Done { reference_id: usize },
    Failed { reference_id: usize, error: BamChunkError },
}

/// Launches one producer per partitioned reference and merges their output.
pub struct FanInMerger<F: SourceFactory> {
    factory: Arc<F>,
    channel_capacity: usize,
    progress: Arc<ProgressTracker>,
}

impl<F: SourceFactory> FanInMerger<F> {
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            progress: Arc::new(ProgressTracker::new("Scanned records")),
        }
    }

    /// Sets the bounded channel capacity (minimum 1).
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Shares a progress tracker with every producer.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    /// Starts producers for `plan` and returns the merged stream.
    ///
    /// Whole references are queued immediately. Partition references each get a thread.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a producer thread cannot be spawned; producers that were
    /// already started are cancelled and joined.
    pub fn merge(&self, plan: &Plan) -> Result<ChunkStream> {
        let (tx, rx) = bounded(self.channel_capacity);
        let mut stream = ChunkStream {
            pending: VecDeque::new(),
            receiver: Some(rx),
            active: BTreeMap::new(),
            handles: Vec::new(),
            cancel: CancellationFlag::new(),
            failed: false,
        };

        for entry in &plan.references {
            match entry.plan {
                ChunkPlan::Whole { mapped } => {
                    stream.pending.push_back(whole_interval(&entry.reference, mapped));
                }
                ChunkPlan::Partition { target, mapped } => {
                    info!(
                        "Chunking {}: {} reads into {} / chunk",
                        entry.reference.name, mapped, target
                    );
                    let handle = self.spawn_producer(&entry.reference, target, &tx, &stream.cancel)?;
                    stream.active.insert(entry.reference.id, entry.reference.name.clone());
                    stream.handles.push(handle);
                }
            }
        }

        debug!(
            "Merging {} whole intervals and {} producers",
            stream.pending.len(),
            stream.active.len()
        );
        Ok(stream)
    }

    fn spawn_producer(
        &self,
        reference: &ReferenceSequence,
        target: u64,
        tx: &Sender<ProducerEvent>,
        cancel: &CancellationFlag,
    ) -> Result<JoinHandle<()>> {
        let factory = Arc::clone(&self.factory);
        let progress = Arc::clone(&self.progress);
        let reference = reference.clone();
        let tx = tx.clone();
        let cancel = cancel.clone();

        let handle = thread::Builder::new()
            .name(format!("chunk-{}", reference.name))
            .spawn(move || produce(factory.as_ref(), &reference, target, &tx, &cancel, &progress))?;
        Ok(handle)
    }
}

/// Body of one producer thread.
fn produce<F: SourceFactory>(
    factory: &F,
    reference: &ReferenceSequence,
    target: u64,
    tx: &Sender<ProducerEvent>,
    cancel: &CancellationFlag,
    progress: &ProgressTracker,
) {
    let result = factory
        .open()
        .map_err(|error| match error {
            BamChunkError::Io(source) => BamChunkError::StreamReadError {
                reference_id: reference.id,
                reference_name: reference.name.clone(),
                source,
            },
            other => other,
        })
        .and_then(|mut source| {
            scan_reference(&mut source, reference, target, cancel, progress, |interval| {
                tx.send(ProducerEvent::Interval(interval)).is_ok()
            })
        });

    let event = match result {
        Ok(outcome) => {
            if let ScanOutcome::Completed { records, intervals } = outcome {
                debug!("{}: {} records scanned, {} intervals", reference.name, records, intervals);
            }
            ProducerEvent::Done { reference_id: reference.id }
        }
        Err(error) => ProducerEvent::Failed { reference_id: reference.id, error },
    };

    // The stream may already be gone; nothing is waiting for this event then.
    let _ = tx.send(event);
}

/// The merged sequence of intervals from every producer.
///
/// Yields `Ok(interval)` values in arrival order. Ends once every producer has reported
/// completion. If a producer fails, its error is yielded once and the stream then ends.
/// Dropping the stream cancels and joins all producers.
#[derive(Debug)]
pub struct ChunkStream {
    pending: VecDeque<Interval>,
    receiver: Option<Receiver<ProducerEvent>>,
    active: BTreeMap<usize, String>,
    handles: Vec<JoinHandle<()>>,
    cancel: CancellationFlag,
    failed: bool,
}

impl ChunkStream {
    /// Producers that have not yet reported completion.
    #[must_use]
    pub fn active_producers(&self) -> usize {
        self.active.len()
    }

    /// Whole-reference intervals not yet yielded.
    #[must_use]
    pub fn pending_intervals(&self) -> usize {
        self.pending.len()
    }

    fn fail(&mut self, error: BamChunkError) -> BamChunkError {
        self.failed = true;
        self.active.clear();
        self.shutdown();
        error
    }

    /// Cancels producers, closes the channel, and joins every thread.
    fn shutdown(&mut self) {
        self.cancel.cancel();
        // Dropping the receiver first unblocks producers waiting on a full channel.
        drop(self.receiver.take());
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Iterator for ChunkStream {
    type Item = Result<Interval>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(interval) = self.pending.pop_front() {
            return Some(Ok(interval));
        }
        if self.failed {
            return None;
        }

        while !self.active.is_empty() {
            let event = self.receiver.as_ref()?.recv();
            match event {
                Ok(ProducerEvent::Interval(interval)) => return Some(Ok(interval)),
                Ok(ProducerEvent::Done { reference_id }) => {
                    if let Some(name) = self.active.remove(&reference_id) {
                        debug!("{name} complete, {} producers still active", self.active.len());
                    }
                }
                Ok(ProducerEvent::Failed { reference_id, error }) => {
                    self.active.remove(&reference_id);
                    return Some(Err(self.fail(error)));
                }
                Err(_) => {
                    let reference_name = self.active.values().next().cloned().unwrap_or_default();
                    return Some(Err(self.fail(BamChunkError::ProducerLost { reference_name })));
                }
            }
        }

        if !self.handles.is_empty() || self.receiver.is_some() {
            self.shutdown();
        }
        None
    }
}

impl Drop for ChunkStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs the pre-flight steps and starts the merge for a source.
///
/// Index statistics are loaded and the plan is built first. No producer is started unless
/// both succeed.
///
/// # Errors
///
/// Returns [`BamChunkError::InvalidChunkCount`] for `chunks == 0`, index errors from
/// [`IndexedRecordSource::index_stats`], or an I/O error if a thread cannot be spawned.
pub fn start<S, F>(source: &S, factory: F, chunks: usize) -> Result<(Plan, ChunkStream)>
where
    S: IndexedRecordSource + ?Sized,
    F: SourceFactory,
{
    let stats = source.index_stats()?;
    let plan = plan(source.reference_sequences(), &stats, chunks)?;
    let stream = FanInMerger::new(factory).merge(&plan)?;
    Ok((plan, stream))
}
