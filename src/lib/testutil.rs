//! In-memory record sources for tests.
//!
//! [`InMemorySource`] serves fixed, position-ordered record lists per reference and derives
//! its index statistics from them. Per-reference read delays, injected read failures and injected
//! panics make it possible to exercise concurrent merging without BAM files.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::errors::Result;
use crate::index_stats::{IndexStats, ReferenceCounts};
use crate::source::{AlignedRecord, IndexedRecordSource, RecordIter, ReferenceSequence, SourceFactory};

#[derive(Debug, Default)]
struct SourceData {
    references: Vec<ReferenceSequence>,
    records: Vec<Vec<AlignedRecord>>,
    delays: HashMap<String, Duration>,
    failures: HashMap<String, usize>,
    panics: HashSet<String>,
}

/// Builds an [`InMemorySource`].
#[derive(Debug, Default)]
pub struct InMemorySourceBuilder {
    data: SourceData,
}

impl InMemorySourceBuilder {
    /// Adds a reference with its records in position order.
    #[must_use]
    pub fn reference(
        mut self,
        name: impl Into<String>,
        length: u64,
        records: Vec<AlignedRecord>,
    ) -> Self {
        let id = self.data.references.len();
        self.data.references.push(ReferenceSequence::new(id, name, length));
        self.data.records.push(records);
        self
    }

    /// Sleeps for `delay` before yielding each record of `name`.
    #[must_use]
    pub fn delay(mut self, name: impl Into<String>, delay: Duration) -> Self {
        self.data.delays.insert(name.into(), delay);
        self
    }

    /// Fails the record stream of `name` after `records` records.
    #[must_use]
    pub fn fail_after(mut self, name: impl Into<String>, records: usize) -> Self {
        self.data.failures.insert(name.into(), records);
        self
    }

    /// Panics when the records of `name` are requested.
    #[must_use]
    pub fn panic_on(mut self, name: impl Into<String>) -> Self {
        self.data.panics.insert(name.into());
        self
    }

    #[must_use]
    pub fn build(self) -> InMemorySource {
        InMemorySource { data: Arc::new(self.data) }
    }
}

/// A record source backed by vectors.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    data: Arc<SourceData>,
}

impl InMemorySource {
    #[must_use]
    pub fn builder() -> InMemorySourceBuilder {
        InMemorySourceBuilder::default()
    }

    /// A factory handing out clones of this source and counting how often it is used.
    #[must_use]
    pub fn factory(&self) -> InMemoryFactory {
        InMemoryFactory { source: self.clone(), opened: Arc::new(AtomicUsize::new(0)) }
    }
}

impl IndexedRecordSource for InMemorySource {
    fn reference_sequences(&self) -> &[ReferenceSequence] {
        &self.data.references
    }

    fn index_stats(&self) -> Result<IndexStats> {
        let entries = self
            .data
            .records
            .iter()
            .map(|records| {
                if records.is_empty() {
                    return None;
                }
                let unmapped = records.iter().filter(|r| r.is_unmapped).count() as u64;
                Some(ReferenceCounts { mapped: records.len() as u64 - unmapped, unmapped })
            })
            .collect();
        Ok(IndexStats::from_counts(entries))
    }

    fn records_in(&mut self, reference: &ReferenceSequence) -> io::Result<RecordIter<'_>> {
        assert!(!self.data.panics.contains(&reference.name), "injected panic for {}", reference.name);
        let records = self
            .data
            .records
            .get(reference.id)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, reference.name.clone()))?;
        let delay = self.data.delays.get(&reference.name).copied();
        let fail_after = self.data.failures.get(&reference.name).copied();

        let iter = records.iter().enumerate().map_while(move |(i, record)| {
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
            match fail_after {
                Some(n) if i > n => None,
                Some(n) if i == n => Some(Err(io::Error::other("injected read failure"))),
                _ => Some(Ok(*record)),
            }
        });
        Ok(Box::new(iter))
    }
}

/// Hands out [`InMemorySource`] handles.
#[derive(Debug, Clone)]
pub struct InMemoryFactory {
    source: InMemorySource,
    opened: Arc<AtomicUsize>,
}

impl InMemoryFactory {
    /// Number of handles opened so far.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl SourceFactory for InMemoryFactory {
    type Source = InMemorySource;

    fn open(&self) -> Result<InMemorySource> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(self.source.clone())
    }
}
