//! Indexed record sources.
//!
//! The chunking core sees a BAM file only through [`IndexedRecordSource`]: the header's
//! reference sequences, the index statistics, and a position-ordered record stream for one
//! reference at a time. [`BamSource`] implements it with noodles. Every concurrent scan opens
//! its own handle through a [`SourceFactory`] so no read cursor is shared between threads.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use noodles::bam::{self, bai};
use noodles::bgzf;
use noodles::core::Region;
use noodles::sam;

use crate::errors::{BamChunkError, Result};
use crate::index_stats::{IndexStats, locate_index, read_index};

/// A named sequence from the BAM header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSequence {
    /// Ordinal id (position in the header).
    pub id: usize,
    /// Reference name, e.g. `chr1`.
    pub name: String,
    /// Length in bases.
    pub length: u64,
}

impl ReferenceSequence {
    #[must_use]
    pub fn new(id: usize, name: impl Into<String>, length: u64) -> Self {
        Self { id, name: name.into(), length }
    }
}

/// The two record properties chunking looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedRecord {
    /// Set when the unmapped flag (0x4) is set.
    pub is_unmapped: bool,
    /// 0-based alignment start, if any.
    pub position: Option<u64>,
}

impl AlignedRecord {
    /// A mapped record starting at a 0-based position.
    #[must_use]
    pub fn mapped(position: u64) -> Self {
        Self { is_unmapped: false, position: Some(position) }
    }

    /// An unmapped record placed at a 0-based position (e.g. the mate of a mapped read).
    #[must_use]
    pub fn unmapped(position: u64) -> Self {
        Self { is_unmapped: true, position: Some(position) }
    }
}

impl TryFrom<&bam::Record> for AlignedRecord {
    type Error = io::Error;

    fn try_from(record: &bam::Record) -> io::Result<Self> {
        let is_unmapped = record.flags().is_unmapped();
        let position =
            record.alignment_start().transpose()?.map(|start| (usize::from(start) - 1) as u64);
        Ok(Self { is_unmapped, position })
    }
}

/// Boxed stream of records for one reference.
pub type RecordIter<'a> = Box<dyn Iterator<Item = io::Result<AlignedRecord>> + 'a>;

/// Read-only access to an indexed alignment file.
pub trait IndexedRecordSource {
    /// Reference sequences in header order.
    fn reference_sequences(&self) -> &[ReferenceSequence];

    /// Per-reference record counts from the index.
    ///
    /// # Errors
    ///
    /// Fails if the index statistics cannot be decoded.
    fn index_stats(&self) -> Result<IndexStats>;

    /// Records placed on `reference`, ordered by start position.
    ///
    /// Calling this again restarts from the beginning of the reference.
    ///
    /// # Errors
    ///
    /// Fails if the index query cannot be set up.
    fn records_in(&mut self, reference: &ReferenceSequence) -> io::Result<RecordIter<'_>>;
}

/// Opens independent handles onto the same source, one per concurrent scan.
pub trait SourceFactory: Send + Sync + 'static {
    type Source: IndexedRecordSource;

    /// Opens a fresh handle.
    ///
    /// # Errors
    ///
    /// Fails if the underlying file cannot be opened.
    fn open(&self) -> Result<Self::Source>;
}

/// A BAM file read through its BAI index.
pub struct BamSource {
    reader: bam::io::Reader<bgzf::Reader<File>>,
    header: sam::Header,
    index: Arc<bai::Index>,
    path: PathBuf,
    index_path: PathBuf,
    references: Vec<ReferenceSequence>,
}

impl BamSource {
    /// Opens a BAM file, locating and decoding its index.
    ///
    /// # Errors
    ///
    /// Returns [`BamChunkError::IndexUnavailable`] or [`BamChunkError::IndexCorrupt`] for index
    /// problems, and [`BamChunkError::InvalidFileFormat`] if the BAM header is unreadable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let index_path = locate_index(path)?;
        let index = read_index(&index_path)?;
        Self::open_with_index(path, &index_path, Arc::new(index))
    }

    /// Opens a BAM file with an already decoded index.
    ///
    /// # Errors
    ///
    /// Returns [`BamChunkError::InvalidFileFormat`] if the BAM header is unreadable.
    pub fn open_with_index(path: &Path, index_path: &Path, index: Arc<bai::Index>) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = bam::io::Reader::new(file);

        let header = reader.read_header().map_err(|e| BamChunkError::InvalidFileFormat {
            file_type: "BAM".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let references = header
            .reference_sequences()
            .iter()
            .enumerate()
            .map(|(id, (name, map))| ReferenceSequence::new(id, name.to_string(), map.length().get() as u64))
            .collect();

        Ok(Self {
            reader,
            header,
            index,
            path: path.to_path_buf(),
            index_path: index_path.to_path_buf(),
            references,
        })
    }

    /// Path of the BAI index in use.
    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// A factory that reopens this BAM, sharing the decoded index.
    #[must_use]
    pub fn factory(&self) -> BamSourceFactory {
        BamSourceFactory {
            path: self.path.clone(),
            index_path: self.index_path.clone(),
            index: Arc::clone(&self.index),
        }
    }
}

impl IndexedRecordSource for BamSource {
    fn reference_sequences(&self) -> &[ReferenceSequence] {
        &self.references
    }

    fn index_stats(&self) -> Result<IndexStats> {
        IndexStats::from_bai(&self.index_path, &self.index, self.references.len())
    }

    fn records_in(&mut self, reference: &ReferenceSequence) -> io::Result<RecordIter<'_>> {
        let region = Region::new(reference.name.as_str(), ..);
        debug!("Querying {region}");

        let query = self.reader.query(&self.header, self.index.as_ref(), &region)?;
        let records =
            query.map(|result| result.and_then(|record| AlignedRecord::try_from(&record)));

        Ok(Box::new(records))
    }
}

/// Reopens a BAM file for each producer, sharing one decoded index.
#[derive(Clone)]
pub struct BamSourceFactory {
    path: PathBuf,
    index_path: PathBuf,
    index: Arc<bai::Index>,
}

impl SourceFactory for BamSourceFactory {
    type Source = BamSource;

    fn open(&self) -> Result<BamSource> {
        BamSource::open_with_index(&self.path, &self.index_path, Arc::clone(&self.index))
    }
}
