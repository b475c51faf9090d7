//! Per-reference record counts taken from BAI metadata.
//!
//! A BAI index stores a metadata pseudo-bin for every reference that has records, holding
//! the number of mapped and unmapped records placed on it. These counts let the planner
//! size chunks without touching the record stream.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;
use noodles::bam::bai;
use noodles::csi::BinningIndex as _;
use noodles::csi::binning_index::ReferenceSequence as _;

use crate::errors::{BamChunkError, Result};

/// Record counts for one reference sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceCounts {
    /// Mapped records placed on the reference.
    pub mapped: u64,
    /// Unmapped records placed on the reference (typically mates of mapped reads).
    pub unmapped: u64,
}

/// Index statistics for a whole BAM file.
///
/// Entries are keyed by reference id. A reference whose index entry has no metadata holds
/// `None` and is treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    entries: Vec<Option<ReferenceCounts>>,
    total_mapped: u64,
    unplaced_unmapped: Option<u64>,
}

impl IndexStats {
    /// Builds statistics from per-reference counts, one element per reference id.
    #[must_use]
    pub fn from_counts(entries: Vec<Option<ReferenceCounts>>) -> Self {
        let total_mapped = entries.iter().flatten().map(|c| c.mapped).sum();
        Self { entries, total_mapped, unplaced_unmapped: None }
    }

    /// Sets the count of unmapped records with no reference.
    #[must_use]
    pub fn with_unplaced_unmapped(mut self, count: Option<u64>) -> Self {
        self.unplaced_unmapped = count;
        self
    }

    /// Extracts statistics from a decoded BAI index.
    ///
    /// # Errors
    ///
    /// Returns [`BamChunkError::IndexCorrupt`] if the index does not describe exactly
    /// `reference_count` references.
    pub fn from_bai(index_path: &Path, index: &bai::Index, reference_count: usize) -> Result<Self> {
        let reference_sequences = index.reference_sequences();

        if reference_sequences.len() != reference_count {
            return Err(BamChunkError::IndexCorrupt {
                path: index_path.to_path_buf(),
                reason: format!(
                    "index describes {} references but the BAM header has {}",
                    reference_sequences.len(),
                    reference_count
                ),
            });
        }

        let entries = reference_sequences
            .iter()
            .map(|reference_sequence| {
                reference_sequence.metadata().map(|metadata| ReferenceCounts {
                    mapped: metadata.mapped_record_count(),
                    unmapped: metadata.unmapped_record_count(),
                })
            })
            .collect();

        Ok(Self::from_counts(entries).with_unplaced_unmapped(index.unplaced_unmapped_record_count()))
    }

    /// Counts for a reference, or `None` if the index holds no metadata for it.
    #[must_use]
    pub fn counts(&self, reference_id: usize) -> Option<ReferenceCounts> {
        self.entries.get(reference_id).copied().flatten()
    }

    /// Mapped record count for a reference (zero when absent).
    #[must_use]
    pub fn mapped(&self, reference_id: usize) -> u64 {
        self.counts(reference_id).map_or(0, |c| c.mapped)
    }

    /// Sum of mapped counts over all references.
    #[must_use]
    pub fn total_mapped(&self) -> u64 {
        self.total_mapped
    }

    /// Unmapped records with no reference, when the index records it.
    #[must_use]
    pub fn unplaced_unmapped(&self) -> Option<u64> {
        self.unplaced_unmapped
    }

    /// `(reference_id, mapped)` for every reference with at least one mapped record.
    pub fn mapped_references(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(id, counts)| counts.map(|c| (id, c.mapped)))
            .filter(|&(_, mapped)| mapped > 0)
    }
}

/// Index file locations checked for a BAM, in order.
///
/// `sample.bam` is looked up as `sample.bam.bai` first and then `sample.bai`.
#[must_use]
pub fn index_candidates(bam_path: &Path) -> Vec<PathBuf> {
    let mut appended = bam_path.as_os_str().to_owned();
    appended.push(".bai");
    let mut candidates = vec![PathBuf::from(appended)];

    if bam_path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("bam")) {
        candidates.push(bam_path.with_extension("bai"));
    }

    candidates
}

/// Finds the BAI index for a BAM file.
///
/// # Errors
///
/// Returns [`BamChunkError::IndexUnavailable`] if none of the candidate paths exist.
pub fn locate_index(bam_path: &Path) -> Result<PathBuf> {
    let tried = index_candidates(bam_path);

    match tried.iter().find(|p| p.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(BamChunkError::IndexUnavailable { path: bam_path.to_path_buf(), tried }),
    }
}

/// Reads and decodes a BAI index.
///
/// # Errors
///
/// Returns [`BamChunkError::IndexCorrupt`] if the file cannot be decoded as BAI.
pub fn read_index(index_path: &Path) -> Result<bai::Index> {
    let file = File::open(index_path)?;
    let mut reader = bai::io::Reader::new(file);

    let index = reader.read_index().map_err(|e| BamChunkError::IndexCorrupt {
        path: index_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!("Read index {}", index_path.display());
    Ok(index)
}
