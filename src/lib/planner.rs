//! Per-reference chunking decisions.
//!
//! The planner turns index statistics and a requested chunk count into a records-per-chunk
//! target `P = floor(total_mapped / chunks)` and one decision per reference:
//!
//! - references with `M < floor(1.2 * P)` mapped records are emitted whole, without a scan;
//! - everything else is partitioned into chunks of `P` records.
//!
//! References with no mapped records get no decision at all.

use log::{info, warn};

use crate::errors::{BamChunkError, Result};
use crate::index_stats::IndexStats;
use crate::source::ReferenceSequence;

/// Default approximate number of chunks.
pub const DEFAULT_CHUNK_COUNT: usize = 1000;

/// How one reference is chunked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPlan {
    /// Emit the reference as a single interval covering its full length.
    Whole { mapped: u64 },
    /// Scan the reference and cut an interval every `target` mapped records.
    Partition { target: u64, mapped: u64 },
}

impl ChunkPlan {
    /// Mapped record count the decision was made from.
    #[must_use]
    pub fn mapped(&self) -> u64 {
        match *self {
            ChunkPlan::Whole { mapped } | ChunkPlan::Partition { mapped, .. } => mapped,
        }
    }
}

/// A reference together with its decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePlan {
    pub reference: ReferenceSequence,
    pub plan: ChunkPlan,
}

/// Decisions for every reference with mapped records, in header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Target records per chunk (`P`).
    pub records_per_chunk: u64,
    /// Total mapped records over all references (`T`).
    pub total_mapped: u64,
    /// One entry per reference with at least one mapped record.
    pub references: Vec<ReferencePlan>,
}

impl Plan {
    /// References emitted whole.
    pub fn whole(&self) -> impl Iterator<Item = &ReferencePlan> {
        self.references.iter().filter(|r| matches!(r.plan, ChunkPlan::Whole { .. }))
    }

    /// References that need a scan.
    pub fn partitioned(&self) -> impl Iterator<Item = &ReferencePlan> {
        self.references.iter().filter(|r| matches!(r.plan, ChunkPlan::Partition { .. }))
    }
}

/// Computes `floor(total_mapped / chunks)`.
///
/// # Errors
///
/// Returns [`BamChunkError::InvalidChunkCount`] when `chunks` is zero.
pub fn records_per_chunk(total_mapped: u64, chunks: usize) -> Result<u64> {
    if chunks == 0 {
        return Err(BamChunkError::InvalidChunkCount { value: chunks });
    }
    Ok(total_mapped / chunks as u64)
}

/// `floor(1.2 * target)`, computed without floating point and saturating at `u64::MAX`.
#[must_use]
pub fn whole_threshold(target: u64) -> u64 {
    u64::try_from(u128::from(target) * 6 / 5).unwrap_or(u64::MAX)
}

/// Classifies a reference with `mapped` records against a per-chunk `target`.
#[must_use]
pub fn classify(mapped: u64, target: u64) -> ChunkPlan {
    if mapped < whole_threshold(target) {
        ChunkPlan::Whole { mapped }
    } else {
        ChunkPlan::Partition { target, mapped }
    }
}

/// Builds the plan for a whole file.
///
/// # Errors
///
/// Returns [`BamChunkError::InvalidChunkCount`] when `chunks` is zero.
pub fn plan(references: &[ReferenceSequence], stats: &IndexStats, chunks: usize) -> Result<Plan> {
    let total_mapped = stats.total_mapped();
    let target = records_per_chunk(total_mapped, chunks)?;

    if target == 0 && total_mapped > 0 {
        warn!(
            "Fewer mapped records ({total_mapped}) than requested chunks ({chunks}); \
             each reference will be emitted as a single chunk"
        );
    }

    let references: Vec<ReferencePlan> = stats
        .mapped_references()
        .filter_map(|(id, mapped)| {
            let reference = references.get(id)?;
            Some(ReferencePlan { reference: reference.clone(), plan: classify(mapped, target) })
        })
        .collect();

    let plan = Plan { records_per_chunk: target, total_mapped, references };
    info!(
        "Planned {} mapped records at {} per chunk: {} whole, {} partitioned references",
        total_mapped,
        target,
        plan.whole().count(),
        plan.partitioned().count()
    );

    Ok(plan)
}
