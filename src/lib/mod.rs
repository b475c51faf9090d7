#![deny(unsafe_code)]
// Clippy lint configuration for CI
// These lints are allowed because:
// - cast_*: record counts and positions move between u64/usize/f64 for planning and logging
// - missing_*_doc: Documentation improvements tracked separately
// - needless_pass_by_value: Some APIs designed for ownership transfer
// - module_name_repetitions: chunker::ChunkerState and friends read better qualified
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]

//! # bamchunk - Parallel BAM Chunking Library
//!
//! This library splits a coordinate-sorted, indexed BAM file into genomic intervals that each
//! hold roughly the same number of mapped records, so that downstream tools can process the
//! intervals in parallel.
//!
//! ## Overview
//!
//! ### Core Functionality
//!
//! - **[`index_stats`]** - Per-reference mapped/unmapped counts read from the BAI index
//! - **[`planner`]** - Target records per chunk and whole-vs-partition decisions
//! - **[`chunker`]** - Single-pass interval cutting for one reference
//! - **[`merger`]** - Concurrent per-reference scans merged into one stream
//!
//! ### Utilities
//!
//! - **[`source`]** - The record-source abstraction and its noodles BAM implementation
//! - **[`interval`]** - The emitted interval type and its text layout
//! - **[`validation`]** - Input validation utilities
//! - **[`progress`]** - Progress tracking and logging
//! - **[`logging`]** - Formatting helpers and run summaries
//! - **[`metrics`]** - Counts gathered over a chunking run
//!
//! ## Quick Start
//!
//! ```no_run
//! use bamchunk_lib::merger::start;
//! use bamchunk_lib::source::BamSource;
//!
//! # fn main() -> anyhow::Result<()> {
//! let source = BamSource::open("input.bam")?;
//! let (_plan, intervals) = start(&source, source.factory(), 100)?;
//!
//! for interval in intervals {
//!     println!("{}", interval?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## How Chunks Are Cut
//!
//! With `T` mapped records in the index and `N` requested chunks, the target is
//! `P = floor(T / N)`. A reference holding fewer than `floor(1.2 * P)` mapped records is
//! emitted as one whole-reference interval without reading any records. Every other
//! reference is scanned on its own thread, cutting an interval each time `P` mapped records
//! have been seen. Unmapped records never count.
//!
//! ## See Also
//!
//! - [noodles](https://github.com/zaeleus/noodles) - Rust bioinformatics I/O

pub mod chunker;
pub mod errors;
pub mod index_stats;
pub mod interval;
pub mod logging;
pub mod merger;
pub mod metrics;
pub mod planner;
pub mod progress;
pub mod source;
#[doc(hidden)]
pub mod testutil;
pub mod validation;

pub use errors::{BamChunkError, Result};
pub use interval::{Interval, IntervalKind};
