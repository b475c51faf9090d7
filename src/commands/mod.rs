//! CLI command implementations for bamchunk.
//!
//! # Commands
//!
//! - [`chunk`] - Split an indexed BAM into balanced genomic intervals
//! - [`stats`] - Print the per-reference index counts the planner uses

#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod chunk;
pub mod command;
pub mod common;
pub mod stats;
