//! Custom error types for bamchunk operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for bamchunk operations
pub type Result<T> = std::result::Result<T, BamChunkError>;

/// Error type for bamchunk operations
#[derive(Error, Debug)]
pub enum BamChunkError {
    /// No BAI index could be found next to the BAM file
    #[error("No index found for '{}' (tried: {})", path.display(), format_candidates(tried))]
    IndexUnavailable {
        /// The BAM file that was expected to be indexed
        path: PathBuf,
        /// Every index location that was checked
        tried: Vec<PathBuf>,
    },

    /// The index exists but its statistics could not be decoded
    #[error("Index '{}' could not be decoded: {reason}", path.display())]
    IndexCorrupt {
        /// Path to the index file
        path: PathBuf,
        /// Explanation of the problem
        reason: String,
    },

    /// The requested number of chunks is not usable
    #[error("Invalid chunk count: {value} (must be >= 1)")]
    InvalidChunkCount {
        /// The rejected chunk count
        value: usize,
    },

    /// Reading records for one reference failed part way through the scan
    #[error("Failed reading records for reference '{reference_name}' (id {reference_id}): {source}")]
    StreamReadError {
        /// Ordinal id of the reference being scanned
        reference_id: usize,
        /// Name of the reference being scanned
        reference_name: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A producer went away without reporting completion
    #[error("Chunk producer for reference '{reference_name}' exited without signaling completion")]
    ProducerLost {
        /// Name of a reference whose producer was still active
        reference_name: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "BAM", "BAI")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// I/O error outside of a per-reference scan (opening files, reading headers)
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn format_candidates(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}
