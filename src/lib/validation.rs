//! Input validation utilities
//!
//! Checks run on command-line parameters before any file is opened, so that bad input
//! fails fast with a structured error from [`crate::errors`].

use crate::errors::{BamChunkError, Result};
use std::path::Path;

/// Validate that a file exists
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Input BAM")
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use bamchunk_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/file.bam", "Input BAM");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(BamChunkError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that the directory an output file will be written into exists
///
/// A bare file name (no parent component) refers to the working directory and always passes.
///
/// # Errors
/// Returns an error if the parent directory is missing
pub fn validate_output_parent<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    match path_ref.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(BamChunkError::InvalidFileFormat {
                file_type: description.to_string(),
                path: path_ref.display().to_string(),
                reason: format!("Directory '{}' does not exist", parent.display()),
            })
        }
        _ => Ok(()),
    }
}
