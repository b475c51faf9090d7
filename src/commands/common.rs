//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use bamchunk_lib::validation::{validate_file_exists, validate_output_parent};

/// The indexed BAM a command reads.
#[derive(Debug, Clone, Args)]
pub struct InputBamOptions {
    /// Coordinate-sorted input BAM (index expected at <BAM>.bai or <stem>.bai)
    #[arg(value_name = "BAM")]
    pub input: PathBuf,
}

impl InputBamOptions {
    /// Validates that the input file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the input file does not exist.
    pub fn validate(&self) -> Result<()> {
        validate_file_exists(&self.input, "Input BAM")?;
        Ok(())
    }
}

/// Where tab-separated text output goes.
#[derive(Debug, Clone, Default, Args)]
pub struct TextOutputOptions {
    /// Output file (defaults to stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

impl TextOutputOptions {
    /// Validates that the output directory exists, when an output file is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory of the output file is missing.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.output {
            validate_output_parent(path, "Output")?;
        }
        Ok(())
    }

    /// Opens a buffered writer on the output file or stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the output file cannot be created.
    pub fn open_writer(&self) -> Result<Box<dyn Write>> {
        match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                Ok(Box::new(BufWriter::new(file)))
            }
            None => Ok(Box::new(BufWriter::new(std::io::stdout().lock()))),
        }
    }

    /// Human-readable output destination for logging.
    #[must_use]
    pub fn describe(&self) -> String {
        self.output.as_ref().map_or_else(|| "stdout".to_string(), |p| p.display().to_string())
    }
}
