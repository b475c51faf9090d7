//! Report the per-reference record counts the chunk planner works from.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use bamchunk_lib::index_stats::IndexStats;
use bamchunk_lib::logging::format_count;
use bamchunk_lib::source::{BamSource, IndexedRecordSource, ReferenceSequence};

use crate::commands::command::Command;
use crate::commands::common::{InputBamOptions, TextOutputOptions};

/// Print mapped and unmapped counts per reference, read from the BAI only.
#[derive(Debug, Parser)]
#[command(
    name = "stats",
    about = "\x1b[38;5;166m[UTILITIES]\x1b[0m      \x1b[36mPrint per-reference counts from the BAM index\x1b[0m",
    long_about = r#"
Print per-reference record counts taken from the BAI index, without reading any records.

Output is one line per reference in header order, tab-separated:
  name  length  mapped  unmapped

When the index records unmapped reads with no reference, a final line `*  0  0  count` is
written for them.

Example usage:
  bamchunk stats sample.bam
"#
)]
pub struct Stats {
    /// Input BAM options
    #[command(flatten)]
    pub input: InputBamOptions,

    /// Output options
    #[command(flatten)]
    pub output: TextOutputOptions,
}

impl Command for Stats {
    fn execute(&self, command_line: &str) -> Result<()> {
        debug!("Command line: {command_line}");
        self.input.validate()?;
        self.output.validate()?;

        let source = BamSource::open(&self.input.input)
            .with_context(|| format!("Failed to open {}", self.input.input.display()))?;
        let stats = source.index_stats()?;

        let mut writer = self.output.open_writer()?;
        write_stats(source.reference_sequences(), &stats, &mut writer)?;
        writer.flush().context("Failed to flush output")?;

        info!(
            "{} references, {} mapped records",
            source.reference_sequences().len(),
            format_count(stats.total_mapped())
        );
        Ok(())
    }
}

fn write_stats<W: Write + ?Sized>(
    references: &[ReferenceSequence],
    stats: &IndexStats,
    writer: &mut W,
) -> Result<()> {
    for reference in references {
        let counts = stats.counts(reference.id).unwrap_or_default();
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            reference.name, reference.length, counts.mapped, counts.unmapped
        )?;
    }
    if let Some(unplaced) = stats.unplaced_unmapped() {
        writeln!(writer, "*\t0\t0\t{unplaced}")?;
    }
    Ok(())
}
