//! Split an indexed BAM into intervals of roughly equal mapped-record count.
//!
//! Reads per-reference counts from the BAI, plans a records-per-chunk target, then scans every
//! large reference concurrently and writes intervals as soon as they are cut.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use bamchunk_lib::errors::BamChunkError;
use bamchunk_lib::interval::Interval;
use bamchunk_lib::logging::{OperationTimer, format_count, log_chunking_summary};
use bamchunk_lib::merger::{DEFAULT_CHANNEL_CAPACITY, FanInMerger};
use bamchunk_lib::metrics::ChunkingMetrics;
use bamchunk_lib::planner::{DEFAULT_CHUNK_COUNT, plan};
use bamchunk_lib::progress::ProgressTracker;
use bamchunk_lib::source::{BamSource, IndexedRecordSource};

use crate::commands::command::Command;
use crate::commands::common::{InputBamOptions, TextOutputOptions};

/// Split an indexed BAM into genomic intervals for parallel processing.
#[derive(Debug, Parser)]
#[command(
    name = "chunk",
    about = "\x1b[38;5;72m[CHUNKING]\x1b[0m       \x1b[36mSplit an indexed BAM into balanced intervals\x1b[0m",
    long_about = r#"
Split a coordinate-sorted, indexed BAM into genomic intervals holding roughly equal numbers
of mapped records.

The target records per chunk is floor(total mapped / --chunks), using counts from the BAI.
References with fewer than floor(1.2 * target) mapped records are written as one interval
covering the whole reference. Larger references are scanned concurrently, one thread each,
and cut every `target` mapped records. Unmapped records are never counted.

Output is one interval per line, tab-separated:
  whole reference:      name  0      length        count
  partitioned interval: name  start  end    (empty) count

Intervals from different references may be interleaved; intervals for one reference are
written in position order.

Example usage:
  bamchunk chunk -n 1000 sample.bam > chunks.txt
  bamchunk chunk --chunks 200 -o chunks.txt sample.bam
"#
)]
pub struct Chunk {
    /// Input BAM options
    #[command(flatten)]
    pub input: InputBamOptions,

    /// Output options
    #[command(flatten)]
    pub output: TextOutputOptions,

    /// Approximate number of chunks to produce
    #[arg(short = 'n', long = "chunks", default_value_t = DEFAULT_CHUNK_COUNT)]
    pub chunks: usize,

    /// Intervals buffered between scanning threads and the writer
    #[arg(long = "channel-capacity", default_value_t = DEFAULT_CHANNEL_CAPACITY, hide = true)]
    pub channel_capacity: usize,
}

impl Command for Chunk {
    fn execute(&self, command_line: &str) -> Result<()> {
        debug!("Command line: {command_line}");
        self.input.validate()?;
        self.output.validate()?;

        let timer = OperationTimer::new("Chunking BAM");

        info!("Starting Chunk");
        info!("Input: {}", self.input.input.display());
        info!("Output: {}", self.output.describe());
        info!("Requested chunks: {}", format_count(self.chunks as u64));

        let source = BamSource::open(&self.input.input)
            .with_context(|| format!("Failed to open {}", self.input.input.display()))?;
        info!("Index: {}", source.index_path().display());

        let stats = source.index_stats()?;
        let plan = plan(source.reference_sequences(), &stats, self.chunks)?;
        let mut metrics = ChunkingMetrics::from_plan(&plan);

        let progress = Arc::new(ProgressTracker::new("Scanned records"));
        let stream = FanInMerger::new(source.factory())
            .with_channel_capacity(self.channel_capacity)
            .with_progress(Arc::clone(&progress))
            .merge(&plan)?;

        let mut writer = self.output.open_writer()?;
        let result = write_intervals(stream, &mut metrics, &mut writer);
        writer.flush().context("Failed to flush output")?;
        result?;

        progress.log_final();
        log_chunking_summary(&metrics);
        timer.log_completion(metrics.intervals);
        Ok(())
    }
}

/// Writes each interval on its own line as it arrives.
///
/// Stops at the first error; lines written before it are kept.
fn write_intervals<I, W>(intervals: I, metrics: &mut ChunkingMetrics, writer: &mut W) -> Result<()>
where
    I: IntoIterator<Item = std::result::Result<Interval, BamChunkError>>,
    W: Write + ?Sized,
{
    for result in intervals {
        let interval = result.context("Chunking failed")?;
        writeln!(writer, "{interval}").context("Failed to write interval")?;
        metrics.record(&interval);
    }
    Ok(())
}
