//! Formatting helpers for log output.
//!
//! Counts are comma-grouped, durations are rounded to the two largest units, and
//! [`OperationTimer`] brackets a long-running step with start and completion lines.

use std::time::{Duration, Instant};

use crate::metrics::ChunkingMetrics;

/// Formats a count with thousands separators.
///
/// ```
/// use bamchunk_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a fraction (0.0-1.0) as a percentage.
///
/// ```
/// use bamchunk_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration in human-readable form ("45s", "2m 15s", "1h 30m").
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rem) = (secs / 60, secs % 60);
        if rem == 0 { format!("{mins}m") } else { format!("{mins}m {rem}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a processing rate in items per second, or per minute when slow.
#[must_use]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} items/s", format_count(count));
    }

    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} items/s", format_count(rate as u64))
    } else {
        format!("{:.1} items/min", count as f64 / (secs / 60.0))
    }
}

/// Logs the outcome of a chunking run.
pub fn log_chunking_summary(metrics: &ChunkingMetrics) {
    log::info!("Chunking Summary:");
    log::info!("  Mapped records (index): {}", format_count(metrics.total_mapped));
    log::info!("  Target records per chunk: {}", format_count(metrics.records_per_chunk));
    log::info!(
        "  References: {} ({} whole, {} partitioned)",
        metrics.references,
        metrics.whole_references,
        metrics.partitioned_references
    );
    log::info!(
        "  Intervals: {} ({} trailing partial)",
        format_count(metrics.intervals),
        format_count(metrics.partial_intervals)
    );

    if let (Some(min), Some(max)) = (metrics.min_interval_records, metrics.max_interval_records) {
        log::info!("  Records per full interval: {} - {}", format_count(min), format_count(max));
    }

    if metrics.total_mapped > 0 {
        let covered = metrics.records_in_intervals as f64 / metrics.total_mapped as f64;
        log::info!("  Mapped records covered: {}", format_percent(covered, 2));
    }
    if !metrics.is_complete() {
        log::warn!(
            "Intervals hold {} records but the index reports {} mapped records",
            format_count(metrics.records_in_intervals),
            format_count(metrics.total_mapped)
        );
    }
}

/// Brackets an operation with start and completion log lines.
///
/// ```no_run
/// use bamchunk_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Chunking input.bam");
/// // ... consume intervals ...
/// timer.log_completion(1_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Logs the start and begins timing.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Time since the operation started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs completion with an item count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
