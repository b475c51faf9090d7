//! Progress tracking shared across scanning threads.
//!
//! Every reference scan feeds the same tracker, so the log shows one running total of
//! records read from the BAM no matter how many references are being scanned at once.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::logging::format_count;

/// Thread-safe counter that logs each time its total crosses a multiple of the interval.
///
/// # Example
/// ```
/// use bamchunk_lib::progress::ProgressTracker;
/// use std::sync::Arc;
///
/// let tracker = Arc::new(ProgressTracker::new("Scanned records").with_interval(1000));
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let tracker = Arc::clone(&tracker);
///         std::thread::spawn(move || {
///             tracker.log_if_needed(600);
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(tracker.count(), 2400);
/// tracker.log_final(); // "Scanned records 2,400 (complete)"
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Creates a tracker with a default interval of 1,000,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 1_000_000, message: message.into(), count: AtomicU64::new(0) }
    }

    /// Sets the logging interval.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Adds `additional` to the total, logging once per interval boundary crossed.
    ///
    /// Returns `true` if the new total sits exactly on a boundary.
    pub fn log_if_needed(&self, additional: u64) -> bool {
        if additional == 0 {
            let count = self.count.load(Ordering::Relaxed);
            return count > 0 && count.is_multiple_of(self.interval);
        }

        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let total = prev + additional;

        for milestone in (prev / self.interval + 1)..=(total / self.interval) {
            info!("{} {}", self.message, format_count(milestone * self.interval));
        }

        total.is_multiple_of(self.interval)
    }

    /// Logs the final total unless the last update already landed on a boundary.
    pub fn log_final(&self) {
        if !self.log_if_needed(0) {
            let count = self.count.load(Ordering::Relaxed);
            if count > 0 {
                info!("{} {} (complete)", self.message, format_count(count));
            }
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
