//! Helper utilities for integration tests.

pub mod bam_generator;

use std::path::Path;
use std::process::{Command, Output};

pub use bam_generator::*;

/// Runs the `bamchunk` binary with `args`.
pub fn run_bamchunk(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bamchunk"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to run bamchunk")
}

/// Path as a `&str` for command arguments.
pub fn arg(path: &Path) -> &str {
    path.to_str().expect("non UTF-8 path")
}

/// Stdout split into lines.
pub fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout).lines().map(str::to_string).collect()
}

/// A parsed interval line: `(name, start, end, count, whole)`.
pub fn parse_interval(line: &str) -> (String, u64, u64, u64, bool) {
    let fields: Vec<&str> = line.split('\t').collect();
    match fields.as_slice() {
        [name, start, end, count] => {
            (name.to_string(), start.parse().unwrap(), end.parse().unwrap(), count.parse().unwrap(), true)
        }
        [name, start, end, "", count] => {
            (name.to_string(), start.parse().unwrap(), end.parse().unwrap(), count.parse().unwrap(), false)
        }
        _ => panic!("unexpected interval line: {line:?}"),
    }
}
