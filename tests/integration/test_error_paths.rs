//! Error path integration tests.
//!
//! Pre-flight failures must exit non-zero before any interval is written.

use std::fs;

use bamchunk_lib::errors::BamChunkError;
use bamchunk_lib::source::BamSource;
use tempfile::TempDir;

use crate::helpers::{arg, bai_path, run_bamchunk, ten_record_bam};

#[test]
fn test_missing_index() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    ten_record_bam().write_unindexed(&bam);

    let output = run_bamchunk(&["chunk", "-n", "3", arg(&bam)]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No index found"), "{stderr}");
    assert!(stderr.contains("sample.bam.bai"), "{stderr}");
}

#[test]
fn test_corrupt_index() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    ten_record_bam().write_unindexed(&bam);
    fs::write(bai_path(&bam), b"this is not a bai file").unwrap();

    let result = BamSource::open(&bam);
    assert!(matches!(result, Err(BamChunkError::IndexCorrupt { .. })));

    let output = run_bamchunk(&["stats", arg(&bam)]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not be decoded"));
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("absent.bam");

    let output = run_bamchunk(&["chunk", arg(&bam)]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("File does not exist"));
}

#[test]
fn test_index_for_another_bam() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    let other = dir.path().join("other.bam");
    ten_record_bam().write_unindexed(&bam);
    crate::helpers::IndexedBamBuilder::new()
        .reference("chr1", 1000)
        .reference("chr2", 1000)
        .mapped("chr2", 5)
        .write(&other);
    fs::copy(bai_path(&other), bai_path(&bam)).unwrap();

    let source = BamSource::open(&bam).unwrap();
    let result = bamchunk_lib::source::IndexedRecordSource::index_stats(&source);
    assert!(matches!(result, Err(BamChunkError::IndexCorrupt { .. })));
}
