//! Integration tests for the stats command.

use tempfile::TempDir;

use crate::helpers::{IndexedBamBuilder, arg, run_bamchunk, stdout_lines};

#[test]
fn test_stats_reports_index_counts() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    IndexedBamBuilder::new()
        .reference("chr1", 1000)
        .reference("chr2", 2000)
        .reference("chr3", 3000)
        .mapped_at("chr1", [10, 20, 30])
        .unmapped("chr1", 30)
        .mapped("chr3", 100)
        .unplaced()
        .write(&bam);

    let output = run_bamchunk(&["stats", arg(&bam)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let lines = stdout_lines(&output);
    assert_eq!(
        lines,
        ["chr1\t1000\t3\t1", "chr2\t2000\t0\t0", "chr3\t3000\t1\t0", "*\t0\t0\t1"]
    );
}

#[test]
fn test_stats_to_file() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    let out = dir.path().join("stats.tsv");
    IndexedBamBuilder::new().reference("chr1", 500).mapped("chr1", 1).write(&bam);

    let output = run_bamchunk(&["stats", "-o", arg(&out), arg(&bam)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("chr1\t500\t1\t0\n"));
}
