//! Integration tests for the chunk command.

use std::collections::BTreeMap;
use std::fs;

use tempfile::TempDir;

use crate::helpers::{
    IndexedBamBuilder, arg, parse_interval, run_bamchunk, stdout_lines, ten_record_bam,
};

#[test]
fn test_chunk_ten_records_into_three() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    ten_record_bam().write(&bam);

    let output = run_bamchunk(&["chunk", "-n", "3", arg(&bam)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert_eq!(
        stdout_lines(&output),
        vec!["chr1\t0\t200\t\t3", "chr1\t200\t500\t\t3", "chr1\t500\t800\t\t3", "chr1\t800\t900\t\t1"]
    );
}

#[test]
fn test_chunk_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    let out = dir.path().join("chunks.txt");
    ten_record_bam().write(&bam);

    let output = run_bamchunk(&["chunk", "--chunks", "3", "-o", arg(&out), arg(&bam)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.starts_with("chr1\t0\t200\t\t3\n"));
}

#[test]
fn test_small_reference_is_emitted_whole() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    IndexedBamBuilder::new()
        .reference("chr1", 100_000)
        .reference("chrM", 16569)
        .mapped_at("chr1", (0..200).map(|i| i * 100))
        .mapped("chrM", 10)
        .mapped("chrM", 500)
        .write(&bam);

    let output = run_bamchunk(&["chunk", "-n", "10", arg(&bam)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let lines = stdout_lines(&output);
    assert!(lines.contains(&"chrM\t0\t16569\t2".to_string()));

    let chr1: Vec<_> =
        lines.iter().map(|l| parse_interval(l)).filter(|(name, ..)| name == "chr1").collect();
    assert_eq!(chr1.len(), 10);
    assert!(chr1.iter().all(|(_, _, _, count, whole)| *count == 20 && !whole));
}

#[test]
fn test_unmapped_records_never_count() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    let mut builder = IndexedBamBuilder::new().reference("chr1", 10_000);
    for i in 0..40 {
        builder = builder.mapped("chr1", i * 50);
        if i % 3 == 0 {
            builder = builder.unmapped("chr1", i * 50);
        }
    }
    builder.unplaced().unplaced().write(&bam);

    let output = run_bamchunk(&["chunk", "-n", "4", arg(&bam)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let intervals: Vec<_> = stdout_lines(&output).iter().map(|l| parse_interval(l)).collect();
    assert_eq!(intervals.len(), 4);
    assert!(intervals.iter().all(|(_, _, _, count, _)| *count == 10));
    assert_eq!(intervals.iter().map(|(_, _, _, count, _)| count).sum::<u64>(), 40);
}

#[test]
fn test_partitions_are_contiguous_and_sum_to_mapped() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    let expected: BTreeMap<&str, u64> = [("chr1", 1500), ("chr2", 900), ("chr3", 2600)].into();

    let mut builder = IndexedBamBuilder::new();
    for name in expected.keys() {
        builder = builder.reference(name, 1_000_000);
    }
    for (name, n) in &expected {
        builder = builder.mapped_at(name, (0..*n).map(|i| i * 37 + (i % 5)));
    }
    builder.write(&bam);

    let output = run_bamchunk(&["chunk", "-n", "25", arg(&bam)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let mut by_reference: BTreeMap<String, Vec<(u64, u64, u64)>> = BTreeMap::new();
    for line in stdout_lines(&output) {
        let (name, start, end, count, whole) = parse_interval(&line);
        assert!(!whole);
        by_reference.entry(name).or_default().push((start, end, count));
    }

    for (name, n) in &expected {
        let intervals = &by_reference[*name];
        // Output for a single reference arrives in position order.
        assert_eq!(intervals[0].0, 0);
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].1, pair[1].0, "{name} not contiguous");
        }
        assert_eq!(intervals.iter().map(|i| i.2).sum::<u64>(), *n, "{name}");
    }
}

#[test]
fn test_zero_chunks_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    ten_record_bam().write(&bam);

    let output = run_bamchunk(&["chunk", "-n", "0", arg(&bam)]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid chunk count"));

    let out = dir.path().join("chunks.txt");
    let output = run_bamchunk(&["chunk", "-n", "0", "-o", arg(&out), arg(&bam)]);
    assert!(!output.status.success());
    assert!(!out.exists());
}

#[test]
fn test_alternate_index_location() {
    let dir = TempDir::new().unwrap();
    let bam = dir.path().join("sample.bam");
    let index = ten_record_bam().write(&bam);
    fs::rename(&index, dir.path().join("sample.bai")).unwrap();

    let output = run_bamchunk(&["chunk", "-n", "3", arg(&bam)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_lines(&output).len(), 4);
}
