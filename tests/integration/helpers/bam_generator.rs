//! Utilities for writing small coordinate-sorted, indexed BAM files.
//!
//! Records are described as SAM text, parsed with noodles, written as BAM and indexed, so
//! the BAI carries the same per-reference metadata a real aligner pipeline would produce.

use std::fs::File;
use std::path::{Path, PathBuf};

use noodles::bam::{self, bai};
use noodles::sam;
use noodles::sam::alignment::io::Write as AlignmentWrite;

const SEQUENCE: &str = "ACGTACGTAC";
const QUALITIES: &str = "IIIIIIIIII";

#[derive(Debug, Clone)]
struct SamLine {
    reference_index: usize,
    position: u64,
    text: String,
}

/// Builds an indexed BAM from reference definitions and record placements.
///
/// Positions are 0-based; records may be added in any order and are sorted on write.
#[derive(Debug, Default)]
pub struct IndexedBamBuilder {
    references: Vec<(String, u64)>,
    lines: Vec<SamLine>,
}

impl IndexedBamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `@SQ` line.
    pub fn reference(mut self, name: &str, length: u64) -> Self {
        self.references.push((name.to_string(), length));
        self
    }

    /// Adds a mapped record starting at `position`.
    pub fn mapped(mut self, reference: &str, position: u64) -> Self {
        self.push(reference, position, 0, "60", "10M");
        self
    }

    /// Adds mapped records at every position in `positions`.
    pub fn mapped_at(mut self, reference: &str, positions: impl IntoIterator<Item = u64>) -> Self {
        for position in positions {
            self.push(reference, position, 0, "60", "10M");
        }
        self
    }

    /// Adds an unmapped record placed on `reference` at `position`.
    pub fn unmapped(mut self, reference: &str, position: u64) -> Self {
        self.push(reference, position, 4, "0", "*");
        self
    }

    /// Adds an unmapped record with no reference.
    pub fn unplaced(mut self) -> Self {
        let name = format!("u{}", self.lines.len());
        self.lines.push(SamLine {
            reference_index: usize::MAX,
            position: u64::MAX,
            text: format!("{name}\t4\t*\t0\t0\t*\t*\t0\t0\t{SEQUENCE}\t{QUALITIES}"),
        });
        self
    }

    fn push(&mut self, reference: &str, position: u64, flags: u16, mapq: &str, cigar: &str) {
        let reference_index = self
            .references
            .iter()
            .position(|(name, _)| name == reference)
            .unwrap_or_else(|| panic!("unknown reference {reference}"));
        let name = format!("r{}", self.lines.len());
        self.lines.push(SamLine {
            reference_index,
            position,
            text: format!(
                "{name}\t{flags}\t{reference}\t{}\t{mapq}\t{cigar}\t*\t0\t0\t{SEQUENCE}\t{QUALITIES}",
                position + 1
            ),
        });
    }

    fn sam_text(&self) -> String {
        let mut lines = self.lines.clone();
        lines.sort_by_key(|line| (line.reference_index, line.position));

        let mut text = String::from("@HD\tVN:1.6\tSO:coordinate\n");
        for (name, length) in &self.references {
            text.push_str(&format!("@SQ\tSN:{name}\tLN:{length}\n"));
        }
        for line in lines {
            text.push_str(&line.text);
            text.push('\n');
        }
        text
    }

    /// Writes the BAM without an index.
    pub fn write_unindexed(&self, path: &Path) {
        let text = self.sam_text();
        let mut reader = sam::io::Reader::new(text.as_bytes());
        let header = reader.read_header().expect("Failed to parse SAM header");

        let mut writer = bam::io::Writer::new(File::create(path).expect("Failed to create BAM"));
        writer.write_header(&header).expect("Failed to write header");
        for result in reader.record_bufs(&header) {
            let record = result.expect("Failed to parse SAM record");
            writer.write_alignment_record(&header, &record).expect("Failed to write record");
        }
        writer.finish(&header).expect("Failed to finish BAM");
    }

    /// Writes the BAM and its index at `<path>.bai`, returning the index path.
    pub fn write(&self, path: &Path) -> PathBuf {
        self.write_unindexed(path);
        let index_path = bai_path(path);
        write_index(path, &index_path);
        index_path
    }
}

/// `<path>.bai`, e.g. `sample.bam.bai`.
pub fn bai_path(bam_path: &Path) -> PathBuf {
    let mut path = bam_path.as_os_str().to_owned();
    path.push(".bai");
    PathBuf::from(path)
}

/// Indexes `bam_path` and writes the BAI to `index_path`.
pub fn write_index(bam_path: &Path, index_path: &Path) {
    let index = bam::fs::index(bam_path).expect("Failed to index BAM");
    let mut writer = bai::io::Writer::new(File::create(index_path).expect("Failed to create BAI"));
    writer.write_index(&index).expect("Failed to write BAI");
}

/// Ten mapped records at 0, 100, ..., 900 on a 1000 bp `chr1`.
pub fn ten_record_bam() -> IndexedBamBuilder {
    IndexedBamBuilder::new().reference("chr1", 1000).mapped_at("chr1", (0..10).map(|i| i * 100))
}
