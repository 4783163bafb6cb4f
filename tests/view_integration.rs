//! End-to-end view tests
//!
//! Builds small coordinate-sorted BAM files (and their BAI index) in a
//! temp dir with rust-htslib, then runs the full view pipeline on them.

#![cfg(feature = "bam")]

use fast_samview::core::{
    ExitStatus, FilterConfig, HeaderMode, OutputFormat, ScanOutcome, ViewError, ViewInput, ViewOptions,
};
use fast_samview::formats::{open_input, run_view};
use rust_htslib::bam::{self, header::HeaderRecord, record::Cigar, record::CigarString, Read};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const READ_LEN: i64 = 10;

/// (name, tid, 0-based pos, flag, mapq)
type ReadDef = (&'static str, i32, i64, u16, u8);

fn test_records() -> Vec<ReadDef> {
    vec![
        ("r1", 0, 10, 0, 60),
        ("r2", 0, 95, 0x10, 20),
        ("r3", 0, 150, 0, 5),
        ("r4", 0, 160, 0x100, 60),
        ("r5", 0, 250, 0, 60),
        ("r6", 1, 100, 0, 60),
    ]
}

fn reg2bin(beg: i64, end: i64) -> u16 {
    let end = end - 1;
    let bin = if beg >> 14 == end >> 14 {
        ((1 << 15) - 1) / 7 + (beg >> 14)
    } else if beg >> 17 == end >> 17 {
        ((1 << 12) - 1) / 7 + (beg >> 17)
    } else if beg >> 20 == end >> 20 {
        ((1 << 9) - 1) / 7 + (beg >> 20)
    } else if beg >> 23 == end >> 23 {
        ((1 << 6) - 1) / 7 + (beg >> 23)
    } else if beg >> 26 == end >> 26 {
        ((1 << 3) - 1) / 7 + (beg >> 26)
    } else {
        0
    };
    bin as u16
}

fn test_header() -> bam::Header {
    let mut header = bam::Header::new();
    let mut hd = HeaderRecord::new(b"HD");
    hd.push_tag(b"VN", "1.6");
    hd.push_tag(b"SO", "coordinate");
    header.push_record(&hd);
    for (name, len) in [("chr1", 1000u64), ("chr2", 2000)] {
        let mut sq = HeaderRecord::new(b"SQ");
        sq.push_tag(b"SN", name);
        sq.push_tag(b"LN", len);
        header.push_record(&sq);
    }
    header
}

/// Write a BAM file, optionally with its BAI index
fn write_bam(dir: &Path, name: &str, with_index: bool) -> PathBuf {
    let path = dir.join(name);
    {
        let mut writer = bam::Writer::from_path(&path, &test_header(), bam::Format::Bam).unwrap();
        let cigar = CigarString(vec![Cigar::Match(READ_LEN as u32)]);
        for (qname, tid, pos, flag, mapq) in test_records() {
            let mut record = bam::Record::new();
            record.set(qname.as_bytes(), Some(&cigar), b"ACGTACGTAC", &[30; READ_LEN as usize]);
            record.set_tid(tid);
            record.set_pos(pos);
            record.set_bin(reg2bin(pos, pos + READ_LEN));
            record.set_flags(flag);
            record.set_mapq(mapq);
            record.set_mtid(-1);
            record.set_mpos(-1);
            record.set_insert_size(0);
            writer.write(&record).unwrap();
        }
    }
    if with_index {
        bam::index::build(&path, None, bam::index::Type::Bai, 1).unwrap();
    }
    path
}

/// Write `n` 100 bp reads on chr1, enough to span several BGZF blocks
fn write_long_bam(dir: &Path, name: &str, n: usize) -> PathBuf {
    let path = dir.join(name);
    let mut writer = bam::Writer::from_path(&path, &test_header(), bam::Format::Bam).unwrap();
    let cigar = CigarString(vec![Cigar::Match(100)]);
    let seq: Vec<u8> = b"ACGT".iter().cycle().take(100).copied().collect();
    for i in 0..n {
        let pos = (i * 800 / n) as i64;
        let mut record = bam::Record::new();
        record.set(format!("read{}", i).as_bytes(), Some(&cigar), &seq, &[30; 100]);
        record.set_tid(0);
        record.set_pos(pos);
        record.set_bin(reg2bin(pos, pos + 100));
        record.set_flags(0);
        record.set_mapq(60);
        record.set_mtid(-1);
        record.set_mpos(-1);
        writer.write(&record).unwrap();
    }
    drop(writer);
    path
}

fn sam_names(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.starts_with('@'))
        .map(|l| l.split('\t').next().unwrap().to_string())
        .collect()
}

fn options(input: &Path, output: &Path) -> ViewOptions {
    let mut options = ViewOptions::new(input);
    options.output = Some(output.to_path_buf());
    options
}

#[test]
fn test_whole_file_to_sam() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", false);
    let output = dir.path().join("out.sam");

    let summary = run_view(&options(&input, &output)).unwrap();

    assert_eq!(summary.status, ExitStatus::Success);
    assert_eq!(sam_names(&output), vec!["r1", "r2", "r3", "r4", "r5", "r6"]);
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(!text.contains("@SQ"));
    assert!(text.starts_with("r1\t0\tchr1\t11\t60\t10M\t*\t0\t0\tACGTACGTAC\t"));
}

#[test]
fn test_whole_file_with_filters() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", false);
    let output = dir.path().join("out.sam");

    let mut opts = options(&input, &output);
    opts.filter = FilterConfig::new(10, 0, 0x100);
    let summary = run_view(&opts).unwrap();

    assert_eq!(summary.status, ExitStatus::Success);
    assert_eq!(sam_names(&output), vec!["r1", "r2", "r5", "r6"]);
    let report = summary.report.unwrap();
    assert_eq!(report.stats.total, 6);
    assert_eq!(report.stats.filtered, 2);
}

#[test]
fn test_region_query() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", true);
    let output = dir.path().join("out.sam");

    let mut opts = options(&input, &output);
    opts.regions = vec!["chr1:100-200".to_string()];
    let summary = run_view(&opts).unwrap();

    assert_eq!(summary.status, ExitStatus::Success);
    // r2 starts at 95 but its 10 bases overlap the region
    assert_eq!(sam_names(&output), vec!["r2", "r3", "r4"]);
}

#[test]
fn test_region_query_with_filter_and_duplicates() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", true);
    let output = dir.path().join("out.sam");

    let mut opts = options(&input, &output);
    opts.regions = vec!["chr1:151-155".to_string(), "chr2".to_string(), "chr1:100-200".to_string()];
    opts.filter = FilterConfig::new(0, 0, 0x100);
    let summary = run_view(&opts).unwrap();

    assert_eq!(summary.status, ExitStatus::Success);
    assert_eq!(sam_names(&output), vec!["r3", "r6", "r2", "r3"]);
}

#[test]
fn test_unknown_reference_is_skipped() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", true);
    let output = dir.path().join("out.sam");

    let mut opts = options(&input, &output);
    opts.regions = vec!["chr9".to_string(), "chr2".to_string()];
    let summary = run_view(&opts).unwrap();

    assert_eq!(summary.status, ExitStatus::Success);
    assert_eq!(summary.report.unwrap().stats.regions_skipped, 1);
    assert_eq!(sam_names(&output), vec!["r6"]);
}

#[test]
fn test_region_without_index_fails() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", false);
    let output = dir.path().join("out.sam");

    let mut opts = options(&input, &output);
    opts.regions = vec!["chr1".to_string()];
    let summary = run_view(&opts).unwrap();

    assert_eq!(summary.status, ExitStatus::Failure);
    assert_eq!(summary.status.code(), 1);
    assert!(sam_names(&output).is_empty());
}

#[test]
fn test_region_with_sam_input_fails() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", true);
    let output = dir.path().join("out.sam");

    let mut opts = options(&input, &output);
    opts.regions = vec!["chr1".to_string()];
    opts.input_is_sam = true;
    let summary = run_view(&opts).unwrap();

    assert_eq!(summary.status, ExitStatus::Failure);
}

#[test]
fn test_header_only() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", false);
    let output = dir.path().join("out.sam");

    let mut opts = options(&input, &output);
    opts.header = HeaderMode::Only;
    let summary = run_view(&opts).unwrap();

    assert_eq!(summary.status, ExitStatus::Success);
    assert!(summary.report.is_none());
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("@SQ\tSN:chr1\tLN:1000"));
    assert!(sam_names(&output).is_empty());
}

#[test]
fn test_header_included() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", false);
    let output = dir.path().join("out.sam");

    let mut opts = options(&input, &output);
    opts.header = HeaderMode::Include;
    run_view(&opts).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("@HD"));
    assert_eq!(sam_names(&output).len(), 6);
}

#[test]
fn test_bam_output() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", true);
    let output = dir.path().join("out.bam");

    let mut opts = options(&input, &output);
    opts.output_format = OutputFormat::Bam;
    opts.regions = vec!["chr1:1-100".to_string()];
    let summary = run_view(&opts).unwrap();
    assert_eq!(summary.status, ExitStatus::Success);

    let mut reader = bam::Reader::from_path(&output).unwrap();
    assert_eq!(reader.header().target_count(), 2);
    let names: Vec<Vec<u8>> = reader.records().map(|r| r.unwrap().qname().to_vec()).collect();
    assert_eq!(names, vec![b"r1".to_vec(), b"r2".to_vec()]);
}

#[test]
fn test_missing_input() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.sam");
    let result = run_view(&options(&dir.path().join("missing.bam"), &output));
    assert!(matches!(result, Err(ViewError::OpenInput { .. })));
}

#[test]
fn test_unwritable_output() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", false);
    let output = dir.path().join("no-such-dir").join("out.sam");
    let result = run_view(&options(&input, &output));
    assert!(matches!(result, Err(ViewError::OpenOutput { .. })));
}

#[test]
fn test_truncated_input_keeps_prefix() {
    let dir = tempdir().unwrap();
    let n = 2000;
    let input = write_long_bam(dir.path(), "in.bam", n);

    // drop the 28 byte EOF block plus the tail of the last data block
    let bytes = std::fs::read(&input).unwrap();
    std::fs::write(&input, &bytes[..bytes.len() - 28 - 16]).unwrap();

    let output = dir.path().join("out.sam");
    let summary = run_view(&options(&input, &output)).unwrap();

    assert_eq!(summary.status, ExitStatus::SuccessWithWarning);
    assert_eq!(summary.status.code(), 0);
    assert_eq!(summary.report.unwrap().outcome, ScanOutcome::CompletedWithTruncation);

    let names = sam_names(&output);
    assert!(!names.is_empty());
    assert!(names.len() < n);
    let expected: Vec<String> = (0..names.len()).map(|i| format!("read{}", i)).collect();
    assert_eq!(names, expected);
}

#[test]
fn test_region_query_opens_only_indexed_reader() {
    let dir = tempdir().unwrap();
    let input = write_bam(dir.path(), "in.bam", true);

    let mut opts = ViewOptions::new(&input);
    let (whole, _) = open_input(&opts).unwrap();
    assert!(matches!(whole, ViewInput::Sequential(_)));

    opts.regions = vec!["chr1".to_string()];
    let (indexed, header) = open_input(&opts).unwrap();
    assert!(matches!(indexed, ViewInput::Indexed(Some(_))));
    assert_eq!(header.target_count(), 2);
}

#[test]
fn test_region_query_on_missing_input() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.sam");
    let mut opts = options(&dir.path().join("missing.bam"), &output);
    opts.regions = vec!["chr1".to_string()];
    assert!(matches!(run_view(&opts), Err(ViewError::OpenInput { .. })));
}
