//! FastSamView - filter and retrieve alignment records
//!
//! A Rust take on `samtools view`: converts between BAM and SAM while
//! filtering on mapping quality and flag bits, either over the whole file
//! or over index-selected regions.
//!
//! # Features
//!
//! - One predicate shared by sequential and region scans
//! - Region strings like `chr1`, `chr2:1,000` and `chr3:1000-2,000`
//! - BAI-backed random access through rust-htslib
//!
//! # Example
//!
//! ```ignore
//! use fast_samview::{FilterConfig, ViewOptions, formats::run_view};
//!
//! let mut options = ViewOptions::new("in.bam");
//! options.regions = vec!["chr1:100-200".to_string()];
//! options.filter = FilterConfig::new(30, 0, 0x4);
//!
//! let summary = run_view(&options)?;
//! std::process::exit(summary.status.code());
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    parse_region, scan_all, scan_regions, ExitStatus, FilterConfig, HeaderMode, OutputFormat,
    Region, ReferenceLookup, ScanOutcome, ScanReport, ViewError, ViewOptions,
};
