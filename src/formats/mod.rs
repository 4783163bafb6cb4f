//! File format adapters
//!
//! Adapters binding the scanners to rust-htslib (BAM/SAM input, BAI index, BAM/SAM output).

#[cfg(feature = "bam")]
pub mod bam;
#[cfg(feature = "bam")]
pub mod sam;

#[cfg(feature = "bam")]
pub use bam::{open_input, open_sink, run_view, BamIndex, BamSink, BamSource, ViewSummary};
#[cfg(feature = "bam")]
pub use sam::{format_float, format_record, write_header, SamSink};
