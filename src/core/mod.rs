//! Core retrieval and filtering functionality
//!
//! This module contains the record predicate, the region parser,
//! the sequential and indexed scanners, and the view orchestration.

mod error;
mod filter;
pub mod io;
mod region;
mod scan;
mod view;

pub use error::{
    FilterError, RegionError, RegionResult, Result, SourceError, SourceResult, ViewError,
};
pub use filter::{flags, parse_flag_mask, AlignmentFields, FilterConfig};
pub use io::{create_buf_writer, is_stdio, DEFAULT_BUFFER_SIZE, STDIO_PATH};
pub use region::{parse_region, Region, ReferenceList, ReferenceLookup, UNBOUNDED_END};
pub use scan::{
    scan_all, scan_regions, RecordSink, RecordSource, RegionIndex, RegionQuery, ScanOutcome,
    ScanReport, ScanStats,
};
pub use view::{drive, ExitStatus, HeaderMode, OutputFormat, ViewInput, ViewOptions};
