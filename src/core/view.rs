//! View orchestration
//!
//! Chooses between a full sequential scan and an index-assisted region
//! scan, and turns the scan outcome into a process exit status.

use crate::core::error::Result;
use crate::core::filter::{AlignmentFields, FilterConfig};
use crate::core::region::{parse_region, ReferenceLookup};
use crate::core::scan::{scan_all, scan_regions, RecordSink, RecordSource, RegionIndex, ScanOutcome, ScanReport};
use log::{debug, info};
use std::path::PathBuf;

/// Output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Text SAM
    #[default]
    Sam,
    /// Binary BAM
    Bam,
}

/// Header handling for the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Records only (SAM output); BAM output always carries a header
    #[default]
    Omit,
    /// Header followed by records
    Include,
    /// Header and nothing else
    Only,
}

impl HeaderMode {
    pub fn writes_header(&self) -> bool {
        !matches!(self, HeaderMode::Omit)
    }
}

/// Everything a view invocation needs
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    /// Input BAM or SAM file
    pub input: PathBuf,
    /// Output file, stdout when `None`
    pub output: Option<PathBuf>,
    /// Region tokens; empty means the whole file
    pub regions: Vec<String>,
    pub filter: FilterConfig,
    pub output_format: OutputFormat,
    pub header: HeaderMode,
    /// Input is text SAM, which cannot be indexed
    pub input_is_sam: bool,
    /// Threads for BGZF (de)compression
    pub threads: usize,
}

impl ViewOptions {
    pub fn new<P: Into<PathBuf>>(input: P) -> Self {
        Self {
            input: input.into(),
            threads: 1,
            ..Default::default()
        }
    }

    /// True when records are fetched through the index
    pub fn is_region_query(&self) -> bool {
        !self.regions.is_empty()
    }
}

/// Process-level result of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// Output is valid but the input ended early
    SuccessWithWarning,
    Failure,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success | ExitStatus::SuccessWithWarning => 0,
            ExitStatus::Failure => 1,
        }
    }
}

impl From<ScanOutcome> for ExitStatus {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Completed => ExitStatus::Success,
            ScanOutcome::CompletedWithTruncation => ExitStatus::SuccessWithWarning,
            ScanOutcome::NoUsableIndex => ExitStatus::Failure,
        }
    }
}

/// Input handle opened for one view
///
/// A region query holds only the indexed reader, a whole-file view only
/// the sequential one.
pub enum ViewInput<S, I> {
    /// Sequential reader over the whole input
    Sequential(S),
    /// Indexed reader, `None` when no usable index could be loaded
    Indexed(Option<I>),
}

impl<S, I> ViewInput<S, I> {
    /// Open the handle the traversal mode of `options` needs.
    ///
    /// The index is loaded only for region queries; header-only views never
    /// touch it.
    pub fn open<FS, FI>(options: &ViewOptions, open_source: FS, load_index: FI) -> Result<Self>
    where
        FS: FnOnce() -> Result<S>,
        FI: FnOnce() -> Option<I>,
    {
        if options.is_region_query() && options.header != HeaderMode::Only {
            let index = load_index();
            debug!("region query, index loaded: {}", index.is_some());
            Ok(ViewInput::Indexed(index))
        } else {
            Ok(ViewInput::Sequential(open_source()?))
        }
    }
}

/// Drive one scan over an opened input.
///
/// A sequential input is scanned whole. An indexed input resolves every
/// token against `lookup` as it is reached; the index lives as long as
/// `input` and is dropped with it after the last region.
pub fn drive<S, I, L, K>(
    input: &mut ViewInput<S, I>,
    lookup: &L,
    regions: &[String],
    filter: &FilterConfig,
    sink: &mut K,
) -> Result<ScanReport>
where
    S: RecordSource,
    S::Record: AlignmentFields,
    I: RegionIndex<Record = S::Record>,
    L: ReferenceLookup + ?Sized,
    K: RecordSink<S::Record> + ?Sized,
{
    match input {
        ViewInput::Sequential(source) => {
            debug!("sequential scan");
            let report = scan_all(source, filter, sink)?;
            info!("scanned {} records, {} written", report.stats.total, report.stats.passed);
            Ok(report)
        }
        ViewInput::Indexed(index) => {
            debug!("region scan over {} tokens", regions.len());
            let parsed = regions.iter().map(|token| parse_region(token, lookup));
            let report = scan_regions(index.as_mut(), parsed, filter, sink)?;
            info!(
                "queried {} regions ({} skipped), {} written",
                report.stats.regions_queried, report.stats.regions_skipped, report.stats.passed
            );
            Ok(report)
        }
    }
}
