//! Record scanners
//!
//! Two traversal modes share one predicate:
//! 1. [`scan_all`] pulls every record from a [`RecordSource`] in storage order
//! 2. [`scan_regions`] asks a [`RegionIndex`] for the records overlapping
//!    each region, one region after another
//!
//! Surviving records are forwarded to a [`RecordSink`]. A failing sink
//! aborts the scan; a failing source only ends it early.

use crate::core::error::{RegionResult, Result, SourceResult};
use crate::core::filter::{AlignmentFields, FilterConfig};
use crate::core::region::Region;
use log::{debug, warn};

/// Sequential pull interface over an input
pub trait RecordSource {
    type Record;

    /// Next record, `Ok(None)` at a clean end of input, `Err` when the
    /// next record is truncated or corrupt.
    fn read_next(&mut self) -> SourceResult<Option<Self::Record>>;
}

/// Destination for records that passed the filter
pub trait RecordSink<R: ?Sized> {
    fn write(&mut self, record: &R) -> Result<()>;

    /// Push buffered output downstream
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<R: Clone> RecordSink<R> for Vec<R> {
    fn write(&mut self, record: &R) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

impl<R: ?Sized, K: RecordSink<R> + ?Sized> RecordSink<R> for &mut K {
    fn write(&mut self, record: &R) -> Result<()> {
        (**self).write(record)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Lazy, non-restartable sequence of records returned by an index query
pub type RegionQuery<'a, R> = Box<dyn Iterator<Item = SourceResult<R>> + 'a>;

/// Random access by reference id and 0-based half-open interval
pub trait RegionIndex {
    type Record;

    /// Records overlapping `region`, in the order the index enumerates them
    fn query(&mut self, region: &Region) -> SourceResult<RegionQuery<'_, Self::Record>>;
}

/// How a scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// All input consumed
    Completed,
    /// Stopped at a malformed record; earlier output is valid
    CompletedWithTruncation,
    /// Regions were requested but no index could be used
    NoUsableIndex,
}

impl ScanOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanOutcome::Completed => "completed",
            ScanOutcome::CompletedWithTruncation => "truncated",
            ScanOutcome::NoUsableIndex => "no usable index",
        }
    }
}

/// Scan statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Records read from the input
    pub total: usize,
    /// Records written to the sink
    pub passed: usize,
    /// Records rejected by the filter
    pub filtered: usize,
    /// Regions sent to the index
    pub regions_queried: usize,
    /// Region tokens that could not be used
    pub regions_skipped: usize,
}

impl ScanStats {
    fn record(&mut self, passed: bool) {
        self.total += 1;
        if passed {
            self.passed += 1;
        } else {
            self.filtered += 1;
        }
    }
}

/// Outcome plus statistics of one scanner invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn new(outcome: ScanOutcome, stats: ScanStats) -> Self {
        Self { outcome, stats }
    }
}

fn forward<R, K>(record: &R, filter: &FilterConfig, sink: &mut K, stats: &mut ScanStats) -> Result<()>
where
    R: AlignmentFields,
    K: RecordSink<R> + ?Sized,
{
    let passed = filter.passes(record);
    if passed {
        sink.write(record)?;
    }
    stats.record(passed);
    Ok(())
}

/// Read every record from `source` and forward those passing `filter`.
pub fn scan_all<S, K>(source: &mut S, filter: &FilterConfig, sink: &mut K) -> Result<ScanReport>
where
    S: RecordSource + ?Sized,
    S::Record: AlignmentFields,
    K: RecordSink<S::Record> + ?Sized,
{
    let mut stats = ScanStats::default();

    loop {
        match source.read_next() {
            Ok(Some(record)) => forward(&record, filter, sink, &mut stats)?,
            Ok(None) => return Ok(ScanReport::new(ScanOutcome::Completed, stats)),
            Err(e) => {
                warn!("truncated file after {} records: {}", stats.total, e);
                return Ok(ScanReport::new(ScanOutcome::CompletedWithTruncation, stats));
            }
        }
    }
}

/// Retrieve the records overlapping each region through `index`.
///
/// Without an index nothing is read and the outcome is
/// [`ScanOutcome::NoUsableIndex`]. Regions that failed to parse are logged
/// and skipped. Matches are emitted region by region in index order, so a
/// record covered by two regions is emitted twice.
pub fn scan_regions<I, R, K>(
    index: Option<&mut I>,
    regions: R,
    filter: &FilterConfig,
    sink: &mut K,
) -> Result<ScanReport>
where
    I: RegionIndex + ?Sized,
    I::Record: AlignmentFields,
    R: IntoIterator<Item = RegionResult<Region>>,
    K: RecordSink<I::Record> + ?Sized,
{
    let mut stats = ScanStats::default();
    let index = match index {
        Some(index) => index,
        None => {
            warn!("random alignment retrieval only works for indexed BAM files");
            return Ok(ScanReport::new(ScanOutcome::NoUsableIndex, stats));
        }
    };

    let mut outcome = ScanOutcome::Completed;
    for parsed in regions {
        let region = match parsed {
            Ok(region) => region,
            Err(e) => {
                warn!("fail to get the reference name, continue anyway: {}", e);
                stats.regions_skipped += 1;
                continue;
            }
        };

        let records = match index.query(&region) {
            Ok(records) => records,
            Err(e) => {
                warn!("index query failed for tid {} [{}, {}): {}", region.tid, region.begin, region.end, e);
                stats.regions_skipped += 1;
                continue;
            }
        };
        stats.regions_queried += 1;
        debug!("querying tid {} [{}, {})", region.tid, region.begin, region.end);

        for record in records {
            match record {
                Ok(record) => forward(&record, filter, sink, &mut stats)?,
                Err(e) => {
                    warn!("truncated region tid {} [{}, {}): {}", region.tid, region.begin, region.end, e);
                    outcome = ScanOutcome::CompletedWithTruncation;
                    break;
                }
            }
        }
    }

    Ok(ScanReport::new(outcome, stats))
}
