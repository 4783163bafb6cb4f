//! BAM/SAM format adapter
//!
//! Binds the scanners to rust-htslib: a sequential reader source, a BAI
//! backed region index, the header as reference lookup, and BAM/SAM
//! output sinks. [`run_view`] wires them together for one invocation.

use crate::core::{
    create_buf_writer, drive, is_stdio, AlignmentFields, ExitStatus, HeaderMode, OutputFormat,
    RecordSink, RecordSource, ReferenceLookup, Region, RegionIndex, RegionQuery, Result,
    ScanReport, SourceError, SourceResult, ViewError, ViewInput, ViewOptions,
};
use crate::formats::sam::SamSink;
use log::{debug, warn};
use rust_htslib::bam::{self, FetchDefinition, Header, HeaderView, Read, Record};
use std::path::Path;

impl AlignmentFields for Record {
    #[inline(always)]
    fn status_bits(&self) -> u16 {
        self.flags()
    }

    #[inline(always)]
    fn mapping_quality(&self) -> u8 {
        self.mapq()
    }
}

impl ReferenceLookup for HeaderView {
    fn resolve(&self, name: &str) -> Option<u32> {
        self.tid(name.as_bytes())
    }

    fn length_of(&self, tid: u32) -> Option<u64> {
        if tid >= self.target_count() {
            return None;
        }
        self.target_len(tid)
    }
}

fn malformed(e: rust_htslib::errors::Error) -> SourceError {
    SourceError::Malformed(e.to_string())
}

/// Sequential record source over a BAM or SAM file
pub struct BamSource {
    reader: bam::Reader,
}

impl BamSource {
    /// Open `path`; BAM, SAM and compressed SAM are detected by htslib
    pub fn open<P: AsRef<Path>>(path: P, threads: usize) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = bam::Reader::from_path(path).map_err(|e| ViewError::OpenInput {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if threads > 1 {
            reader.set_threads(threads)?;
        }
        Ok(Self { reader })
    }

    pub fn header(&self) -> &HeaderView {
        self.reader.header()
    }
}

impl RecordSource for BamSource {
    type Record = Record;

    fn read_next(&mut self) -> SourceResult<Option<Record>> {
        let mut record = Record::new();
        match self.reader.read(&mut record) {
            None => Ok(None),
            Some(Ok(())) => Ok(Some(record)),
            Some(Err(e)) => Err(malformed(e)),
        }
    }
}

/// Region index backed by a BAI/CSI file next to the BAM
pub struct BamIndex {
    reader: bam::IndexedReader,
}

impl BamIndex {
    /// Load the index for `path`, `None` when there is no usable index
    pub fn load<P: AsRef<Path>>(path: P, threads: usize) -> Option<Self> {
        let path = path.as_ref();
        let mut reader = match bam::IndexedReader::from_path(path) {
            Ok(reader) => reader,
            Err(e) => {
                warn!("fail to load index for {}: {}", path.display(), e);
                return None;
            }
        };
        if threads > 1 {
            if let Err(e) = reader.set_threads(threads) {
                warn!("fail to enable {} threads: {}", threads, e);
            }
        }
        debug!("loaded index for {}", path.display());
        Some(Self { reader })
    }

    pub fn header(&self) -> &HeaderView {
        self.reader.header()
    }
}

impl RegionIndex for BamIndex {
    type Record = Record;

    fn query(&mut self, region: &Region) -> SourceResult<RegionQuery<'_, Record>> {
        self.reader
            .fetch(FetchDefinition::Region(
                region.tid as i32,
                region.begin as i64,
                region.end as i64,
            ))
            .map_err(malformed)?;
        Ok(Box::new(self.reader.records().map(|r| r.map_err(malformed))))
    }
}

/// BAM output sink
pub struct BamSink {
    writer: bam::Writer,
}

impl BamSink {
    /// Create a BAM writer carrying `header`; `None` or `-` writes to stdout
    pub fn create(path: Option<&Path>, header: &HeaderView, threads: usize) -> Result<Self> {
        let header = Header::from_template(header);
        let opened = match path {
            Some(p) if !is_stdio(Some(p)) => bam::Writer::from_path(p, &header, bam::Format::Bam),
            _ => bam::Writer::from_stdout(&header, bam::Format::Bam),
        };
        let mut writer = opened.map_err(|e| ViewError::OpenOutput {
            path: path.map(Path::to_path_buf).unwrap_or_else(|| "-".into()),
            message: e.to_string(),
        })?;
        if threads > 1 {
            writer.set_threads(threads)?;
        }
        Ok(Self { writer })
    }
}

impl RecordSink<Record> for BamSink {
    fn write(&mut self, record: &Record) -> Result<()> {
        self.writer
            .write(record)
            .map_err(|e| ViewError::Write(e.to_string()))
    }
}

/// Open the output sink selected by `options`
pub fn open_sink(options: &ViewOptions, header: &HeaderView) -> Result<Box<dyn RecordSink<Record>>> {
    let path = options.output.as_deref();
    match options.output_format {
        OutputFormat::Bam => Ok(Box::new(BamSink::create(path, header, options.threads)?)),
        OutputFormat::Sam => {
            let out = create_buf_writer(path).map_err(|e| ViewError::OpenOutput {
                path: path.map(Path::to_path_buf).unwrap_or_else(|| "-".into()),
                message: e.to_string(),
            })?;
            let sink = SamSink::new(out, header.clone(), options.header.writes_header())?;
            Ok(Box::new(sink))
        }
    }
}

/// Result of one view invocation
#[derive(Debug, Clone)]
pub struct ViewSummary {
    pub status: ExitStatus,
    /// `None` when only the header was requested
    pub report: Option<ScanReport>,
}

/// Open the input for `options` and return it with its header.
///
/// A region query opens only the indexed reader. When no index can be
/// loaded the plain reader is opened just long enough to read the header,
/// so the output is still well formed and a missing input is still an
/// open error.
pub fn open_input(options: &ViewOptions) -> Result<(ViewInput<BamSource, BamIndex>, HeaderView)> {
    let input = ViewInput::open(
        options,
        || BamSource::open(&options.input, options.threads),
        || {
            if options.input_is_sam {
                warn!("SAM input cannot be indexed");
                None
            } else {
                BamIndex::load(&options.input, options.threads)
            }
        },
    )?;
    let header = match &input {
        ViewInput::Sequential(source) => source.header().clone(),
        ViewInput::Indexed(Some(index)) => index.header().clone(),
        ViewInput::Indexed(None) => BamSource::open(&options.input, 1)?.header().clone(),
    };
    Ok((input, header))
}

/// Run a complete view: open input and output, scan, flush.
///
/// Open failures are returned as errors. A missing index for a region
/// request is reported through `ExitStatus::Failure`.
pub fn run_view(options: &ViewOptions) -> Result<ViewSummary> {
    let (mut input, header) = open_input(options)?;
    let mut sink = open_sink(options, &header)?;

    if options.header == HeaderMode::Only {
        sink.flush()?;
        return Ok(ViewSummary {
            status: ExitStatus::Success,
            report: None,
        });
    }

    let report = drive(
        &mut input,
        &header,
        &options.regions,
        &options.filter,
        sink.as_mut(),
    )?;
    sink.flush()?;

    Ok(ViewSummary {
        status: ExitStatus::from(report.outcome),
        report: Some(report),
    })
}
