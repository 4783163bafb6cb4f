//! Error types for FastSamView
//!
//! Defines all error types used throughout the library. Recoverable
//! conditions (bad region tokens, truncated input) are reported through
//! these types and logged by the scanners; everything that reaches the
//! caller as a `ViewError` is fatal for the invocation.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for FastSamView operations
#[derive(Debug, Error)]
pub enum ViewError {
    /// Input file could not be opened
    #[error("Failed to open file for reading: {path}: {message}")]
    OpenInput { path: PathBuf, message: String },

    /// Output file could not be opened
    #[error("Failed to open file for writing: {path}: {message}")]
    OpenOutput { path: PathBuf, message: String },

    /// Downstream writer failed
    #[error("Failed to write output: {0}")]
    Write(String),

    /// Filter option parsing errors
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// HTSlib errors
    #[cfg(feature = "bam")]
    #[error("HTSlib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while pulling records from an input
#[derive(Debug, Error)]
pub enum SourceError {
    /// Truncated or corrupt record
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// I/O error during reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while parsing a region token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    /// Region token was empty after stripping punctuation
    #[error("Empty region")]
    Empty,

    /// Reference name not present in the header
    #[error("Reference not found: {0}")]
    UnknownReference(String),

    /// Coordinate could not be read as a number
    #[error("Invalid coordinate '{value}' in region '{region}'")]
    InvalidCoordinate { region: String, value: String },

    /// Begin lies after end
    #[error("Invalid range in region '{region}': begin ({begin}) > end ({end})")]
    InvertedRange { region: String, begin: u64, end: u64 },
}

/// Errors that can occur while parsing filter options
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Flag mask was not a number
    #[error("Invalid flag mask '{0}'")]
    InvalidMask(String),

    /// Flag mask does not fit in 16 bits
    #[error("Flag mask '{0}' exceeds 0xFFFF")]
    MaskOutOfRange(String),
}

/// Result type alias for FastSamView operations
pub type Result<T> = std::result::Result<T, ViewError>;

/// Result type alias for record reading
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for region parsing
pub type RegionResult<T> = std::result::Result<T, RegionError>;
