//! Output stream helpers
//!
//! Opens the text output destination with a large buffer. `-` and a
//! missing path both mean standard output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Default buffer size for BufWriter (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Path that stands for standard input/output
pub const STDIO_PATH: &str = "-";

/// Check whether a path means standard output
pub fn is_stdio(path: Option<&Path>) -> bool {
    match path {
        None => true,
        Some(p) => p.as_os_str() == STDIO_PATH,
    }
}

/// Open a buffered writer on a file or on stdout
pub fn create_buf_writer(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    create_buf_writer_with_capacity(path, DEFAULT_BUFFER_SIZE)
}

/// Open a buffered writer with a custom buffer size
pub fn create_buf_writer_with_capacity(path: Option<&Path>, capacity: usize) -> io::Result<Box<dyn Write>> {
    match path {
        Some(p) if !is_stdio(Some(p)) => {
            let file = File::create(p)?;
            Ok(Box::new(BufWriter::with_capacity(capacity, file)))
        }
        _ => Ok(Box::new(BufWriter::with_capacity(capacity, io::stdout()))),
    }
}
