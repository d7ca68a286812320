//! Line source for Xdebug trace files.
//!
//! Opens trace files and yields their lines one at a time together with
//! their 1-based line numbers. Lines are decoded lossily so a stray byte in a
//! function argument never aborts a long trace.

use crate::utils::error::TraceError;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Open a trace file for buffered reading
///
/// **Public** - used by the analyze command before any parsing starts
///
/// # Errors
/// * `TraceError::NotFound` - path does not exist
/// * `TraceError::OpenFailed` - path exists but cannot be opened
pub fn open_trace(path: impl AsRef<Path>) -> Result<BufReader<File>, TraceError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(TraceError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| TraceError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Opened trace file: {}", path.display());

    Ok(BufReader::new(file))
}

/// Iterator over the numbered lines of a trace
pub struct TraceLines<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> TraceLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(256),
            line_number: 0,
        }
    }

    /// Number of lines yielded so far
    pub fn lines_read(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for TraceLines<R> {
    type Item = Result<(usize, String), TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();

        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                let line = String::from_utf8_lossy(&self.buffer).into_owned();
                Some(Ok((self.line_number, line)))
            }
            Err(source) => Some(Err(TraceError::ReadFailed {
                line: self.line_number + 1,
                source,
            })),
        }
    }
}
