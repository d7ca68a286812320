//! Output writers for report data.
//!
//! This module handles writing data in various formats:
//! - Terminal tables
//! - CSV exports
//! - JSON reports

pub mod csv_report;
pub mod json;
pub mod table;

use crate::utils::error::OutputError;
use log::debug;
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;

// Re-export main functions
pub use csv_report::{csv_file_name, write_csv, write_csv_to};
pub use json::{read_report, report_to_string, write_report};
pub use table::render_table;

/// Validate that an output path is writable
///
/// **Public** - shared by every file writer
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Create the parent directories of `path` if they are missing
fn ensure_parent_dir(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

/// Write `path` through a temp file in the same directory
///
/// The target only appears once `write` succeeded and the rename went
/// through. On any error the temp file is removed and `path` is untouched.
fn write_atomically<F>(path: &Path, write: F) -> Result<(), OutputError>
where
    F: FnOnce(&mut File) -> Result<(), OutputError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    write(temp.as_file_mut())?;
    temp.persist(path).map_err(|err| OutputError::WriteFailed(err.error))?;

    Ok(())
}
