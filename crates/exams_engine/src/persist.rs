use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

const STAGING_PREFIX: &str = ".partial-";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("destination has no parent directory: {0}")]
    NoParent(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Crash-safe file creation.
///
/// Content is staged in a hidden temp file next to the destination, flushed to
/// disk, then renamed over the final name. A crash at any point leaves either
/// no destination file or a complete one; a failed write removes the staging
/// file.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomicFileWriter;

impl AtomicFileWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, destination: &Path, content: &[u8]) -> Result<u64, PersistError> {
        let dir = destination
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| PersistError::NoParent(destination.to_path_buf()))?;
        ensure_output_dir(dir)?;

        let mut staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(dir)?;
        write_staged(&mut staged, content)?;
        staged
            .persist(destination)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(content.len() as u64)
    }
}

fn write_staged(staged: &mut NamedTempFile, content: &[u8]) -> io::Result<()> {
    staged.write_all(content)?;
    staged.flush()?;
    staged.as_file_mut().sync_all()
}
