//! Output directory handling: retrieved reports and session files.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sip_core::report::file_name_from_path;
use sip_core::ReportDocument;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {dir:?} is unusable: {source}")]
    OutputDir { dir: PathBuf, source: io::Error },
    #[error("invalid file name: {0:?}")]
    FileName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates `dir` when missing and checks a file can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |source: io::Error| PersistError::OutputDir {
        dir: dir.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(unusable)?;
    tempfile::tempfile_in(dir).map_err(unusable)?;
    Ok(())
}

/// Writes files into one directory through a temp file and rename, so readers
/// never see a half-written report.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `filename` must be a bare name.
    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        if filename.is_empty() || filename == ".." || filename.contains(['/', '\\']) {
            return Err(PersistError::FileName(filename.to_string()));
        }
        ensure_output_dir(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file_mut().sync_all()?;

        let target = self.dir.join(filename);
        tmp.persist(&target).map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }

    /// Saves a report under the last segment of its server path, or
    /// `fallback_name` when the path has none.
    pub fn write_report(
        &self,
        report: &ReportDocument,
        fallback_name: &str,
    ) -> Result<PathBuf, PersistError> {
        let name = match file_name_from_path(&report.path) {
            "" | "." | ".." => fallback_name,
            name => name,
        };
        self.write(name, &report.content)
    }
}
