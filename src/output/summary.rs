//! Batch summary of a segmentation run.

use crate::error::{Error, Result};
use crate::pipeline::ProcessResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A file that could not be segmented.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    /// Input path.
    pub file: PathBuf,
    /// Error message.
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    /// Files segmented successfully, in processing order.
    pub files: Vec<ProcessResult>,
    /// Files that failed.
    pub failed: Vec<FailedFile>,
}

impl BatchSummary {
    /// Record a successfully segmented file.
    pub fn push_ok(&mut self, result: ProcessResult) {
        self.files.push(result);
    }

    /// Record a failed file.
    pub fn push_failed(&mut self, file: &Path, error: &Error) {
        self.failed.push(FailedFile {
            file: file.to_path_buf(),
            error: error.to_string(),
        });
    }

    /// Total S1 peaks over all files.
    pub fn total_s1(&self) -> usize {
        self.files.iter().map(|f| f.s1_peaks).sum()
    }

    /// Total S2 peaks over all files.
    pub fn total_s2(&self) -> usize {
        self.files.iter().map(|f| f.s2_peaks).sum()
    }

    /// Total uncertain peaks over all files.
    pub fn total_uncertain(&self) -> usize {
        self.files.iter().map(|f| f.uncertain_peaks).sum()
    }

    /// Log one line per file and the totals.
    pub fn log(&self) {
        for file in &self.files {
            info!(
                "{}: {} S1, {} S2, {} uncertain{}",
                file.file.display(),
                file.s1_peaks,
                file.s2_peaks,
                file.uncertain_peaks,
                if file.partial_resolution {
                    " (partial)"
                } else {
                    ""
                }
            );
        }
        for failed in &self.failed {
            warn!("{}: {}", failed.file.display(), failed.error);
        }
        info!(
            "Segmented {} files, {} failed: {} S1, {} S2, {} uncertain",
            self.files.len(),
            self.failed.len(),
            self.total_s1(),
            self.total_s2(),
            self.total_uncertain()
        );
    }

    /// Write the summary as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::OutputDirCreateFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self).map_err(|e| {
            Error::JsonWrite {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }
}
