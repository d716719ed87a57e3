//! Input collection and output placement for batch runs.

use crate::constants::AUDIO_EXTENSIONS;
use crate::constants::output::FALLBACK_SUBFOLDER;
use crate::error::Result;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Options for processing a single file.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Subfolder under the output directory; `None` uses the input's parent
    /// directory name.
    pub subfolder: Option<String>,
    /// Skip writing segmented audio.
    pub no_write: bool,
}

/// Subfolder the segments of `input` are written to.
pub fn subfolder_for(input: &Path, explicit: Option<&str>) -> String {
    if let Some(name) = explicit {
        return name.to_string();
    }
    input
        .parent()
        .and_then(Path::file_name)
        .map_or_else(
            || FALLBACK_SUBFOLDER.to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
}

/// File stem used in output names; non-UTF-8 sequences are replaced.
pub fn stem_of(input: &Path) -> Cow<'_, str> {
    input
        .file_stem()
        .map_or(Cow::Borrowed("recording"), |s| s.to_string_lossy())
}

/// Collect input files from paths (files and directories).
///
/// Directories are searched recursively; the result is sorted so batch
/// order does not depend on the file system.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_audio_file(path) {
                files.push(path.clone());
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            collect_audio_files_recursive(path, &mut files)?;
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Recursively collect audio files from a directory.
fn collect_audio_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            collect_audio_files_recursive(&path, files)?;
        } else if is_audio_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Check if a file is a supported audio format.
fn is_audio_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        AUDIO_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}
