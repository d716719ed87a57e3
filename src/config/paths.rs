//! Platform-specific configuration paths.

use crate::constants::APP_NAME;
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the full path to the config file.
///
/// - Linux: `~/.config/heartseg/config.toml`
/// - macOS: `~/Library/Application Support/heartseg/config.toml`
/// - Windows: `%APPDATA%\heartseg\config.toml`
pub fn config_file_path() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .ok_or(Error::ConfigDirNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_path_ends_with_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.to_string_lossy().ends_with("config.toml"));
            assert!(
                path.parent()
                    .is_some_and(|dir| dir.to_string_lossy().contains(APP_NAME))
            );
        }
    }
}
