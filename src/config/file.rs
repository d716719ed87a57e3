//! Configuration file loading.

use crate::config::{Config, validate_config};
use crate::error::{Error, Result};
use std::path::Path;

/// Load configuration from a TOML file.
///
/// Returns default config if the file does not exist. The loaded
/// configuration is validated before it is returned.
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from the default platform-specific path.
///
/// Returns default config if no config file exists.
pub fn load_default_config() -> Result<Config> {
    super::config_file_path().map_or_else(|_| Ok(Config::default()), |path| load_config_file(&path))
}

/// Save configuration to a TOML file.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents = toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;

    std::fs::write(path, contents).map_err(|e| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
