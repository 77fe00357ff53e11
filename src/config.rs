use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// File name looked up in the user's config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub cleaner: CleanerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Number of parallel threads (0 = auto)
    pub parallel_threads: usize,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Parallel removal jobs
    pub parallel_jobs: usize,
    /// Rewrite manifests to their minified form
    pub minify_manifests: bool,
    /// Ask before removing anything
    pub confirm: bool,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            parallel_jobs: 4,
            minify_manifests: true,
            confirm: true,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one, the default
    /// location is used if a file is there, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `$XDG_CONFIG_HOME/modsweep/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("modsweep").join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cleaner.parallel_jobs == 0 {
            return Err(ConfigError::Invalid(
                "cleaner.parallel_jobs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
