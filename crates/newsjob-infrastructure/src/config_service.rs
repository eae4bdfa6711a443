//! Configuration service implementation.
//!
//! Loads the job configuration from `<config_dir>/newsjob/config.toml`. A
//! missing or empty file yields the defaults.

use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use newsjob_core::error::{NewsJobError, Result};
use newsjob_core::JobConfig;
use tracing::{debug, info};

use crate::paths::NewsJobPaths;

/// Reads and writes the job configuration file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the config file of the given path layout.
    pub fn new(paths: &NewsJobPaths) -> Result<Self> {
        let path = paths
            .config_file()
            .map_err(|e| NewsJobError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Uses an explicit config file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<JobConfig> {
        let config = match self.read()? {
            Some(config) => config,
            None => {
                debug!(path = %self.path.display(), "No config file, using defaults");
                JobConfig::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn read(&self) -> Result<Option<JobConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(toml::from_str(&content)?))
    }

    /// Writes `config` through a temporary file and an atomic rename.
    pub fn save(&self, config: &JobConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(config)?;
        let tmp_path = self.path.with_extension("toml.tmp");
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        info!(path = %self.path.display(), "Config saved");
        Ok(())
    }

    /// Writes the defaults unless a config file already exists.
    ///
    /// Returns `true` when a file was written.
    pub fn init(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&JobConfig::default())?;
        Ok(true)
    }
}
