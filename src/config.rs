//! TOML configuration with environment-variable overrides.

use crate::defaults;
use crate::error::{NotateError, Result};
use crate::segment::SegmenterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub segmenter: SegmenterConfig,
    pub transcribe: TranscribeConfig,
    pub backend: BackendConfig,
}

/// Transcription run configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscribeConfig {
    pub language: String,
    pub media_format: String,
    pub poll_interval_secs: u64,
    pub max_poll_failures: u32,
    pub submit_attempts: u32,
}

/// Backend endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            media_format: defaults::MEDIA_FORMAT.to_string(),
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
            max_poll_failures: defaults::MAX_POLL_FAILURES,
            submit_attempts: defaults::SUBMIT_ATTEMPTS,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(NotateError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Check combined configuration (file, environment, CLI) for values the
    /// pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.segmenter.min_silence_ms == 0 {
            return Err(NotateError::ConfigInvalidValue {
                key: "segmenter.min_silence_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.transcribe.submit_attempts == 0 {
            return Err(NotateError::ConfigInvalidValue {
                key: "transcribe.submit_attempts".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.backend.endpoint.is_empty() {
            return Err(NotateError::ConfigInvalidValue {
                key: "backend.endpoint".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - NOTATE_LANGUAGE → transcribe.language
    /// - NOTATE_ENDPOINT → backend.endpoint
    /// - NOTATE_POLL_INTERVAL_SECS → transcribe.poll_interval_secs
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("NOTATE_LANGUAGE")
            && !language.is_empty()
        {
            self.transcribe.language = language;
        }

        if let Ok(endpoint) = std::env::var("NOTATE_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.backend.endpoint = endpoint;
        }

        if let Ok(interval) = std::env::var("NOTATE_POLL_INTERVAL_SECS")
            && let Ok(secs) = interval.parse::<u64>()
        {
            self.transcribe.poll_interval_secs = secs;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/notate/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("notate").join("config.toml"))
    }
}
