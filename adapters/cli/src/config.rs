//! Settings file loaded by the command-line adapter.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;

/// Tunables of a City Experiment session.
///
/// Every key is optional in the TOML file; missing keys keep their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) tile_size: f32,
    pub(crate) tick_quantum_ms: u64,
    pub(crate) growth_chance_percent: u32,
    pub(crate) seed: u64,
    pub(crate) camera_speed: f32,
    pub(crate) screen_width: f32,
    pub(crate) screen_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            columns: 64,
            rows: 64,
            tile_size: 32.0,
            tick_quantum_ms: 100,
            growth_chance_percent: 4,
            seed: 0x00C1_7E5E,
            camera_speed: 0.4,
            screen_width: 1024.0,
            screen_height: 576.0,
        }
    }
}

impl Settings {
    /// Reads and validates the settings stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates settings from TOML text.
    pub(crate) fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Simulated time covered by a single tick.
    pub(crate) fn tick_quantum(&self) -> Duration {
        Duration::from_millis(self.tick_quantum_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::Invalid {
                key: "columns/rows",
                reason: "grid must contain at least one tile",
            });
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "tile_size",
                reason: "must be a positive number of pixels",
            });
        }
        if self.tick_quantum_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "tick_quantum_ms",
                reason: "must be at least one millisecond",
            });
        }
        if self.growth_chance_percent > 100 {
            return Err(ConfigError::Invalid {
                key: "growth_chance_percent",
                reason: "must not exceed 100",
            });
        }
        if !self.camera_speed.is_finite() || self.camera_speed < 0.0 {
            return Err(ConfigError::Invalid {
                key: "camera_speed",
                reason: "must be a non-negative number",
            });
        }
        Ok(())
    }
}

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read settings from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}
