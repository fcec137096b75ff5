//! Voting machine configuration with TOML support.

use prime_types::SECONDS_PER_DAY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::outcome::BPS_DENOMINATOR;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("{0}")]
    Invalid(String),
}

/// Tunables of a voting machine.
///
/// Can be loaded from TOML via [`VotingConfig::from_toml_file`] or built
/// programmatically (e.g. for tests). Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Participation floor in basis points of the reference supply. A vote
    /// whose turnout does not exceed the floor is NotApplied.
    #[serde(default = "default_quorum_bps")]
    pub quorum_bps: u32,

    /// Length of one voting day in seconds.
    #[serde(default = "default_seconds_per_day")]
    pub seconds_per_day: u64,

    /// Longest accepted vote description, in bytes.
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,
}

fn default_quorum_bps() -> u32 {
    4_000
}

fn default_seconds_per_day() -> u64 {
    SECONDS_PER_DAY
}

fn default_max_description_len() -> usize {
    1_024
}

impl VotingConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quorum_bps > BPS_DENOMINATOR {
            return Err(ConfigError::Invalid(format!(
                "quorum_bps {} exceeds {}",
                self.quorum_bps, BPS_DENOMINATOR
            )));
        }
        if self.seconds_per_day == 0 {
            return Err(ConfigError::Invalid("seconds_per_day must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            quorum_bps: default_quorum_bps(),
            seconds_per_day: default_seconds_per_day(),
            max_description_len: default_max_description_len(),
        }
    }
}
