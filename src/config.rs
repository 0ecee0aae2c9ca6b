//! Runtime configuration read from the environment (after `.env` is loaded).

use humantime_serde::re::humantime;
use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_VOLUME: f32 = 0.5;
const MAX_VOLUME: f32 = 2.0;
const DEFAULT_PREFIX: &str = ">";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} is not a valid duration ({value:?}): {source}")]
    InvalidDuration {
        key: &'static str,
        value: String,
        source: humantime::DurationError,
    },

    #[error("{key} is not a valid number: {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("DEFAULT_VOLUME must be between 0.0 and 2.0, got {0}")]
    VolumeOutOfRange(f32),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// How long a guild may sit with nothing playing before the bot leaves voice.
    pub idle_timeout: Duration,
    /// Volume applied to every track, 1.0 being unity gain.
    pub default_volume: f32,
    /// Upper bound on a single track lookup.
    pub resolve_timeout: Duration,
    /// Prefix for text commands, e.g. `>play`.
    pub prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            default_volume: DEFAULT_VOLUME,
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unset or blank keys
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let idle_timeout = match get("IDLE_TIMEOUT") {
            Some(value) => parse_duration("IDLE_TIMEOUT", value)?,
            None => defaults.idle_timeout,
        };

        let resolve_timeout = match get("RESOLVE_TIMEOUT") {
            Some(value) => parse_duration("RESOLVE_TIMEOUT", value)?,
            None => defaults.resolve_timeout,
        };

        let default_volume = match get("DEFAULT_VOLUME") {
            Some(value) => value
                .trim()
                .parse::<f32>()
                .map_err(|_| ConfigError::InvalidNumber {
                    key: "DEFAULT_VOLUME",
                    value,
                })?,
            None => defaults.default_volume,
        };
        if !(0.0..=MAX_VOLUME).contains(&default_volume) {
            return Err(ConfigError::VolumeOutOfRange(default_volume));
        }

        let prefix = match lookup("COMMAND_PREFIX") {
            Some(value) if value.trim().is_empty() => return Err(ConfigError::Empty("COMMAND_PREFIX")),
            Some(value) => value.trim().to_string(),
            None => defaults.prefix,
        };

        Ok(Self {
            idle_timeout,
            default_volume,
            resolve_timeout,
            prefix,
        })
    }
}

fn parse_duration(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim())
        .map_err(|source| ConfigError::InvalidDuration { key, value, source })
}
