//! Configuration structures for the timer service host.
//!
//! Supports TOML deserialization with sensible defaults. Table capacity is
//! a compile-time parameter and is only checked against here.

use crate::state::TimerMode;
use crate::time::{ticks_from_duration, Ticks};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level timer host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Interval between tick source pulses.
    #[serde(with = "humantime_serde")]
    pub tick_period: Duration,

    /// Sleep between main-loop iterations (poll scanner cadence).
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Stop after this long (run until signalled when absent).
    #[serde(with = "humantime_serde_opt")]
    pub run_for: Option<Duration>,

    /// Log a status line every this many ticks (0 disables).
    pub status_interval_ticks: Ticks,

    /// Timers to register at startup.
    pub timers: Vec<TimerSpec>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(1),
            poll_interval: Duration::from_micros(250),
            run_for: None,
            status_interval_ticks: 1000,
            timers: Vec::new(),
        }
    }
}

/// A timer registered at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    /// Label used in log output.
    pub name: String,

    /// Countdown period.
    #[serde(with = "humantime_serde")]
    pub period: Duration,

    /// Scanner that processes the timer.
    #[serde(default)]
    pub mode: TimerMode,

    /// Rearm on every expiry.
    #[serde(default)]
    pub restart: bool,
}

impl TimerSpec {
    /// Period expressed in ticks of `tick_period`, rounded up.
    #[must_use]
    pub fn period_ticks(&self, tick_period: Duration) -> Ticks {
        ticks_from_duration(self.period, tick_period)
    }
}

impl TimerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check the configuration against a table of `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero tick period, more timers
    /// than slots, or a period longer than the wrap-safe interval.
    pub fn validate(&self, capacity: usize) -> Result<(), ConfigError> {
        if self.tick_period.is_zero() {
            return Err(ConfigError::Invalid("tick_period must be non-zero".into()));
        }
        if self.timers.len() > capacity {
            return Err(ConfigError::Invalid(format!(
                "{} timers configured but the table holds {capacity}",
                self.timers.len()
            )));
        }
        for spec in &self.timers {
            if spec.period_ticks(self.tick_period) > crate::time::MAX_SAFE_INTERVAL {
                return Err(ConfigError::Invalid(format!(
                    "timer '{}' period exceeds the wrap-safe interval",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantically invalid configuration.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Same as [`humantime_serde`] for optional durations.
mod humantime_serde_opt {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => super::humantime_serde::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
