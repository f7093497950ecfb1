// Platform configuration (environment driven)
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::application::constants::DEFAULT_CALIBRATION_WINDOW_MS;
use crate::error::PlatformError;

pub const ENV_LOG_FORMAT: &str = "KEYSTONE_LOG_FORMAT";
pub const ENV_CALIBRATION_MS: &str = "KEYSTONE_CALIBRATION_MS";
pub const ENV_SKIP_CALIBRATION: &str = "KEYSTONE_SKIP_CALIBRATION";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Development: pretty formatting with colors
    #[default]
    Pretty,
    /// Production: JSON structured logging
    Json,
}

impl FromStr for LogFormat {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(PlatformError::Config(format!("unknown log format: {other}"))),
        }
    }
}

/// Runtime settings for the platform layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub log_format: LogFormat,
    /// Busy-wait window used to calibrate the timestamp counter
    pub calibration_window: Duration,
    /// Leave the clock frequency undetermined instead of calibrating
    pub skip_calibration: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            calibration_window: Duration::from_millis(DEFAULT_CALIBRATION_WINDOW_MS),
            skip_calibration: false,
        }
    }
}

impl PlatformConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    ///
    /// Invalid values are logged and replaced by their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_format = lookup(ENV_LOG_FORMAT)
            .and_then(|raw| match raw.parse::<LogFormat>() {
                Ok(format) => Some(format),
                Err(e) => {
                    warn!(error = %e, "Ignoring {}", ENV_LOG_FORMAT);
                    None
                }
            })
            .unwrap_or(defaults.log_format);

        let calibration_window = lookup(ENV_CALIBRATION_MS)
            .and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
                _ => {
                    warn!(value = %raw, "Ignoring {}, expected milliseconds > 0", ENV_CALIBRATION_MS);
                    None
                }
            })
            .unwrap_or(defaults.calibration_window);

        let skip_calibration = lookup(ENV_SKIP_CALIBRATION)
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.skip_calibration);

        Self {
            log_format,
            calibration_window,
            skip_calibration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = PlatformConfig::from_lookup(|_| None);
        assert_eq!(config, PlatformConfig::default());
        assert_eq!(config.calibration_window, Duration::from_millis(750));
    }

    #[test]
    fn test_reads_all_variables() {
        let config = PlatformConfig::from_lookup(lookup_from(&[
            (ENV_LOG_FORMAT, "JSON"),
            (ENV_CALIBRATION_MS, "200"),
            (ENV_SKIP_CALIBRATION, "true"),
        ]));

        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.calibration_window, Duration::from_millis(200));
        assert!(config.skip_calibration);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = PlatformConfig::from_lookup(lookup_from(&[
            (ENV_LOG_FORMAT, "xml"),
            (ENV_CALIBRATION_MS, "0"),
            (ENV_SKIP_CALIBRATION, "nope"),
        ]));

        assert_eq!(config, PlatformConfig::default());
    }

    #[test]
    fn test_log_format_parse_error() {
        let err = "yaml".parse::<LogFormat>().unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
        assert_eq!(err.to_string(), "Configuration error: unknown log format: yaml");
    }
}
