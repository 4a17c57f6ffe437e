//! Service settings.

use chrono_tz::Tz;
use gastro_core::occupancy::DEFAULT_SLACK_THRESHOLD;
use gastro_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Time zone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Europe/Madrid";

/// Settings of the back-office operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// IANA zone in which calendar days and service hours are evaluated.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Day occupancy below which a day counts as slack.
    #[serde(default = "default_slack_threshold")]
    pub slack_threshold: u32,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_slack_threshold() -> u32 {
    DEFAULT_SLACK_THRESHOLD
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            slack_threshold: default_slack_threshold(),
        }
    }
}

impl ServiceConfig {
    /// Parses the configured time zone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|e| Error::config(format!("unknown timezone '{}': {e}", self.timezone)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timezone_parses() {
        assert_eq!(ServiceConfig::default().tz().unwrap(), chrono_tz::Europe::Madrid);
    }

    #[test]
    fn test_unknown_timezone() {
        let config = ServiceConfig {
            timezone: "Mars/Olympus".into(),
            ..ServiceConfig::default()
        };
        assert!(matches!(config.tz(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_partial_config_defaults() {
        let config: ServiceConfig = serde_json::from_str(r#"{"slack_threshold": 30}"#).unwrap();
        assert_eq!(config.timezone, DEFAULT_TIMEZONE);
        assert_eq!(config.slack_threshold, 30);
    }
}
