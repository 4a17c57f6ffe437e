//! Logger setup.
//!
//! `twyg` owns the global `log` logger; `tracing` events reach it through
//! the `log` feature, so no subscriber is installed.

use crate::config::LoggingSettings;
use crate::error::{Error, Result};
use twyg::{LogLevel, OptsBuilder};

/// Maps a configured level name to a `twyg` level.
pub fn parse_level(level: &str) -> Result<LogLevel> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" | "" => Ok(LogLevel::Info),
        "warn" | "warning" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        other => Err(Error::config(format!("Unknown log level '{other}'"))),
    }
}

/// Installs the global logger. A logger that is already set is kept.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let opts = OptsBuilder::new()
        .coloured(settings.coloured)
        .level(parse_level(&settings.level)?)
        .report_caller(settings.report_caller)
        .build()
        .map_err(|e| Error::config(format!("Invalid logging settings: {e}")))?;

    if let Err(e) = twyg::setup(opts) {
        log::debug!("logger already installed: {e}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert!(matches!(parse_level("DEBUG").unwrap(), LogLevel::Debug));
        assert!(matches!(parse_level(" warning ").unwrap(), LogLevel::Warn));
        assert!(matches!(parse_level("").unwrap(), LogLevel::Info));
        assert!(parse_level("loud").is_err());
    }
}
