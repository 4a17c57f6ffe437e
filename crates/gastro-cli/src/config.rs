//! The `gastro` configuration file.
//!
//! Values come from, in increasing priority: built-in defaults, the TOML
//! file, and `GASTRO_<SECTION>_<KEY>` environment variables
//! (`GASTRO_BACKEND_API_KEY` sets `backend.api_key`). `confyg` merges the
//! layers.

use crate::error::{Error, Result};
use confyg::{Confygery, env};
use gastro_api::ServerConfig;
use gastro_core::UserId;
use gastro_service::{ServiceConfig, WebhookConfig};
use gastro_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project name, used for the config directory and messages.
pub const PROJECT_NAME: &str = "gastro";

/// Top-level name of the environment overrides; variables start `GASTRO_`.
pub const ENV_PREFIX: &str = "gastro";

/// Sections that environment variables may set.
pub const SECTIONS: &[&str] = &["server", "backend", "auth", "webhooks", "occupancy", "logging"];

/// Level used when the file sets none.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Authentication settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Require a bearer token on panel routes.
    pub enabled: bool,
    /// Only accept users of this email domain; empty accepts any.
    pub domain: String,
    /// Auth service URL; the backend URL when empty.
    pub url: String,
    /// Public (anon) key sent to the auth service.
    pub api_key: String,
    /// User assumed for panel requests while auth is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_user: Option<UserId>,
}

impl AuthSettings {
    /// Settings for the auth middleware.
    pub fn layer_config(&self) -> gastro_auth::AuthConfig {
        gastro_auth::AuthConfig {
            enabled: self.enabled,
            domain: self.domain.trim().to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
    /// Colour the output.
    pub coloured: bool,
    /// Include the emitting module and line.
    pub report_caller: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            coloured: true,
            report_caller: false,
        }
    }
}

/// Everything the binary can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GastroConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Persistence backend.
    pub backend: StoreConfig,
    /// Panel authentication.
    pub auth: AuthSettings,
    /// Workflow-automation webhooks.
    pub webhooks: WebhookConfig,
    /// Time zone and slack-day threshold.
    pub occupancy: ServiceConfig,
    /// Log output.
    pub logging: LoggingSettings,
}

impl GastroConfig {
    /// `config.toml` under the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(PROJECT_NAME).join("config.toml"))
    }

    /// The explicit path if given, else the default one.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        match explicit {
            Some(p) => Some(PathBuf::from(p)),
            None => Self::default_config_path(),
        }
    }

    /// Loads the file (if any) and applies the process environment.
    ///
    /// A missing default file means defaults; a missing explicit file is an
    /// error.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let file = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Some(path),
            Some(path) if explicit.is_some() => {
                return Err(Error::config(format!(
                    "Config file does not exist at {}",
                    path.display()
                )));
            }
            _ => None,
        };
        Self::build(file.as_deref(), Some(env_options()))
    }

    /// Merges the file, then the environment, over the defaults.
    pub fn build(file: Option<&Path>, env: Option<env::Options>) -> Result<Self> {
        let invalid = |e: confyg::ConfigError| Error::config(format!("Invalid configuration: {e}"));
        let mut builder = Confygery::new().map_err(invalid)?;
        if let Some(path) = file {
            let path = path.to_string_lossy();
            builder.add_file(&path).map_err(invalid)?;
        }
        if let Some(opts) = env {
            builder.add_env(opts).map_err(invalid)?;
        }
        builder
            .build()
            .map_err(|e| Error::config(format!("Invalid configuration: {e}")))
    }

    /// Parses a config file, ignoring the environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Pretty TOML for `config init`.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Every setting as `(GASTRO_SECTION_KEY, value)`, by section.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let tree = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut out = Vec::new();
        for section in SECTIONS {
            let Some(table) = tree.get(*section).and_then(toml::Value::as_table) else {
                continue;
            };
            for (key, value) in table {
                out.push((env_name(section, key), env_value(value)));
            }
        }
        Ok(out)
    }
}

/// The `confyg` environment layer for every section.
pub fn env_options() -> env::Options {
    let mut opts = env::Options::with_top_level(ENV_PREFIX);
    for section in SECTIONS {
        opts.add_section(*section);
    }
    opts
}

/// `("server", "port")` → `GASTRO_SERVER_PORT`.
pub fn env_name(section: &str, key: &str) -> String {
    format!("{ENV_PREFIX}_{section}_{key}").to_uppercase()
}

fn env_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(items) => items
            .iter()
            .map(env_value)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
