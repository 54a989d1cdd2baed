//! Configuration loading and typed config structures for Lookback.
//!
//! The canonical configuration lives in `lookback-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure and provides a loader with environment overrides,
//! so a missing file or an empty document still yields a runnable
//! service.

use std::path::Path;

use chrono::TimeDelta;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `lookback-config.yaml`. Every field has a
/// default matching the documented service contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Rolling window settings.
    #[serde(default)]
    pub window: WindowConfig,
}

impl ServiceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listener:
    /// - `LOOKBACK_HTTP_HOST` overrides `http.host`
    /// - `LOOKBACK_HTTP_PORT` overrides `http.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.http.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.http.apply_env_overrides();
        Ok(config)
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Host address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_http_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl HttpConfig {
    /// Override listener settings with environment variables when set.
    ///
    /// This lets a container runtime repoint the service without
    /// modifying the YAML config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LOOKBACK_HTTP_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("LOOKBACK_HTTP_PORT") {
            match val.parse() {
                Ok(port) => self.port = port,
                Err(e) => tracing::warn!(
                    value = val,
                    error = %e,
                    "Ignoring unparseable LOOKBACK_HTTP_PORT"
                ),
            }
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

/// Rolling window configuration.
///
/// The service contract is a trailing one-hour window; `duration_secs`
/// is an operational tuning knob, not a new window type. The window is
/// always a single fixed trailing duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowConfig {
    /// Window width in seconds.
    #[serde(default = "default_window_duration_secs")]
    pub duration_secs: i64,
}

impl WindowConfig {
    /// The window width as a [`TimeDelta`], if representable.
    ///
    /// Returns `None` when `duration_secs` falls outside the range chrono
    /// can represent. Positivity is enforced by the store constructor,
    /// not here.
    pub const fn duration(self) -> Option<TimeDelta> {
        TimeDelta::new(self.duration_secs, 0)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_window_duration_secs(),
        }
    }
}

fn default_http_host() -> String {
    String::from("0.0.0.0")
}

const fn default_http_port() -> u16 {
    8080
}

const fn default_window_duration_secs() -> i64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServiceConfig::default();
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.window.duration_secs, 3600);
    }

    #[test]
    fn default_window_is_one_hour() {
        let config = WindowConfig::default();
        assert_eq!(config.duration(), Some(TimeDelta::hours(1)));
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
http:
  host: "127.0.0.1"
  port: 9090

window:
  duration_secs: 600
"#;

        let config = ServiceConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_else(ServiceConfig::default);

        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 9090);
        assert_eq!(config.window.duration_secs, 600);
        assert_eq!(config.window.duration(), Some(TimeDelta::minutes(10)));
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "http:\n  port: 3000\n";
        let config = ServiceConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_else(ServiceConfig::default);

        // Port is overridden
        assert_eq!(config.http.port, 3000);
        // Everything else uses defaults
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.window.duration_secs, 3600);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = ServiceConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn out_of_range_duration_has_no_delta() {
        let config = WindowConfig {
            duration_secs: i64::MAX,
        };
        assert!(config.duration().is_none());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("lookback-config.yaml");
        if path.exists() {
            let config = ServiceConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
