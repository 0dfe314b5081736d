//! Client configuration loaded from TOML with environment overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::defaults::{
    BASE_URL_ENV, CONFIG_PATH_ENV, DEFAULT_BASE_URL, LOCAL_CONFIG_FILE,
    MIN_PREDICTION_DURATION_MS,
};

/// Runtime settings for talking to the prediction backend.
///
/// Loading order:
/// 1. `$QUALITY_SIM_CONFIG` env var
/// 2. `./quality_sim.toml`
/// 3. Built-in defaults
///
/// `$QUALITY_API_BASE_URL` then overrides `base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Backend root, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Minimum prediction duration in milliseconds
    pub min_prediction_duration_ms: u64,

    /// Optional per-request timeout; unset means requests never time out
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            min_prediction_duration_ms: MIN_PREDICTION_DURATION_MS,
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration using the standard search order.
    ///
    /// Never fails: unreadable or invalid files are logged and skipped.
    pub fn load() -> Self {
        let mut config = Self::load_file_or_default();
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            config.apply_base_url_override(&url);
        }
        config
    }

    fn load_file_or_default() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), base_url = %config.base_url, "Loaded client config from QUALITY_SIM_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from QUALITY_SIM_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "QUALITY_SIM_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./quality_sim.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(base_url = %config.base_url, "Loaded client config from ./quality_sim.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./quality_sim.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        Self::default()
    }

    /// Load from a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the base URL if the override is valid; invalid overrides are ignored.
    pub fn apply_base_url_override(&mut self, url: &str) {
        let candidate = Self {
            base_url: url.trim().to_string(),
            ..self.clone()
        };
        match candidate.validate() {
            Ok(()) => *self = candidate,
            Err(e) => warn!(url = %url, error = %e, "Ignoring invalid base URL override"),
        }
    }

    /// Check all fields, collecting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            errors.push(format!(
                "base_url '{}' must start with http:// or https://",
                self.base_url
            ));
        }
        if self.request_timeout_secs == Some(0) {
            errors.push("request_timeout_secs must be > 0 when set".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    pub const fn min_prediction_duration(&self) -> Duration {
        Duration::from_millis(self.min_prediction_duration_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_prediction_duration(), Duration::from_millis(2_500));
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_toml("base_url = \"https://quality.plant.local\"\n");
        let config = ClientConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "https://quality.plant.local");
        assert_eq!(config.min_prediction_duration_ms, MIN_PREDICTION_DURATION_MS);
    }

    #[test]
    fn full_file_round_trips_all_fields() {
        let file = write_toml(
            "base_url = \"http://10.0.0.5:9000\"\nmin_prediction_duration_ms = 100\nrequest_timeout_secs = 45\n",
        );
        let config = ClientConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.min_prediction_duration(), Duration::from_millis(100));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(45)));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let file = write_toml("base_ur = \"http://x\"\n");
        let err = ClientConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
    }

    #[test]
    fn validation_collects_every_problem() {
        let file = write_toml("base_url = \"localhost:8000\"\nrequest_timeout_secs = 0\n");
        match ClientConfig::load_from_file(file.path()) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ClientConfig::load_from_file(Path::new("/nonexistent/quality_sim.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn invalid_base_url_override_is_ignored() {
        let mut config = ClientConfig::default();
        config.apply_base_url_override("ftp://nope");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        config.apply_base_url_override(" http://backend:8000 ");
        assert_eq!(config.base_url, "http://backend:8000");
    }
}
