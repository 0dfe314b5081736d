//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Backend
// ============================================================================

/// Backend base URL when neither the config file nor the environment sets one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "QUALITY_API_BASE_URL";

// ============================================================================
// Config File
// ============================================================================

/// Environment variable naming an explicit TOML config path.
pub const CONFIG_PATH_ENV: &str = "QUALITY_SIM_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "quality_sim.toml";

// ============================================================================
// Prediction
// ============================================================================

/// Minimum time a prediction stays in flight (ms).
///
/// Gives the processing animation its full run even when the backend
/// answers instantly. Slower responses are never truncated.
pub const MIN_PREDICTION_DURATION_MS: u64 = 2_500;
