//! Client Configuration Module
//!
//! Settings for reaching the prediction backend and pacing predictions,
//! loaded from a TOML file with environment overrides.
//!
//! ## Loading Order
//!
//! 1. `QUALITY_SIM_CONFIG` environment variable (path to TOML file)
//! 2. `quality_sim.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! `QUALITY_API_BASE_URL` overrides the base URL from any of the above.
//!
//! ## Example
//!
//! ```toml
//! base_url = "http://localhost:8000"
//! min_prediction_duration_ms = 2500
//! # request_timeout_secs = 60
//! ```

mod client_config;
pub mod defaults;

pub use client_config::*;
