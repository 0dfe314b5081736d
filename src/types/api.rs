//! Wire types exchanged with the prediction backend

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::features::{FeatureKey, DEFAULT_TARGET_COLUMN, INITIAL_TARGET_STRENGTH};

// ============================================================================
// Slider Configuration
// ============================================================================

/// Numeric bounds for one simulation field, supplied by `/config`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderSetting {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl SliderSetting {
    /// Clamp into `[min, max]` and quantize to the nearest `min + k * step`.
    pub fn snap(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min.min(self.max), self.max.max(self.min));
        if !(self.step > 0.0) {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        // Step multiples of 0.1 accumulate float noise; 6 places is below any slider resolution.
        round_to(self.min + steps * self.step, 6).min(self.max)
    }

    /// Whether `value` falls inside the slider range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check `min <= default <= max` and `step > 0`.
    pub fn is_consistent(&self) -> Result<(), String> {
        if !(self.min <= self.max) {
            return Err(format!("min {} exceeds max {}", self.min, self.max));
        }
        if !self.contains(self.default) {
            return Err(format!(
                "default {} outside [{}, {}]",
                self.default, self.min, self.max
            ));
        }
        if !(self.step > 0.0) {
            return Err(format!("step {} must be positive", self.step));
        }
        Ok(())
    }
}

/// Slider settings keyed by backend field name.
pub type SliderConfig = BTreeMap<String, SliderSetting>;

/// Look up the slider setting for a feature key.
pub fn slider_for(config: &SliderConfig, key: FeatureKey) -> Option<&SliderSetting> {
    config.get(key.as_str())
}

// ============================================================================
// Metrics
// ============================================================================

/// Hold-out quality of the last trained model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub mae: f64,
    pub mse: f64,
    pub r2: f64,
}

/// Which response last wrote the metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricsSource {
    Config,
    Training,
}

/// Metrics together with their owner and arrival time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub metrics: Metrics,
    pub source: MetricsSource,
    pub received_at: DateTime<Utc>,
}

impl MetricsRecord {
    pub fn new(metrics: Metrics, source: MetricsSource) -> Self {
        Self {
            metrics,
            source,
            received_at: Utc::now(),
        }
    }
}

// ============================================================================
// Dataset Rows
// ============================================================================

/// One cell of a historical dataset row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    /// Boolean column (pandas emits JSON booleans for `bool` dtypes)
    Bool(bool),
    Text(String),
    /// JSON `null` (pandas emits it for empty cells)
    Missing,
    /// Any other JSON value; kept for display, never numeric
    Other(serde_json::Value),
}

impl CellValue {
    /// Numeric coercion: finite numbers, booleans as 1/0, and numeric text.
    ///
    /// Unlike JavaScript `Number()`, empty text and `null` are not read as 0:
    /// a blank cell is missing data, not a zero reading.
    pub fn as_finite(&self) -> Option<f64> {
        let value = match self {
            Self::Number(v) => *v,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok()?
            }
            Self::Missing | Self::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v:.3}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("-"),
            Self::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Historical record, column name to value. Read-only once received.
pub type DatasetRow = BTreeMap<String, CellValue>;

/// Finite numeric value of `column` in `row`, if any.
pub fn finite_cell(row: &DatasetRow, column: &str) -> Option<f64> {
    row.get(column).and_then(CellValue::as_finite)
}

// ============================================================================
// Simulation Payload
// ============================================================================

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPayload {
    pub limestone_pct: f64,
    pub silica_pct: f64,
    pub al2o3_pct: f64,
    pub fe2o3_pct: f64,
    pub kiln_temp: f64,
    pub fuel_rate: f64,
    pub o2: f64,
    pub cooling_rate: f64,
    pub blaine: f64,
    pub mill_power: f64,
    /// Lime saturation factor, derived from `limestone_pct`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lsf: Option<f64>,
    /// Operator goal, used by the backend for delta messaging only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_strength: Option<f64>,
}

impl SimulationPayload {
    pub const fn get(&self, key: FeatureKey) -> f64 {
        match key {
            FeatureKey::LimestonePct => self.limestone_pct,
            FeatureKey::SilicaPct => self.silica_pct,
            FeatureKey::Al2o3Pct => self.al2o3_pct,
            FeatureKey::Fe2o3Pct => self.fe2o3_pct,
            FeatureKey::KilnTemp => self.kiln_temp,
            FeatureKey::FuelRate => self.fuel_rate,
            FeatureKey::O2 => self.o2,
            FeatureKey::CoolingRate => self.cooling_rate,
            FeatureKey::Blaine => self.blaine,
            FeatureKey::MillPower => self.mill_power,
        }
    }

    /// Raw field write. Does not touch `lsf`; go through `SimulationModel`
    /// to keep the derived field in step.
    pub(crate) fn put(&mut self, key: FeatureKey, value: f64) {
        let slot = match key {
            FeatureKey::LimestonePct => &mut self.limestone_pct,
            FeatureKey::SilicaPct => &mut self.silica_pct,
            FeatureKey::Al2o3Pct => &mut self.al2o3_pct,
            FeatureKey::Fe2o3Pct => &mut self.fe2o3_pct,
            FeatureKey::KilnTemp => &mut self.kiln_temp,
            FeatureKey::FuelRate => &mut self.fuel_rate,
            FeatureKey::O2 => &mut self.o2,
            FeatureKey::CoolingRate => &mut self.cooling_rate,
            FeatureKey::Blaine => &mut self.blaine,
            FeatureKey::MillPower => &mut self.mill_power,
        };
        *slot = value;
    }
}

impl Default for SimulationPayload {
    /// Hard-coded initial values, no `lsf` yet.
    fn default() -> Self {
        Self {
            limestone_pct: FeatureKey::LimestonePct.initial_value(),
            silica_pct: FeatureKey::SilicaPct.initial_value(),
            al2o3_pct: FeatureKey::Al2o3Pct.initial_value(),
            fe2o3_pct: FeatureKey::Fe2o3Pct.initial_value(),
            kiln_temp: FeatureKey::KilnTemp.initial_value(),
            fuel_rate: FeatureKey::FuelRate.initial_value(),
            o2: FeatureKey::O2.initial_value(),
            cooling_rate: FeatureKey::CoolingRate.initial_value(),
            blaine: FeatureKey::Blaine.initial_value(),
            mill_power: FeatureKey::MillPower.initial_value(),
            lsf: None,
            target_strength: Some(INITIAL_TARGET_STRENGTH),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

fn default_target() -> String {
    DEFAULT_TARGET_COLUMN.to_string()
}

/// `GET /config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub slider_config: SliderConfig,
    #[serde(default)]
    pub dataset_ready: bool,
    #[serde(default)]
    pub metrics: Option<Metrics>,
    #[serde(default)]
    pub sample_data: Option<Vec<DatasetRow>>,
}

/// `POST /train`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainResponse {
    #[serde(default)]
    pub message: String,
    pub metrics: Metrics,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default = "default_target")]
    pub target_name: String,
    #[serde(default)]
    pub sample_data: Vec<DatasetRow>,
}

/// Per-feature SHAP attribution for one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapContribution {
    pub feature: String,
    pub shap_value: f64,
    pub actual_value: f64,
}

fn default_units() -> String {
    "MPa".to_string()
}

/// `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_strength: f64,
    #[serde(default = "default_units")]
    pub strength_units: String,
    pub quality_label: String,
    pub quality_color: String,
    #[serde(default)]
    pub delta_to_target: Option<f64>,
    #[serde(default)]
    pub shap_base_value: Option<f64>,
    #[serde(default)]
    pub shap_contributions: Vec<ShapContribution>,
    #[serde(default)]
    pub top_features: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
