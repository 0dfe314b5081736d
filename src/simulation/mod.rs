//! Simulation payload model
//!
//! Holds the operator-adjustable feature values plus the two optional fields:
//! `lsf`, derived from `limestone_pct` and never entered by hand, and
//! `target_strength`, entered by hand and never used in derivations.

use tracing::{debug, warn};

use crate::types::{
    round_to, slider_for, FeatureKey, SimulationPayload, SliderConfig, INITIAL_TARGET_STRENGTH,
};

/// Lime saturation factor derived from the limestone percentage, 4 decimal places.
pub fn compute_lsf(limestone_pct: f64) -> f64 {
    round_to(0.8 * limestone_pct / 100.0, 4)
}

/// Owned simulation payload with the `lsf` coupling enforced on every write.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationModel {
    payload: SimulationPayload,
}

impl Default for SimulationModel {
    fn default() -> Self {
        let mut payload = SimulationPayload::default();
        payload.lsf = Some(compute_lsf(payload.limestone_pct));
        Self { payload }
    }
}

impl SimulationModel {
    /// Current value of a feature.
    pub const fn value(&self, key: FeatureKey) -> f64 {
        self.payload.get(key)
    }

    /// Current derived `lsf`.
    pub fn lsf(&self) -> f64 {
        self.payload
            .lsf
            .unwrap_or_else(|| compute_lsf(self.payload.limestone_pct))
    }

    pub const fn target_strength(&self) -> Option<f64> {
        self.payload.target_strength
    }

    /// Read-only view of the payload as last edited.
    pub const fn payload(&self) -> &SimulationPayload {
        &self.payload
    }

    /// Free-form numeric entry. Accepted as given, bounds are the caller's concern.
    pub fn set(&mut self, key: FeatureKey, value: f64) {
        self.payload.put(key, value);
        if key == FeatureKey::LimestonePct {
            self.payload.lsf = Some(compute_lsf(value));
        }
    }

    /// Slider entry: snapped to the setting's range and step when one exists.
    pub fn set_from_slider(&mut self, sliders: &SliderConfig, key: FeatureKey, raw: f64) -> f64 {
        let value = slider_for(sliders, key).map_or(raw, |setting| setting.snap(raw));
        self.set(key, value);
        value
    }

    pub fn set_target_strength(&mut self, value: Option<f64>) {
        self.payload.target_strength = value;
    }

    /// Reset every field to the configured slider defaults.
    ///
    /// Keys without a setting fall back to their hard-coded initial value;
    /// `target_strength` goes back to its initial value too.
    pub fn apply_defaults(&mut self, sliders: &SliderConfig) {
        for key in FeatureKey::ALL {
            let value = match slider_for(sliders, key) {
                Some(setting) => {
                    if let Err(reason) = setting.is_consistent() {
                        warn!(feature = %key, %reason, "Inconsistent slider setting from backend");
                    }
                    setting.default
                }
                None => key.initial_value(),
            };
            self.payload.put(key, value);
        }
        self.payload.target_strength = Some(INITIAL_TARGET_STRENGTH);
        self.payload.lsf = Some(compute_lsf(self.payload.limestone_pct));
        debug!(
            limestone_pct = self.payload.limestone_pct,
            lsf = self.lsf(),
            "Simulation defaults applied"
        );
    }

    /// Payload to submit, with `lsf` recomputed from the current limestone value.
    pub fn snapshot_for_submission(&self) -> SimulationPayload {
        SimulationPayload {
            lsf: Some(compute_lsf(self.payload.limestone_pct)),
            ..self.payload.clone()
        }
    }
}
