//! Derived Analytics Engine
//!
//! Three independent, pure projections over the session state:
//!
//! - **Impact ranking**: SHAP contributions by descending absolute value
//! - **Trend series**: historical target strength plus the live prediction
//! - **Feature comparison**: current inputs against dataset averages
//!
//! None of them mutate their inputs. [`AnalyticsCache`] memoizes each view
//! on the revisions of the state it reads.

mod comparison;
mod impact;
mod trend;

pub use comparison::{compare_features, ComparisonRow};
pub use impact::{rank_impacts, ImpactRow};
pub use trend::{build_trend, TrendPoint};

use crate::types::{DatasetRow, PredictionResponse, SimulationPayload};

/// Single-entry memo: recomputes only when the key changes.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    entry: Option<(K, V)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> &V {
        if !self.is_cached(&key) {
            self.entry = None;
        }
        &self.entry.get_or_insert_with(|| (key, compute())).1
    }

    pub fn is_cached(&self, key: &K) -> bool {
        self.entry.as_ref().is_some_and(|(cached, _)| cached == key)
    }
}

/// Revision counters of the state the views read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revisions {
    pub prediction: u64,
    pub rows: u64,
    pub payload: u64,
}

/// Inputs of the three views, borrowed from the session.
pub struct AnalyticsInputs<'a> {
    pub revisions: Revisions,
    pub prediction: Option<&'a PredictionResponse>,
    pub rows: &'a [DatasetRow],
    pub target_column: &'a str,
    pub payload: &'a SimulationPayload,
}

/// Memoized analytics views
#[derive(Debug, Default)]
pub struct AnalyticsCache {
    impact: Memo<u64, Vec<ImpactRow>>,
    trend: Memo<(u64, u64), Vec<TrendPoint>>,
    comparison: Memo<(u64, u64), Vec<ComparisonRow>>,
}

impl AnalyticsCache {
    pub fn impact_ranking(&mut self, inputs: &AnalyticsInputs<'_>) -> &[ImpactRow] {
        self.impact.get_or_compute(inputs.revisions.prediction, || {
            inputs
                .prediction
                .map(|p| rank_impacts(&p.shap_contributions))
                .unwrap_or_default()
        })
    }

    pub fn trend_series(&mut self, inputs: &AnalyticsInputs<'_>) -> &[TrendPoint] {
        let key = (inputs.revisions.rows, inputs.revisions.prediction);
        self.trend.get_or_compute(key, || {
            build_trend(inputs.rows, inputs.target_column, inputs.prediction)
        })
    }

    pub fn feature_comparison(&mut self, inputs: &AnalyticsInputs<'_>) -> &[ComparisonRow] {
        let key = (inputs.revisions.rows, inputs.revisions.payload);
        self.comparison
            .get_or_compute(key, || compare_features(inputs.rows, inputs.payload))
    }
}
