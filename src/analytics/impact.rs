//! Feature impact ranking from SHAP contributions

use serde::Serialize;

use crate::types::ShapContribution;

/// One SHAP contribution annotated with its absolute impact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactRow {
    pub feature: String,
    pub shap_value: f64,
    pub actual_value: f64,
    /// `abs(shap_value)`
    pub impact: f64,
}

/// Rank contributions by descending absolute SHAP value.
///
/// The sort is stable: equal impacts keep their input order.
pub fn rank_impacts(contributions: &[ShapContribution]) -> Vec<ImpactRow> {
    let mut rows: Vec<ImpactRow> = contributions
        .iter()
        .map(|c| ImpactRow {
            feature: c.feature.clone(),
            shap_value: c.shap_value,
            actual_value: c.actual_value,
            impact: c.shap_value.abs(),
        })
        .collect();
    rows.sort_by(|a, b| b.impact.total_cmp(&a.impact));
    rows
}
