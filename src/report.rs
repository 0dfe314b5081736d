//! Text and JSON rendering of session state for the CLI

use serde::Serialize;

use crate::analytics::{ComparisonRow, ImpactRow, TrendPoint};
use crate::orchestrator::ErrorBanner;
use crate::types::{
    slider_for, DatasetRow, FeatureGroup, MetricsRecord, PredictionResponse, SimulationPayload,
    SliderConfig, Status,
};

/// Rows shown in the dataset preview
pub const SAMPLE_PREVIEW_ROWS: usize = 5;

/// Everything `predict --json` prints.
#[derive(Debug, Serialize)]
pub struct AnalyticsReport<'a> {
    pub status: Status,
    /// Raised banner, if any
    pub error: Option<ErrorBanner>,
    pub error_message: Option<&'static str>,
    pub payload: &'a SimulationPayload,
    pub prediction: Option<&'a PredictionResponse>,
    pub metrics: Option<&'a MetricsRecord>,
    pub impact: Vec<ImpactRow>,
    pub trend: Vec<TrendPoint>,
    pub comparison: Vec<ComparisonRow>,
}

/// Status line plus the error banner when one is raised.
pub fn format_status(status: Status, error: Option<ErrorBanner>) -> String {
    let mut out = format!("Status: {}", status.label());
    if let Some(banner) = error {
        out.push_str(&format!("\nError:  {banner}"));
    }
    out
}

pub fn format_metrics(metrics: Option<&MetricsRecord>) -> String {
    match metrics {
        Some(record) => format!(
            "Model metrics ({:?}, {}):\n  MAE {:.3}  MSE {:.3}  R2 {:.3}",
            record.source,
            record.received_at.format("%Y-%m-%d %H:%M:%S UTC"),
            record.metrics.mae,
            record.metrics.mse,
            record.metrics.r2,
        ),
        None => "Model metrics: none yet".to_string(),
    }
}

/// Dataset preview: the first [`SAMPLE_PREVIEW_ROWS`] rows over the feature
/// columns followed by the target column.
pub fn format_sample_rows(rows: &[DatasetRow], features: &[String], target: &str) -> String {
    if rows.is_empty() {
        return "Dataset preview: no rows".to_string();
    }

    let mut columns: Vec<&str> = features.iter().map(String::as_str).collect();
    if !columns.contains(&target) {
        columns.push(target);
    }

    let mut lines = vec![format!(
        "Dataset preview ({} of {} rows):",
        rows.len().min(SAMPLE_PREVIEW_ROWS),
        rows.len()
    )];
    lines.push(
        columns
            .iter()
            .map(|c| format!("{c:>14}"))
            .collect::<Vec<_>>()
            .join(" "),
    );
    for row in rows.iter().take(SAMPLE_PREVIEW_ROWS) {
        lines.push(
            columns
                .iter()
                .map(|c| {
                    let cell = row.get(*c).map_or_else(|| "-".to_string(), ToString::to_string);
                    format!("{cell:>14}")
                })
                .collect::<Vec<_>>()
                .join(" "),
        );
    }
    lines.join("\n")
}

/// Feature catalogue by group, with slider bounds when configured.
pub fn format_features(sliders: &SliderConfig) -> String {
    let mut sections = Vec::new();
    for group in FeatureGroup::ALL {
        let mut lines = vec![format!("{}:", group.title())];
        for key in group.keys() {
            let bounds = slider_for(sliders, key).map_or_else(
                || "no slider bounds".to_string(),
                |s| format!("{} ..= {} step {} (default {})", s.min, s.max, s.step, s.default),
            );
            lines.push(format!(
                "  {:<14} {:<28} initial {:<8} {}",
                key.as_str(),
                key.label(),
                key.initial_value(),
                bounds
            ));
        }
        sections.push(lines.join("\n"));
    }
    sections.join("\n\n")
}

pub fn format_prediction(prediction: &PredictionResponse) -> String {
    let mut lines = vec![format!(
        "Predicted strength: {:.2} {} [{} / {}]",
        prediction.predicted_strength,
        prediction.strength_units,
        prediction.quality_label,
        prediction.quality_color,
    )];
    if let Some(delta) = prediction.delta_to_target {
        let sign = if delta > 0.0 { "+" } else { "" };
        lines.push(format!("Delta to target: {sign}{delta:.2} {}", prediction.strength_units));
    }
    if let Some(base) = prediction.shap_base_value {
        lines.push(format!("SHAP base value: {base:.3}"));
    }
    if !prediction.top_features.is_empty() {
        lines.push(format!("Top features: {}", prediction.top_features.join(", ")));
    }
    if !prediction.suggestions.is_empty() {
        lines.push("Suggestions:".to_string());
        for suggestion in &prediction.suggestions {
            lines.push(format!("  - {suggestion}"));
        }
    }
    lines.join("\n")
}

pub fn format_impacts(rows: &[ImpactRow]) -> String {
    if rows.is_empty() {
        return "Feature impact: no contributions".to_string();
    }
    let mut lines = vec!["Feature impact:".to_string()];
    for row in rows {
        lines.push(format!(
            "  {:<16} shap {:>+9.4}  value {:>10.3}",
            row.feature, row.shap_value, row.actual_value
        ));
    }
    lines.join("\n")
}

pub fn format_trend(points: &[TrendPoint]) -> String {
    if points.is_empty() {
        return "Strength trend: no data".to_string();
    }
    let series = points
        .iter()
        .map(|p| format!("{}:{:.2}", p.index, p.strength))
        .collect::<Vec<_>>()
        .join(" ");
    format!("Strength trend ({} points): {series}", points.len())
}

pub fn format_comparison(rows: &[ComparisonRow]) -> String {
    if rows.is_empty() {
        return "Feature comparison: no dataset averages".to_string();
    }
    let mut lines = vec!["Current vs dataset average:".to_string()];
    for row in rows {
        lines.push(format!(
            "  {:<28} avg {:>10.3}  current {:>10.3}",
            row.feature, row.average, row.current
        ));
    }
    lines.join("\n")
}
