//! Strength trend series: historical target values plus the live prediction

use serde::Serialize;

use crate::types::{finite_cell, round_to, DatasetRow, PredictionResponse};

/// One point of the strength trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    /// 1-based position in the series
    pub index: usize,
    /// Strength rounded to 3 decimals
    pub strength: f64,
}

/// Build the trend series from dataset rows and the current prediction.
///
/// Rows whose `target_column` is not a finite number are dropped and the
/// remaining rows are numbered 1..=n in row order. A present prediction is
/// appended as point n + 1.
pub fn build_trend(
    rows: &[DatasetRow],
    target_column: &str,
    prediction: Option<&PredictionResponse>,
) -> Vec<TrendPoint> {
    let mut series: Vec<TrendPoint> = rows
        .iter()
        .filter_map(|row| finite_cell(row, target_column))
        .enumerate()
        .map(|(i, value)| TrendPoint {
            index: i + 1,
            strength: round_to(value, 3),
        })
        .collect();

    if let Some(prediction) = prediction {
        series.push(TrendPoint {
            index: series.len() + 1,
            strength: round_to(prediction.predicted_strength, 3),
        });
    }

    series
}
