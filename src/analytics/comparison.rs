//! Current simulation inputs against dataset averages

use serde::Serialize;

use crate::types::{finite_cell, round_to, DatasetRow, FeatureKey, SimulationPayload};

/// Dataset average and current value for one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub key: FeatureKey,
    pub feature: &'static str,
    pub average: f64,
    pub current: f64,
}

/// Compare each feature's current value with its mean across `rows`.
///
/// Keys are visited in fixed chart order; a key with no finite value in any
/// row is omitted. Both numbers are rounded to 3 decimals.
pub fn compare_features(rows: &[DatasetRow], current: &SimulationPayload) -> Vec<ComparisonRow> {
    FeatureKey::ALL
        .into_iter()
        .filter_map(|key| {
            let (total, count) = rows
                .iter()
                .filter_map(|row| finite_cell(row, key.as_str()))
                .fold((0.0, 0_usize), |(total, count), v| (total + v, count + 1));

            if count == 0 {
                return None;
            }

            #[allow(clippy::cast_precision_loss)]
            let average = total / count as f64;
            Some(ComparisonRow {
                key,
                feature: key.label(),
                average: round_to(average, 3),
                current: round_to(current.get(key), 3),
            })
        })
        .collect()
}
