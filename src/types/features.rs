//! Simulation feature keys and their grouping

use serde::{Deserialize, Serialize};

/// Initial target strength shown to the operator before any configuration lands (MPa)
pub const INITIAL_TARGET_STRENGTH: f64 = 3.8;

/// Target column used for the trend series when the backend has not declared one
pub const DEFAULT_TARGET_COLUMN: &str = "strength_28d";

// ============================================================================
// Feature Keys
// ============================================================================

/// Operator-adjustable simulation field.
///
/// The declaration order is the fixed chart order used by the feature
/// comparison view: Raw Mix Lab, then Kiln, then Grinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    LimestonePct,
    SilicaPct,
    #[serde(rename = "al2o3_pct")]
    Al2o3Pct,
    #[serde(rename = "fe2o3_pct")]
    Fe2o3Pct,
    KilnTemp,
    FuelRate,
    #[serde(rename = "o2")]
    O2,
    CoolingRate,
    Blaine,
    MillPower,
}

impl FeatureKey {
    /// All keys in fixed chart order.
    pub const ALL: [Self; 10] = [
        Self::LimestonePct,
        Self::SilicaPct,
        Self::Al2o3Pct,
        Self::Fe2o3Pct,
        Self::KilnTemp,
        Self::FuelRate,
        Self::O2,
        Self::CoolingRate,
        Self::Blaine,
        Self::MillPower,
    ];

    /// Column / JSON field name used by the backend.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LimestonePct => "limestone_pct",
            Self::SilicaPct => "silica_pct",
            Self::Al2o3Pct => "al2o3_pct",
            Self::Fe2o3Pct => "fe2o3_pct",
            Self::KilnTemp => "kiln_temp",
            Self::FuelRate => "fuel_rate",
            Self::O2 => "o2",
            Self::CoolingRate => "cooling_rate",
            Self::Blaine => "blaine",
            Self::MillPower => "mill_power",
        }
    }

    /// Operator-facing label with units.
    pub const fn label(self) -> &'static str {
        match self {
            Self::LimestonePct => "Limestone (%)",
            Self::SilicaPct => "Silica (%)",
            Self::Al2o3Pct => "Al₂O₃ (%)",
            Self::Fe2o3Pct => "Fe₂O₃ (%)",
            Self::KilnTemp => "Kiln Temp (°C)",
            Self::FuelRate => "Fuel Rate (t/hr)",
            Self::O2 => "O₂ (%)",
            Self::CoolingRate => "Cooling Rate",
            Self::Blaine => "Blaine",
            Self::MillPower => "Mill Power (kW)",
        }
    }

    /// Hard-coded value used when the configuration carries no slider setting.
    pub const fn initial_value(self) -> f64 {
        match self {
            Self::LimestonePct => 80.0,
            Self::SilicaPct => 5.0,
            Self::Al2o3Pct | Self::Fe2o3Pct => 2.0,
            Self::KilnTemp => 1425.0,
            Self::FuelRate | Self::O2 => 4.5,
            Self::CoolingRate => 3.2,
            Self::Blaine => 320.0,
            Self::MillPower => 2200.0,
        }
    }

    /// Process stage this key belongs to.
    pub const fn group(self) -> FeatureGroup {
        match self {
            Self::LimestonePct | Self::SilicaPct | Self::Al2o3Pct | Self::Fe2o3Pct => {
                FeatureGroup::RawMix
            }
            Self::KilnTemp | Self::FuelRate | Self::O2 | Self::CoolingRate => FeatureGroup::Kiln,
            Self::Blaine | Self::MillPower => FeatureGroup::Grinding,
        }
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeatureKey {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFeature(wanted.to_string()))
    }
}

/// Returned when a string does not name a simulation feature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature '{0}' (expected one of: limestone_pct, silica_pct, al2o3_pct, fe2o3_pct, kiln_temp, fuel_rate, o2, cooling_rate, blaine, mill_power)")]
pub struct UnknownFeature(pub String);

// ============================================================================
// Feature Groups
// ============================================================================

/// Process stage grouping for the simulation sliders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureGroup {
    RawMix,
    Kiln,
    Grinding,
}

impl FeatureGroup {
    pub const ALL: [Self; 3] = [Self::RawMix, Self::Kiln, Self::Grinding];

    pub const fn title(self) -> &'static str {
        match self {
            Self::RawMix => "Raw Mix Lab",
            Self::Kiln => "Kiln",
            Self::Grinding => "Grinding",
        }
    }

    /// Keys of this group, in chart order.
    pub fn keys(self) -> impl Iterator<Item = FeatureKey> {
        FeatureKey::ALL.into_iter().filter(move |key| key.group() == self)
    }
}

impl std::fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_cover_every_key_once_in_chart_order() {
        let flattened: Vec<FeatureKey> = FeatureGroup::ALL
            .into_iter()
            .flat_map(FeatureGroup::keys)
            .collect();
        assert_eq!(flattened, FeatureKey::ALL.to_vec());
    }

    #[test]
    fn wire_names_match_serde() {
        for key in FeatureKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("KILN_TEMP".parse::<FeatureKey>(), Ok(FeatureKey::KilnTemp));
        assert_eq!(" o2 ".parse::<FeatureKey>(), Ok(FeatureKey::O2));
        assert!("lsf".parse::<FeatureKey>().is_err());
    }
}
