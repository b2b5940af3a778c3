use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cubic feet in one acre-foot.
pub const CUBIC_FEET_PER_ACRE_FOOT: f64 = 43_560.0;

/// US gallons in one acre-foot.
pub const GALLONS_PER_ACRE_FOOT: f64 = 325_851.0;

/// The unit a well's totalizer counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MeterUnit {
    #[default]
    AcreFeet,
    AcreInches,
    Gallons,
    ThousandGallons,
    CubicFeet,
    /// CCF, the usual billing unit for small meters
    HundredCubicFeet,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown meter unit '{0}'")]
pub struct UnknownUnit(pub String);

impl MeterUnit {
    /// How many meter units make up one acre-foot.
    pub fn units_per_acre_foot(&self) -> f64 {
        match self {
            MeterUnit::AcreFeet => 1.0,
            MeterUnit::AcreInches => 12.0,
            MeterUnit::Gallons => GALLONS_PER_ACRE_FOOT,
            MeterUnit::ThousandGallons => GALLONS_PER_ACRE_FOOT / 1_000.0,
            MeterUnit::CubicFeet => CUBIC_FEET_PER_ACRE_FOOT,
            MeterUnit::HundredCubicFeet => CUBIC_FEET_PER_ACRE_FOOT / 100.0,
        }
    }
}

/// Convert a raw totalizer delta into acre-feet.
///
/// This is the only place rounding can enter: the delta is scaled by the
/// well's register multiplier and divided by the unit factor exactly once,
/// so the result is reproducible from the stored raw values.
pub fn to_acre_feet(raw_delta: f64, unit: MeterUnit, multiplier: f64) -> f64 {
    raw_delta * multiplier / unit.units_per_acre_foot()
}

impl FromStr for MeterUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "af" | "acre_feet" | "acre_foot" => Ok(MeterUnit::AcreFeet),
            "ai" | "acre_inches" | "acre_inch" => Ok(MeterUnit::AcreInches),
            "gal" | "gallons" => Ok(MeterUnit::Gallons),
            "kgal" | "thousand_gallons" => Ok(MeterUnit::ThousandGallons),
            "cf" | "ft3" | "cubic_feet" => Ok(MeterUnit::CubicFeet),
            "ccf" | "hcf" | "hundred_cubic_feet" => Ok(MeterUnit::HundredCubicFeet),
            _ => Err(UnknownUnit(s.to_string())),
        }
    }
}

impl fmt::Display for MeterUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MeterUnit::AcreFeet => "AF",
            MeterUnit::AcreInches => "AI",
            MeterUnit::Gallons => "gal",
            MeterUnit::ThousandGallons => "kgal",
            MeterUnit::CubicFeet => "cf",
            MeterUnit::HundredCubicFeet => "CCF",
        };
        write!(f, "{}", label)
    }
}
