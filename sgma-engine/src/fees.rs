//! Extraction fee pricing.
//!
//! Volume-based charges are computed per reading. The fixed periodic fee is
//! a billing-period charge; the pipeline decides whether a reading carries it
//! (see [`crate::pipeline`]).

use crate::error::{InvalidReason, ReadingError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// How often the fixed fee is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FixedFeePeriod {
    Quarterly,
    #[default]
    Annual,
}

/// Whether declared domestic volume is also billed at the base rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DomesticBasePolicy {
    /// Domestic volume is billed at the domestic rate only.
    #[default]
    Exempt,
    /// Base rate applies to the whole extraction, domestic included.
    ChargeAll,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for FixedFeePeriod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quarterly" | "quarter" | "q" => Ok(FixedFeePeriod::Quarterly),
            "annual" | "annually" | "year" | "yearly" => Ok(FixedFeePeriod::Annual),
            _ => Err(UnknownVariant {
                kind: "fixed fee period",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for DomesticBasePolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "exempt" => Ok(DomesticBasePolicy::Exempt),
            "charge_all" | "all" => Ok(DomesticBasePolicy::ChargeAll),
            _ => Err(UnknownVariant {
                kind: "domestic policy",
                value: s.to_string(),
            }),
        }
    }
}

/// A well's rates. Every component is optional and an unset component
/// prices at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RateSchedule {
    /// $/AF on irrigation volume
    pub base_rate: Option<f64>,
    /// $/AF GSP surcharge on all extraction
    pub gsp_rate: Option<f64>,
    /// $/AF on declared domestic volume
    pub domestic_rate: Option<f64>,
    /// $ per billing period, independent of volume
    pub fixed_fee: Option<f64>,
    pub fixed_fee_period: FixedFeePeriod,
    /// Overrides the engine-wide default when set.
    pub domestic_policy: Option<DomesticBasePolicy>,
}

impl RateSchedule {
    /// True when the schedule carries a non-zero fixed fee.
    pub fn has_fixed_fee(&self) -> bool {
        self.fixed_fee.is_some_and(|fee| fee != 0.0)
    }
}

/// Fees owed for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FeeBreakdown {
    pub base_fee: f64,
    pub gsp_fee: f64,
    pub domestic_fee: f64,
    pub fixed_fee: f64,
    pub total_fee: f64,
}

impl FeeBreakdown {
    pub fn new(base_fee: f64, gsp_fee: f64, domestic_fee: f64, fixed_fee: f64) -> Self {
        FeeBreakdown {
            base_fee,
            gsp_fee,
            domestic_fee,
            fixed_fee,
            total_fee: base_fee + gsp_fee + domestic_fee + fixed_fee,
        }
    }

    /// Same volume charges with the fixed component replaced.
    pub fn with_fixed_fee(self, fixed_fee: f64) -> Self {
        FeeBreakdown::new(self.base_fee, self.gsp_fee, self.domestic_fee, fixed_fee)
    }
}

/// Split a reading's extraction into (irrigation, domestic) volumes.
pub fn split_volume(total_af: f64, domestic_af: Option<f64>) -> Result<(f64, f64), ReadingError> {
    let domestic = domestic_af.unwrap_or(0.0);
    if !domestic.is_finite() || domestic < 0.0 {
        return Err(InvalidReason::NegativeDomestic(domestic).into());
    }
    if domestic > total_af {
        return Err(InvalidReason::DomesticExceedsTotal {
            domestic,
            total: total_af,
        }
        .into());
    }
    Ok((total_af - domestic, domestic))
}

/// Price the volume of one reading. The fixed fee is left at zero.
pub fn compute_fees(
    total_af: f64,
    domestic_af: Option<f64>,
    schedule: Option<&RateSchedule>,
    default_policy: DomesticBasePolicy,
) -> Result<FeeBreakdown, ReadingError> {
    let (irrigation, domestic) = split_volume(total_af, domestic_af)?;
    let Some(schedule) = schedule else {
        return Ok(FeeBreakdown::default());
    };

    let policy = schedule.domestic_policy.unwrap_or(default_policy);
    let base_volume = match policy {
        DomesticBasePolicy::Exempt => irrigation,
        DomesticBasePolicy::ChargeAll => total_af,
    };
    let base_fee = base_volume * schedule.base_rate.unwrap_or(0.0);
    let gsp_fee = total_af * schedule.gsp_rate.unwrap_or(0.0);
    let domestic_fee = domestic * schedule.domestic_rate.unwrap_or(0.0);
    Ok(FeeBreakdown::new(base_fee, gsp_fee, domestic_fee, 0.0))
}
