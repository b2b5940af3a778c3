use crate::error::ParseError;
use crate::fees::{DomesticBasePolicy, FixedFeePeriod, RateSchedule};
use crate::parse::{self, CsvBatch};
use crate::units::MeterUnit;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operational status of a well. Wells are never deleted while readings
/// reference them; they are moved to `Inactive` or `Destroyed` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WellStatus {
    #[default]
    Active,
    Inactive,
    Standby,
    Destroyed,
    Monitoring,
}

impl WellStatus {
    /// Wells with a meter in service, which therefore need calibration.
    pub fn has_working_meter(&self) -> bool {
        matches!(self, WellStatus::Active | WellStatus::Standby)
    }

    /// Wells expected to keep reporting readings.
    pub fn expects_readings(&self) -> bool {
        !matches!(self, WellStatus::Inactive | WellStatus::Destroyed)
    }
}

impl FromStr for WellStatus {
    type Err = crate::fees::UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(WellStatus::Active),
            "inactive" => Ok(WellStatus::Inactive),
            "standby" => Ok(WellStatus::Standby),
            "destroyed" => Ok(WellStatus::Destroyed),
            "monitoring" => Ok(WellStatus::Monitoring),
            _ => Err(crate::fees::UnknownVariant {
                kind: "well status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WellStatus::Active => "active",
            WellStatus::Inactive => "inactive",
            WellStatus::Standby => "standby",
            WellStatus::Destroyed => "destroyed",
            WellStatus::Monitoring => "monitoring",
        };
        write!(f, "{}", label)
    }
}

/// A metered groundwater well and the configuration needed to account for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Well {
    pub id: String,
    pub name: String,
    pub farm: String,
    /// Groundwater sustainability agency the well reports to
    pub gsa_id: String,
    pub basin_id: String,
    pub meter_unit: MeterUnit,
    /// Register multiplier printed on the meter face
    pub unit_multiplier: f64,
    pub status: WellStatus,
    pub rate_schedule: Option<RateSchedule>,
    pub calibration_due: Option<NaiveDate>,
}

impl Well {
    /// An active acre-foot metered well with no rates configured.
    pub fn new(id: impl Into<String>, gsa_id: impl Into<String>) -> Self {
        let id = id.into();
        Well {
            name: id.clone(),
            id,
            farm: String::new(),
            gsa_id: gsa_id.into(),
            basin_id: String::new(),
            meter_unit: MeterUnit::AcreFeet,
            unit_multiplier: 1.0,
            status: WellStatus::Active,
            rate_schedule: None,
            calibration_due: None,
        }
    }

    pub fn with_rate_schedule(mut self, schedule: RateSchedule) -> Self {
        self.rate_schedule = Some(schedule);
        self
    }

    pub fn with_status(mut self, status: WellStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_calibration_due(mut self, due: NaiveDate) -> Self {
        self.calibration_due = Some(due);
        self
    }

    /// Parse a CSV string of well metadata.
    ///
    /// Expected columns (with headers):
    /// `ID,NAME,FARM,GSA,BASIN,METER_UNIT,MULTIPLIER,STATUS,BASE_RATE,GSP_RATE,DOMESTIC_RATE,FIXED_FEE,FIXED_FEE_PERIOD,DOMESTIC_POLICY,CALIBRATION_DUE`
    ///
    /// Empty cells fall back to defaults: acre-feet, multiplier 1, active.
    /// A rate schedule is attached only when at least one rate cell is set.
    pub fn parse_wells_csv(csv_data: &str) -> Result<CsvBatch<Well>, ParseError> {
        parse::parse_csv(csv_data, "well", |r, row| {
            let id = parse::required(r, 0, "well id", row)?.to_string();
            let gsa_id = parse::required(r, 3, "GSA", row)?.to_string();
            let meter_unit = parse::optional::<MeterUnit>(r, 5, "meter unit", row)?.unwrap_or_default();
            let unit_multiplier = parse::optional::<f64>(r, 6, "multiplier", row)?.unwrap_or(1.0);
            if !unit_multiplier.is_finite() || unit_multiplier <= 0.0 {
                return Err(ParseError::field(row, format!("multiplier must be positive, got {}", unit_multiplier)));
            }
            let status = parse::optional::<WellStatus>(r, 7, "status", row)?.unwrap_or_default();

            let base_rate = parse::optional::<f64>(r, 8, "base rate", row)?;
            let gsp_rate = parse::optional::<f64>(r, 9, "GSP rate", row)?;
            let domestic_rate = parse::optional::<f64>(r, 10, "domestic rate", row)?;
            let fixed_fee = parse::optional::<f64>(r, 11, "fixed fee", row)?;
            let fixed_fee_period = parse::optional::<FixedFeePeriod>(r, 12, "fixed fee period", row)?;
            let domestic_policy = parse::optional::<DomesticBasePolicy>(r, 13, "domestic policy", row)?;
            let has_rates = base_rate.is_some()
                || gsp_rate.is_some()
                || domestic_rate.is_some()
                || fixed_fee.is_some();
            let rate_schedule = has_rates.then(|| RateSchedule {
                base_rate,
                gsp_rate,
                domestic_rate,
                fixed_fee,
                fixed_fee_period: fixed_fee_period.unwrap_or_default(),
                domestic_policy,
            });

            Ok(Well {
                name: parse::cell(r, 1).unwrap_or(&id).to_string(),
                farm: parse::cell(r, 2).unwrap_or("").to_string(),
                basin_id: parse::cell(r, 4).unwrap_or("").to_string(),
                calibration_due: parse::optional_date(r, 14, "calibration due date", row)?,
                id,
                gsa_id,
                meter_unit,
                unit_multiplier,
                status,
                rate_schedule,
            })
        })
    }
}
