//! Engine-wide accounting configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! water_year_start_month = 10
//! allocation_warning_percent = 80.0
//! allocation_critical_percent = 95.0
//! stale_after_days = 30
//! very_stale_after_days = 90
//! calibration_due_soon_days = 30
//! report_due_days = 30
//! domestic_policy = "exempt"
//! ```

use crate::error::ConfigError;
use crate::fees::DomesticBasePolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Month (1-12) the water year starts in
    pub water_year_start_month: u32,
    /// Percent used above which an allocation warning is raised
    pub allocation_warning_percent: f64,
    /// Percent used above which an allocation alert is critical
    pub allocation_critical_percent: f64,
    pub stale_after_days: i64,
    pub very_stale_after_days: i64,
    pub calibration_due_soon_days: i64,
    /// Days after a reporting quarter closes that its report is due
    pub report_due_days: i64,
    /// Used for rate schedules that don't set their own policy
    pub domestic_policy: DomesticBasePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            water_year_start_month: 10,
            allocation_warning_percent: 80.0,
            allocation_critical_percent: 95.0,
            stale_after_days: 30,
            very_stale_after_days: 90,
            calibration_due_soon_days: 30,
            report_due_days: 30,
            domestic_policy: DomesticBasePolicy::Exempt,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(toml_data: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=12).contains(&self.water_year_start_month) {
            return Err(ConfigError::Invalid(format!(
                "water_year_start_month must be 1-12, got {}",
                self.water_year_start_month
            )));
        }
        if self.allocation_warning_percent > self.allocation_critical_percent {
            return Err(ConfigError::Invalid(format!(
                "allocation_warning_percent ({}) is above allocation_critical_percent ({})",
                self.allocation_warning_percent, self.allocation_critical_percent
            )));
        }
        if self.stale_after_days > self.very_stale_after_days {
            return Err(ConfigError::Invalid(format!(
                "stale_after_days ({}) is above very_stale_after_days ({})",
                self.stale_after_days, self.very_stale_after_days
            )));
        }
        if self.calibration_due_soon_days < 0 || self.report_due_days < 0 {
            return Err(ConfigError::Invalid("day windows must not be negative".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str(
            "water_year_start_month = 1\ndomestic_policy = \"charge_all\"\n",
        )
        .unwrap();
        assert_eq!(config.water_year_start_month, 1);
        assert_eq!(config.domestic_policy, DomesticBasePolicy::ChargeAll);
        assert_eq!(config.stale_after_days, 30);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EngineConfig::from_toml_str("water_year_start_month = 13").is_err());
        assert!(EngineConfig::from_toml_str("allocation_warning_percent = 99.0").is_err());
        assert!(EngineConfig::from_toml_str("stale_after_days = \"soon\"").is_err());
    }
}
