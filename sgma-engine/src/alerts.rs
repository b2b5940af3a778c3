//! Compliance alerts.
//!
//! Each well is evaluated on three independent axes: calibration,
//! allocation and reading freshness. Every axis yields at most one alert,
//! and alerts are pure functions of the current state plus `today`; there
//! is no acknowledgement or history here.
//!
//! # Clock injection
//! All functions take `today` rather than reading the system clock, which
//! keeps them deterministic in tests.

use crate::allocation::AllocationSummary;
use crate::config::EngineConfig;
use crate::pipeline::WellComputation;
use crate::well::Well;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Calibration,
    Allocation,
    Freshness,
}

/// Alert severity levels, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Well id, or district id for district-level allocation alerts
    pub subject_well_id: String,
    pub category: AlertCategory,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    Current,
    DueSoon { days_left: i64 },
    Overdue { days_overdue: i64 },
    /// No due date on record
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AllocationStatus {
    Normal,
    /// Within limits today but projected to overrun by year end
    ProjectedOverrun { projected_percent: f64 },
    Warning { percent_used: f64 },
    Critical { percent_used: Option<f64>, remaining_af: f64 },
    /// No allocation configured
    NotComputable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessStatus {
    Fresh,
    NoReadings,
    Stale { days: i64 },
    VeryStale { days: i64 },
}

pub fn calibration_status(due: Option<NaiveDate>, today: NaiveDate, due_soon_days: i64) -> CalibrationStatus {
    let Some(due) = due else {
        return CalibrationStatus::Unknown;
    };
    let days_left = (due - today).num_days();
    if days_left < 0 {
        CalibrationStatus::Overdue {
            days_overdue: -days_left,
        }
    } else if days_left <= due_soon_days {
        CalibrationStatus::DueSoon { days_left }
    } else {
        CalibrationStatus::Current
    }
}

pub fn allocation_status(summary: &AllocationSummary, config: &EngineConfig) -> AllocationStatus {
    let Some(remaining_af) = summary.allocation_remaining_af else {
        return AllocationStatus::NotComputable;
    };
    let percent_used = summary.percent_allocation_used;
    let over_critical = percent_used.is_some_and(|p| p > config.allocation_critical_percent);
    if remaining_af < 0.0 || over_critical {
        return AllocationStatus::Critical {
            percent_used,
            remaining_af,
        };
    }
    match percent_used {
        Some(p) if p > config.allocation_warning_percent => AllocationStatus::Warning { percent_used: p },
        _ => match summary.projection.projected_percent {
            Some(projected_percent) if summary.projection.at_risk => {
                AllocationStatus::ProjectedOverrun { projected_percent }
            }
            _ => AllocationStatus::Normal,
        },
    }
}

/// Staleness is measured in whole days since the latest reading:
///   age >= very_stale_after_days → very stale
///   age >= stale_after_days      → stale
pub fn freshness_status(last_reading: Option<NaiveDate>, today: NaiveDate, config: &EngineConfig) -> FreshnessStatus {
    let Some(last) = last_reading else {
        return FreshnessStatus::NoReadings;
    };
    let days = (today - last).num_days();
    if days >= config.very_stale_after_days {
        FreshnessStatus::VeryStale { days }
    } else if days >= config.stale_after_days {
        FreshnessStatus::Stale { days }
    } else {
        FreshnessStatus::Fresh
    }
}

fn alert(subject: &str, category: AlertCategory, severity: Severity, message: String) -> Alert {
    Alert {
        subject_well_id: subject.to_string(),
        category,
        severity,
        message,
    }
}

pub fn calibration_alert(well: &Well, today: NaiveDate, config: &EngineConfig) -> Option<Alert> {
    if !well.status.has_working_meter() {
        return None;
    }
    match calibration_status(well.calibration_due, today, config.calibration_due_soon_days) {
        CalibrationStatus::Overdue { days_overdue } => Some(alert(
            &well.id,
            AlertCategory::Calibration,
            Severity::Critical,
            format!("Meter calibration overdue by {} days", days_overdue),
        )),
        CalibrationStatus::DueSoon { days_left } => Some(alert(
            &well.id,
            AlertCategory::Calibration,
            Severity::Warning,
            format!("Meter calibration due in {} days", days_left),
        )),
        CalibrationStatus::Current | CalibrationStatus::Unknown => None,
    }
}

/// Allocation alert for a well or district summary.
pub fn allocation_alert(summary: &AllocationSummary, config: &EngineConfig) -> Option<Alert> {
    let subject = &summary.subject_id;
    let category = AlertCategory::Allocation;
    match allocation_status(summary, config) {
        AllocationStatus::Critical {
            remaining_af,
            percent_used,
        } => {
            let message = if remaining_af < 0.0 {
                format!("Allocation exceeded by {:.2} AF", -remaining_af)
            } else {
                format!("{:.1}% of allocation used", percent_used.unwrap_or(100.0))
            };
            Some(alert(subject, category, Severity::Critical, message))
        }
        AllocationStatus::Warning { percent_used } => Some(alert(
            subject,
            category,
            Severity::Warning,
            format!("{:.1}% of allocation used", percent_used),
        )),
        AllocationStatus::ProjectedOverrun { projected_percent } => Some(alert(
            subject,
            category,
            Severity::Info,
            format!("Projected to use {:.1}% of allocation by year end", projected_percent),
        )),
        AllocationStatus::Normal | AllocationStatus::NotComputable => None,
    }
}

pub fn freshness_alert(well: &Well, last_reading: Option<NaiveDate>, today: NaiveDate, config: &EngineConfig) -> Option<Alert> {
    if !well.status.expects_readings() {
        return None;
    }
    let category = AlertCategory::Freshness;
    match freshness_status(last_reading, today, config) {
        FreshnessStatus::NoReadings => Some(alert(
            &well.id,
            category,
            Severity::Warning,
            "No meter readings on record".to_string(),
        )),
        FreshnessStatus::VeryStale { days } => Some(alert(
            &well.id,
            category,
            Severity::Critical,
            format!("No meter reading in {} days", days),
        )),
        FreshnessStatus::Stale { days } => Some(alert(
            &well.id,
            category,
            Severity::Warning,
            format!("No meter reading in {} days", days),
        )),
        FreshnessStatus::Fresh => None,
    }
}

/// All alerts for one well, most severe first.
pub fn evaluate_well(
    well: &Well,
    computation: &WellComputation,
    summary: Option<&AllocationSummary>,
    today: NaiveDate,
    config: &EngineConfig,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = [
        calibration_alert(well, today, config),
        summary.and_then(|s| allocation_alert(s, config)),
        freshness_alert(well, computation.last_reading_on_or_before(today), today, config),
    ]
    .into_iter()
    .flatten()
    .collect();
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}
