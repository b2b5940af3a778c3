//! `alerts`: compliance alerts as JSON, most severe first.

use crate::allocation::district_reports;
use crate::input::write_output;
use crate::{Inputs, ReportOptions};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;
use sgma_engine::{Alert, DistrictReport, EngineConfig, Severity};

#[derive(Debug, Serialize)]
pub struct AlertReport {
    pub as_of: NaiveDate,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub alerts: Vec<Alert>,
}

/// Gather every district's alerts. The sort is stable, so alerts of equal
/// severity keep district-then-well order.
pub fn collect_alerts(as_of: NaiveDate, reports: &[DistrictReport]) -> AlertReport {
    let mut alerts: Vec<Alert> = reports.iter().flat_map(|r| r.all_alerts().cloned()).collect();
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    let count = |severity: Severity| alerts.iter().filter(|a| a.severity == severity).count();
    AlertReport {
        as_of,
        critical: count(Severity::Critical),
        warning: count(Severity::Warning),
        info: count(Severity::Info),
        alerts,
    }
}

pub fn run_alerts(inputs: &Inputs, report: &ReportOptions, config: &EngineConfig) -> anyhow::Result<()> {
    let (as_of, reports) = district_reports(inputs, report, config)?;
    let alert_report = collect_alerts(as_of, &reports);
    for alert in alert_report.alerts.iter().filter(|a| a.severity == Severity::Critical) {
        warn!("[{}] {}: {}", alert.severity, alert.subject_well_id, alert.message);
    }
    info!(
        "{} critical, {} warning, {} info alerts",
        alert_report.critical, alert_report.warning, alert_report.info
    );
    let json = serde_json::to_string_pretty(&alert_report)?;
    write_output(inputs.output.as_deref(), &json)
}
