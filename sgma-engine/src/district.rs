//! District rollup: every well of a GSA computed in parallel, summarized,
//! checked for alerts, then added up into one district summary.

use crate::alerts::{allocation_alert, evaluate_well, Alert};
use crate::allocation::{summarize_district, summarize_well, AllocationSummary, AllocationTable};
use crate::config::EngineConfig;
use crate::ledger::ReadingLedger;
use crate::pipeline::{compute_wells, WellComputation};
use crate::well::Well;
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellReport {
    pub well: Well,
    pub computation: WellComputation,
    pub summary: AllocationSummary,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictReport {
    pub district_id: String,
    pub summary: AllocationSummary,
    pub wells: Vec<WellReport>,
    /// District-level allocation alert, if any. Well alerts stay on their wells.
    pub alerts: Vec<Alert>,
}

impl DistrictReport {
    /// District alerts followed by every well's alerts.
    pub fn all_alerts(&self) -> impl Iterator<Item = &Alert> + '_ {
        self.alerts
            .iter()
            .chain(self.wells.iter().flat_map(|w| w.alerts.iter()))
    }

    pub fn well(&self, well_id: &str) -> Option<&WellReport> {
        self.wells.iter().find(|w| w.well.id == well_id)
    }
}

/// Compute, summarize and evaluate every well in `wells` as one district.
/// `wells` is taken as given; callers filter by GSA.
pub fn compute_district(
    district_id: &str,
    wells: &[Well],
    ledgers: &BTreeMap<String, ReadingLedger>,
    allocations: &AllocationTable,
    as_of: NaiveDate,
    config: &EngineConfig,
) -> DistrictReport {
    let computations = compute_wells(wells, ledgers, config);
    let well_reports: Vec<WellReport> = wells
        .iter()
        .zip(computations)
        .map(|(well, computation)| {
            let summary = summarize_well(well, &computation, allocations, as_of, config);
            let alerts = evaluate_well(well, &computation, Some(&summary), as_of, config);
            WellReport {
                well: well.clone(),
                computation,
                summary,
                alerts,
            }
        })
        .collect();

    let well_summaries: Vec<AllocationSummary> = well_reports.iter().map(|w| w.summary.clone()).collect();
    let calibration_dues = wells
        .iter()
        .filter(|w| w.status.has_working_meter())
        .map(|w| w.calibration_due);
    let summary = summarize_district(district_id, &well_summaries, calibration_dues, allocations, as_of, config);
    let alerts: Vec<Alert> = allocation_alert(&summary, config).into_iter().collect();

    info!(
        "district {}: {} wells, {:.2} AF year to date, {} alerts",
        district_id,
        well_reports.len(),
        summary.ytd_extraction_af,
        alerts.len() + well_reports.iter().map(|w| w.alerts.len()).sum::<usize>()
    );
    DistrictReport {
        district_id: district_id.to_string(),
        summary,
        wells: well_reports,
        alerts,
    }
}

/// One report per GSA found among `wells`, ordered by district id.
pub fn compute_districts(
    wells: &[Well],
    ledgers: &BTreeMap<String, ReadingLedger>,
    allocations: &AllocationTable,
    as_of: NaiveDate,
    config: &EngineConfig,
) -> Vec<DistrictReport> {
    let mut by_district: BTreeMap<&str, Vec<Well>> = BTreeMap::new();
    for well in wells {
        by_district.entry(well.gsa_id.as_str()).or_default().push(well.clone());
    }
    by_district
        .into_iter()
        .map(|(district_id, members)| compute_district(district_id, &members, ledgers, allocations, as_of, config))
        .collect()
}
