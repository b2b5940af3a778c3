//! `allocation`: year-to-date allocation standing as JSON.

use crate::input::{parse_as_of, write_output, Dataset};
use crate::{Inputs, ReportOptions};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use sgma_engine::{compute_districts, AllocationSummary, DistrictReport, EngineConfig};

/// Allocation standing of one district and each of its wells.
#[derive(Debug, Serialize)]
pub struct DistrictAllocation {
    pub district: AllocationSummary,
    pub wells: Vec<AllocationSummary>,
}

impl From<&DistrictReport> for DistrictAllocation {
    fn from(report: &DistrictReport) -> Self {
        DistrictAllocation {
            district: report.summary.clone(),
            wells: report.wells.iter().map(|w| w.summary.clone()).collect(),
        }
    }
}

pub fn district_reports(
    inputs: &Inputs,
    report: &ReportOptions,
    config: &EngineConfig,
) -> anyhow::Result<(NaiveDate, Vec<DistrictReport>)> {
    let as_of = parse_as_of(report.as_of.as_deref())?;
    let dataset = Dataset::load(&inputs.wells_csv, &inputs.readings_csv, Some(report.allocations_csv.as_str()))?;
    let wells = dataset.wells_in(report.district.as_deref());
    if wells.is_empty() {
        anyhow::bail!(
            "No wells found{}",
            report.district.as_deref().map(|d| format!(" in district {}", d)).unwrap_or_default()
        );
    }
    let reports = compute_districts(&wells, &dataset.ledgers, &dataset.allocations, as_of, config);
    info!("Computed {} districts as of {}", reports.len(), as_of);
    Ok((as_of, reports))
}

pub fn allocation_json(reports: &[DistrictReport]) -> anyhow::Result<String> {
    let allocations: Vec<DistrictAllocation> = reports.iter().map(DistrictAllocation::from).collect();
    Ok(serde_json::to_string_pretty(&allocations)?)
}

pub fn run_allocation(inputs: &Inputs, report: &ReportOptions, config: &EngineConfig) -> anyhow::Result<()> {
    let (_, reports) = district_reports(inputs, report, config)?;
    let json = allocation_json(&reports)?;
    write_output(inputs.output.as_deref(), &json)
}
