//! Year-to-date extraction against annual allocations.
//!
//! Well summaries are computed from each well's own [`WellComputation`];
//! a district summary only ever adds up finished well summaries, so a bad
//! reading in one well cannot leak into another's figures.

use crate::config::EngineConfig;
use crate::error::ParseError;
use crate::parse::{self, CsvBatch};
use crate::pipeline::WellComputation;
use crate::projection::{project, Projection};
use crate::water_year::{Period, WaterYear};
use crate::well::Well;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationScope {
    Well,
    District,
}

impl FromStr for AllocationScope {
    type Err = crate::fees::UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "well" => Ok(AllocationScope::Well),
            "district" | "gsa" => Ok(AllocationScope::District),
            _ => Err(crate::fees::UnknownVariant {
                kind: "allocation scope",
                value: s.to_string(),
            }),
        }
    }
}

/// An annual extraction allowance for one well or one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub scope: AllocationScope,
    pub scope_id: String,
    /// Calendar year the water year starts in
    pub water_year: i32,
    pub total_af: f64,
}

impl Allocation {
    /// Parse a CSV string of allocations.
    ///
    /// Expected columns (with headers): `SCOPE,SCOPE_ID,WATER_YEAR,TOTAL_AF`
    pub fn parse_allocations_csv(csv_data: &str) -> Result<CsvBatch<Allocation>, ParseError> {
        parse::parse_csv(csv_data, "allocation", |r, row| {
            let total_af: f64 = parse::parsed(r, 3, "total allocation", row)?;
            if !total_af.is_finite() || total_af < 0.0 {
                return Err(ParseError::field(row, format!("allocation must not be negative, got {}", total_af)));
            }
            Ok(Allocation {
                scope: parse::parsed(r, 0, "scope", row)?,
                scope_id: parse::required(r, 1, "scope id", row)?.to_string(),
                water_year: parse::parsed(r, 2, "water year", row)?,
                total_af,
            })
        })
    }
}

/// Allocations indexed by scope and water year. Later entries replace
/// earlier ones for the same key.
#[derive(Debug, Clone, Default)]
pub struct AllocationTable {
    entries: HashMap<(AllocationScope, String, i32), Allocation>,
}

impl AllocationTable {
    pub fn new(allocations: impl IntoIterator<Item = Allocation>) -> Self {
        let mut table = AllocationTable::default();
        for allocation in allocations {
            table.insert(allocation);
        }
        table
    }

    pub fn insert(&mut self, allocation: Allocation) {
        let key = (allocation.scope, allocation.scope_id.clone(), allocation.water_year);
        if self.entries.insert(key, allocation).is_some() {
            log::warn!("allocation table: duplicate allocation replaced");
        }
    }

    pub fn get(&self, scope: AllocationScope, scope_id: &str, water_year: i32) -> Option<&Allocation> {
        self.entries.get(&(scope, scope_id.to_string(), water_year))
    }

    pub fn for_well(&self, well_id: &str, water_year: i32) -> Option<&Allocation> {
        self.get(AllocationScope::Well, well_id, water_year)
    }

    pub fn for_district(&self, district_id: &str, water_year: i32) -> Option<&Allocation> {
        self.get(AllocationScope::District, district_id, water_year)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `100 × value / total`, or `None` when there is no allocation to measure
/// against (missing or zero).
pub fn percent_of(value_af: f64, total_af: Option<f64>) -> Option<f64> {
    match total_af {
        Some(total) if total > 0.0 => Some(100.0 * value_af / total),
        _ => None,
    }
}

/// Sum of accepted extraction dated inside `water_year` and on or before `as_of`.
pub fn ytd_extraction(computation: &WellComputation, water_year: &WaterYear, as_of: NaiveDate) -> f64 {
    computation
        .extractions()
        .filter(|(reading, _)| water_year.contains(reading.date) && reading.date <= as_of)
        .fold(0.0, |total, (_, af)| total + af)
}

/// Allocation standing of one well or one district on a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSummary {
    pub scope: AllocationScope,
    pub subject_id: String,
    pub water_year: WaterYear,
    pub as_of: NaiveDate,
    pub ytd_extraction_af: f64,
    pub total_allocation_af: Option<f64>,
    /// Negative once the allocation is overdrawn
    pub allocation_remaining_af: Option<f64>,
    /// `None` when the allocation is missing or zero
    pub percent_allocation_used: Option<f64>,
    pub extraction_count: usize,
    pub rejected_count: usize,
    pub reporting_period: Period,
    pub next_report_due: NaiveDate,
    pub next_calibration_due: Option<NaiveDate>,
    pub projection: Projection,
}

/// The earliest report deadline on or after `as_of`: the previous quarter's
/// report if still open, otherwise the current quarter's.
pub fn next_report_due(as_of: NaiveDate, config: &EngineConfig) -> NaiveDate {
    let lag = Duration::days(config.report_due_days);
    let current = WaterYear::reporting_period(as_of, config.water_year_start_month);
    let previous_end = current.start - Duration::days(1);
    if previous_end + lag >= as_of {
        previous_end + lag
    } else {
        current.end + lag
    }
}

fn build_summary(
    scope: AllocationScope,
    subject_id: &str,
    ytd_af: f64,
    counts: (usize, usize),
    allocation: Option<&Allocation>,
    next_calibration_due: Option<NaiveDate>,
    as_of: NaiveDate,
    config: &EngineConfig,
) -> AllocationSummary {
    let water_year = WaterYear::containing(as_of, config.water_year_start_month);
    let total = allocation.map(|a| a.total_af);
    AllocationSummary {
        scope,
        subject_id: subject_id.to_string(),
        water_year,
        as_of,
        ytd_extraction_af: ytd_af,
        total_allocation_af: total,
        allocation_remaining_af: total.map(|t| t - ytd_af),
        percent_allocation_used: percent_of(ytd_af, total),
        extraction_count: counts.0,
        rejected_count: counts.1,
        reporting_period: WaterYear::reporting_period(as_of, config.water_year_start_month),
        next_report_due: next_report_due(as_of, config),
        next_calibration_due,
        projection: project(ytd_af, water_year.elapsed_days(as_of), water_year.total_days(), total),
    }
}

/// Summarize one well for the water year containing `as_of`.
pub fn summarize_well(
    well: &Well,
    computation: &WellComputation,
    allocations: &AllocationTable,
    as_of: NaiveDate,
    config: &EngineConfig,
) -> AllocationSummary {
    let water_year = WaterYear::containing(as_of, config.water_year_start_month);
    let ytd = ytd_extraction(computation, &water_year, as_of);
    let extraction_count = computation
        .extractions()
        .filter(|(reading, _)| water_year.contains(reading.date) && reading.date <= as_of)
        .count();
    build_summary(
        AllocationScope::Well,
        &well.id,
        ytd,
        (extraction_count, computation.rejected.len()),
        allocations.for_well(&well.id, water_year.year),
        well.calibration_due,
        as_of,
        config,
    )
}

/// Summarize a district by adding up its wells' finished summaries.
pub fn summarize_district(
    district_id: &str,
    wells: &[AllocationSummary],
    calibration_dues: impl IntoIterator<Item = Option<NaiveDate>>,
    allocations: &AllocationTable,
    as_of: NaiveDate,
    config: &EngineConfig,
) -> AllocationSummary {
    let water_year = WaterYear::containing(as_of, config.water_year_start_month);
    let ytd = wells.iter().fold(0.0, |total, s| total + s.ytd_extraction_af);
    let extraction_count = wells.iter().map(|s| s.extraction_count).sum();
    let rejected_count = wells.iter().map(|s| s.rejected_count).sum();
    let next_calibration_due = calibration_dues.into_iter().flatten().min();
    build_summary(
        AllocationScope::District,
        district_id,
        ytd,
        (extraction_count, rejected_count),
        allocations.for_district(district_id, water_year.year),
        next_calibration_due,
        as_of,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ReadingLedger;
    use crate::pipeline::compute_well;
    use crate::reading::{Reading, ReadingType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn computation(well_id: &str, values: &[(NaiveDate, ReadingType, f64)]) -> WellComputation {
        let readings = values
            .iter()
            .enumerate()
            .map(|(i, (d, t, v))| Reading::new(well_id, format!("r{}", i), *d, *t, *v));
        let ledger = ReadingLedger::from_readings(well_id, readings).unwrap();
        compute_well(&Well::new(well_id, "GSA-A"), &ledger, &EngineConfig::default())
    }

    fn table(total: f64) -> AllocationTable {
        AllocationTable::new(vec![Allocation {
            scope: AllocationScope::Well,
            scope_id: "W-1".to_string(),
            water_year: 2023,
            total_af: total,
        }])
    }

    #[test]
    fn test_ytd_only_counts_current_water_year() {
        let comp = computation(
            "W-1",
            &[
                (date(2023, 8, 1), ReadingType::Initial, 0.0),
                (date(2023, 9, 30), ReadingType::Manual, 40.0), // WY2022
                (date(2023, 10, 15), ReadingType::Manual, 100.0),
                (date(2024, 2, 1), ReadingType::Manual, 130.0),
                (date(2024, 5, 1), ReadingType::Manual, 200.0), // after as_of
            ],
        );
        let wy = WaterYear::new(2023, 10);
        assert_eq!(ytd_extraction(&comp, &wy, date(2024, 3, 1)), 90.0);
    }

    #[test]
    fn test_initial_reading_never_counts() {
        let comp = computation(
            "W-1",
            &[
                (date(2023, 10, 1), ReadingType::Manual, 0.0),
                (date(2023, 11, 1), ReadingType::Manual, 10.0),
                (date(2023, 12, 1), ReadingType::Initial, 5000.0),
                (date(2024, 1, 1), ReadingType::Manual, 5005.0),
            ],
        );
        let wy = WaterYear::new(2023, 10);
        assert_eq!(ytd_extraction(&comp, &wy, date(2024, 3, 1)), 15.0);
    }

    #[test]
    fn test_summary_figures() {
        let comp = computation(
            "W-1",
            &[
                (date(2023, 10, 1), ReadingType::Initial, 0.0),
                (date(2024, 3, 31), ReadingType::Manual, 90.0),
            ],
        );
        let well = Well::new("W-1", "GSA-A").with_calibration_due(date(2024, 6, 1));
        let s = summarize_well(&well, &comp, &table(100.0), date(2024, 3, 31), &EngineConfig::default());
        assert_eq!(s.ytd_extraction_af, 90.0);
        assert_eq!(s.allocation_remaining_af, Some(10.0));
        assert_eq!(s.percent_allocation_used, Some(90.0));
        assert_eq!(s.extraction_count, 1);
        assert_eq!(s.reporting_period.label, "WY2023-Q2");
        assert_eq!(s.next_report_due, date(2024, 4, 30));
        assert_eq!(s.next_calibration_due, Some(date(2024, 6, 1)));
        assert!(s.projection.projected_total_af > s.ytd_extraction_af);
    }

    #[test]
    fn test_well_without_readings_reports_positive_zero() {
        let comp = computation("W-1", &[]);
        let s = summarize_well(&Well::new("W-1", "GSA-A"), &comp, &table(350.0), date(2024, 3, 1), &EngineConfig::default());
        assert!(s.ytd_extraction_af.is_sign_positive());
        assert!(s.percent_allocation_used.unwrap().is_sign_positive());
        assert!(s.projection.monthly_rate_af.is_sign_positive());
        assert!(s.projection.projected_total_af.is_sign_positive());
        assert!(s.projection.projected_percent.unwrap().is_sign_positive());
        assert_eq!(s.allocation_remaining_af, Some(350.0));

        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"ytd_extraction_af\":0.0"));
        assert!(!json.contains("-0.0"));

        let district = summarize_district("GSA-A", &[s], [None], &AllocationTable::default(), date(2024, 3, 1), &EngineConfig::default());
        assert!(district.ytd_extraction_af.is_sign_positive());
    }

    #[test]
    fn test_zero_allocation_has_no_percent() {
        let comp = computation(
            "W-1",
            &[
                (date(2023, 10, 1), ReadingType::Initial, 0.0),
                (date(2023, 11, 1), ReadingType::Manual, 5.0),
            ],
        );
        let s = summarize_well(&Well::new("W-1", "GSA-A"), &comp, &table(0.0), date(2023, 12, 1), &EngineConfig::default());
        assert_eq!(s.percent_allocation_used, None);
        assert_eq!(s.allocation_remaining_af, Some(-5.0));
        assert_eq!(s.projection.projected_percent, None);
    }

    #[test]
    fn test_missing_allocation_is_not_computable() {
        let comp = computation("W-1", &[(date(2023, 10, 1), ReadingType::Initial, 0.0)]);
        let s = summarize_well(
            &Well::new("W-1", "GSA-A"),
            &comp,
            &AllocationTable::default(),
            date(2023, 12, 1),
            &EngineConfig::default(),
        );
        assert_eq!(s.total_allocation_af, None);
        assert_eq!(s.allocation_remaining_af, None);
        assert_eq!(s.percent_allocation_used, None);
    }

    #[test]
    fn test_percent_used_grows_with_readings() {
        let mut values = vec![(date(2023, 10, 1), ReadingType::Initial, 0.0)];
        let mut last = None;
        for (i, month) in [11u32, 12].iter().enumerate() {
            values.push((date(2023, *month, 1), ReadingType::Manual, 10.0 * (i + 1) as f64));
            let comp = computation("W-1", &values);
            let s = summarize_well(&Well::new("W-1", "GSA-A"), &comp, &table(100.0), date(2024, 1, 1), &EngineConfig::default());
            let percent = s.percent_allocation_used.unwrap();
            if let Some(previous) = last {
                assert!(percent >= previous);
            }
            last = Some(percent);
        }
        assert_eq!(last, Some(20.0));
    }

    #[test]
    fn test_next_report_due_prefers_open_previous_quarter() {
        let config = EngineConfig::default();
        // Q1 closed Dec 31, its report is due Jan 30
        assert_eq!(next_report_due(date(2024, 1, 10), &config), date(2024, 1, 30));
        assert_eq!(next_report_due(date(2024, 2, 10), &config), date(2024, 4, 30));
    }

    #[test]
    fn test_district_is_sum_of_wells() {
        let config = EngineConfig::default();
        let as_of = date(2024, 1, 1);
        let good = computation(
            "W-1",
            &[
                (date(2023, 10, 1), ReadingType::Initial, 0.0),
                (date(2023, 11, 1), ReadingType::Manual, 40.0),
            ],
        );
        let bad = computation(
            "W-2",
            &[
                (date(2023, 10, 1), ReadingType::Manual, 100.0),
                (date(2023, 11, 1), ReadingType::Manual, 50.0),
                (date(2023, 12, 1), ReadingType::Manual, 110.0),
            ],
        );
        let allocations = AllocationTable::new(vec![Allocation {
            scope: AllocationScope::District,
            scope_id: "GSA-A".to_string(),
            water_year: 2023,
            total_af: 200.0,
        }]);
        let w1 = summarize_well(&Well::new("W-1", "GSA-A"), &good, &allocations, as_of, &config);
        let w2 = summarize_well(&Well::new("W-2", "GSA-A"), &bad, &allocations, as_of, &config);
        assert_eq!(w1.ytd_extraction_af, 40.0);
        assert_eq!(w2.ytd_extraction_af, 10.0);
        assert_eq!(w2.rejected_count, 1);

        let district = summarize_district(
            "GSA-A",
            &[w1, w2],
            vec![Some(date(2024, 5, 1)), None, Some(date(2024, 2, 1))],
            &allocations,
            as_of,
            &config,
        );
        assert_eq!(district.scope, AllocationScope::District);
        assert_eq!(district.ytd_extraction_af, 50.0);
        assert_eq!(district.percent_allocation_used, Some(25.0));
        assert_eq!(district.rejected_count, 1);
        assert_eq!(district.next_calibration_due, Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_parse_allocations_csv() {
        let csv = "SCOPE,SCOPE_ID,WATER_YEAR,TOTAL_AF\nwell,W-1,2023,120\ndistrict,GSA-A,2023,900\nwell,W-2,2023,-5\n";
        let batch = Allocation::parse_allocations_csv(csv).unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        let table = AllocationTable::new(batch.records);
        assert_eq!(table.for_well("W-1", 2023).unwrap().total_af, 120.0);
        assert_eq!(table.for_district("GSA-A", 2023).unwrap().total_af, 900.0);
        assert!(table.for_district("GSA-A", 2024).is_none());
    }
}
