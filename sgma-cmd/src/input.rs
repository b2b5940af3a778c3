//! Loading CSV inputs and writing command output.

use chrono::{Local, NaiveDate};
use log::{info, warn};
use sgma_engine::{Allocation, AllocationTable, CsvBatch, Reading, ReadingLedger, Well};
use std::collections::BTreeMap;
use std::io::Write;

/// Wells, their ledgers and the allocation table for one run.
#[derive(Debug, Default)]
pub struct Dataset {
    pub wells: Vec<Well>,
    pub ledgers: BTreeMap<String, ReadingLedger>,
    pub allocations: AllocationTable,
    /// Input rows dropped as malformed or colliding
    pub skipped_rows: usize,
}

impl Dataset {
    /// Build a dataset from CSV strings.
    pub fn from_csv(wells_csv: &str, readings_csv: &str, allocations_csv: Option<&str>) -> anyhow::Result<Self> {
        let wells = Well::parse_wells_csv(wells_csv)?;
        let readings = Reading::parse_readings_csv(readings_csv)?;
        let (ledgers, collisions) = ReadingLedger::group_by_well(readings.records);
        let allocations = match allocations_csv {
            Some(data) => Allocation::parse_allocations_csv(data)?,
            None => CsvBatch {
                records: Vec::new(),
                rejected: Vec::new(),
            },
        };

        for well_id in ledgers.keys() {
            if !wells.records.iter().any(|w| &w.id == well_id) {
                warn!("Readings for unknown well {} ignored", well_id);
            }
        }

        Ok(Dataset {
            skipped_rows: wells.rejected.len()
                + readings.rejected.len()
                + collisions.len()
                + allocations.rejected.len(),
            wells: wells.records,
            ledgers,
            allocations: AllocationTable::new(allocations.records),
        })
    }

    /// Load a dataset from CSV files.
    pub fn load(wells_path: &str, readings_path: &str, allocations_path: Option<&str>) -> anyhow::Result<Self> {
        let wells = read_file(wells_path)?;
        let readings = read_file(readings_path)?;
        let allocations = allocations_path.map(read_file).transpose()?;
        let dataset = Dataset::from_csv(&wells, &readings, allocations.as_deref())?;
        info!(
            "Loaded {} wells and {} ledgers ({} rows skipped)",
            dataset.wells.len(),
            dataset.ledgers.len(),
            dataset.skipped_rows
        );
        Ok(dataset)
    }

    /// Wells of one GSA, or all wells when no district is named.
    pub fn wells_in(&self, district: Option<&str>) -> Vec<Well> {
        self.wells
            .iter()
            .filter(|w| district.map_or(true, |d| w.gsa_id == d))
            .cloned()
            .collect()
    }
}

pub fn read_file(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))
}

/// The report date: the given YYYY-MM-DD string, or today.
pub fn parse_as_of(as_of: Option<&str>) -> anyhow::Result<NaiveDate> {
    match as_of {
        Some(s) => sgma_utils::dates::parse_date(s).map_err(|e| anyhow::anyhow!("Invalid --as-of '{}': {}", s, e)),
        None => Ok(Local::now().naive_local().date()),
    }
}

/// Write `contents` to `output`, or to stdout when no path is given.
pub fn write_output(output: Option<&str>, contents: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)?;
            info!("Output: {}", path);
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELLS: &str = "ID,NAME,FARM,GSA,BASIN,METER_UNIT,MULTIPLIER,STATUS,BASE_RATE,GSP_RATE,DOMESTIC_RATE,FIXED_FEE,FIXED_FEE_PERIOD,DOMESTIC_POLICY,CALIBRATION_DUE
W-1,,,GSA-A,,AF,1,active,,,,,,,
W-2,,,GSA-B,,AF,1,active,,,,,,,
";
    const READINGS: &str = "WELL_ID,READING_ID,DATE,TIME,TYPE,METER_READING,ROLLOVER,DOMESTIC_AF
W-1,a,2023-10-01,,manual,0,,
W-1,b,2023-10-01,,manual,5,,
W-2,c,not-a-date,,manual,5,,
";

    #[test]
    fn test_skipped_rows_are_counted() {
        let dataset = Dataset::from_csv(WELLS, READINGS, None).unwrap();
        assert_eq!(dataset.wells.len(), 2);
        assert_eq!(dataset.skipped_rows, 2);
        assert!(dataset.allocations.is_empty());
    }

    #[test]
    fn test_wells_in_district() {
        let dataset = Dataset::from_csv(WELLS, READINGS, None).unwrap();
        assert_eq!(dataset.wells_in(None).len(), 2);
        let b = dataset.wells_in(Some("GSA-B"));
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].id, "W-2");
        assert!(dataset.wells_in(Some("GSA-Z")).is_empty());
    }

    #[test]
    fn test_parse_as_of() {
        assert_eq!(
            parse_as_of(Some("2024-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_as_of(Some("03/01/2024")).is_err());
        assert!(parse_as_of(None).is_ok());
    }
}
