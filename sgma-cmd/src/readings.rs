//! `readings`: per-reading extraction and fees as CSV.
//!
//! One row per reading in ledger order, followed by one row per fixed fee
//! charged at billing-period level. Rejected readings are kept with empty
//! figures and the rejection reason.

use crate::input::{write_output, Dataset};
use crate::Inputs;
use chrono::NaiveTime;
use log::info;
use sgma_engine::pipeline::{compute_wells, WellComputation};
use sgma_engine::reading::ReadingKey;
use sgma_engine::EngineConfig;
use sgma_utils::dates::format_date;

const HEADER: [&str; 12] = [
    "WELL_ID",
    "READING_ID",
    "DATE",
    "TYPE",
    "EXTRACTION_AF",
    "BASE_FEE",
    "GSP_FEE",
    "DOMESTIC_FEE",
    "FIXED_FEE",
    "TOTAL_FEE",
    "STATUS",
    "ERROR",
];

pub fn run_readings(inputs: &Inputs, config: &EngineConfig) -> anyhow::Result<()> {
    let dataset = Dataset::load(&inputs.wells_csv, &inputs.readings_csv, None)?;
    let computations = compute_wells(&dataset.wells, &dataset.ledgers, config);
    let rejected: usize = computations.iter().map(|c| c.rejected.len()).sum();
    info!(
        "Computed {} wells, {} readings rejected",
        computations.len(),
        rejected
    );
    let csv = readings_csv(&computations)?;
    write_output(inputs.output.as_deref(), &csv)
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Render computed wells as CSV.
pub fn readings_csv(computations: &[WellComputation]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(HEADER)?;

    for computation in computations {
        let mut rows: Vec<(ReadingKey, Vec<String>)> = Vec::new();
        for c in &computation.computed {
            let extraction = c.extraction_af.map(|af| format!("{:.4}", af)).unwrap_or_default();
            let fees = match c.fees {
                Some(f) => vec![
                    money(f.base_fee),
                    money(f.gsp_fee),
                    money(f.domestic_fee),
                    money(f.fixed_fee),
                    money(f.total_fee),
                ],
                None => vec![String::new(); 5],
            };
            let mut row = vec![
                computation.well_id.clone(),
                c.reading.id.clone(),
                format_date(&c.reading.date),
                c.reading.reading_type.to_string(),
                extraction,
            ];
            row.extend(fees);
            row.push("ok".to_string());
            row.push(String::new());
            rows.push((c.reading.key(), row));
        }
        for r in &computation.rejected {
            let mut row = vec![
                computation.well_id.clone(),
                r.reading_id.clone(),
                format_date(&r.date),
                String::new(),
            ];
            row.extend(vec![String::new(); 6]);
            row.push(if r.error.is_ambiguous() { "ambiguous" } else { "invalid" }.to_string());
            row.push(r.error.to_string());
            let key = ReadingKey {
                date: r.date,
                time: r.time.unwrap_or(NaiveTime::MIN),
            };
            rows.push((key, row));
        }
        rows.sort_by_key(|(key, _)| *key);
        for (_, row) in rows {
            wtr.write_record(&row)?;
        }

        for charge in &computation.period_charges {
            let start = format_date(&charge.period.start);
            let amount = money(charge.amount);
            wtr.write_record([
                computation.well_id.as_str(),
                charge.period.label.as_str(),
                start.as_str(),
                "period_fee",
                "",
                "",
                "",
                "",
                amount.as_str(),
                amount.as_str(),
                "ok",
                "",
            ])?;
        }
    }

    let bytes = wtr.into_inner().map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELLS: &str = "ID,NAME,FARM,GSA,BASIN,METER_UNIT,MULTIPLIER,STATUS,BASE_RATE,GSP_RATE,DOMESTIC_RATE,FIXED_FEE,FIXED_FEE_PERIOD,DOMESTIC_POLICY,CALIBRATION_DUE
W-1,,,GSA-A,,AF,1,active,50,30,10,,,,
";
    const READINGS: &str = "WELL_ID,READING_ID,DATE,TIME,TYPE,METER_READING,ROLLOVER,DOMESTIC_AF
W-1,a,2023-10-01,,initial,1000,,
W-1,b,2023-11-01,,manual,1100,,20
W-1,c,2023-12-01,,manual,900,,
";

    #[test]
    fn test_readings_csv_rows() {
        let dataset = Dataset::from_csv(WELLS, READINGS, None).unwrap();
        let computations = compute_wells(&dataset.wells, &dataset.ledgers, &EngineConfig::default());
        let csv = readings_csv(&computations).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "WELL_ID,READING_ID,DATE,TYPE,EXTRACTION_AF,BASE_FEE,GSP_FEE,DOMESTIC_FEE,FIXED_FEE,TOTAL_FEE,STATUS,ERROR"
        );
        assert_eq!(lines[1], "W-1,a,2023-10-01,initial,,,,,,,ok,");
        assert_eq!(
            lines[2],
            "W-1,b,2023-11-01,manual,100.0000,4000.00,3000.00,200.00,0.00,7200.00,ok,"
        );
        assert!(lines[3].starts_with("W-1,c,2023-12-01,,,,,,,,ambiguous,"));
    }

    #[test]
    fn test_same_day_rows_follow_reading_time() {
        let readings = "WELL_ID,READING_ID,DATE,TIME,TYPE,METER_READING,ROLLOVER,DOMESTIC_AF
W-1,a,2023-10-01,,initial,100,,
W-1,b,2023-11-01,07:00,manual,50,,
W-1,c,2023-11-01,09:00,manual,150,,
";
        let dataset = Dataset::from_csv(WELLS, readings, None).unwrap();
        let computations = compute_wells(&dataset.wells, &dataset.ledgers, &EngineConfig::default());
        assert_eq!(computations[0].rejected.len(), 1);

        let csv = readings_csv(&computations).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("W-1,a,"));
        assert!(lines[2].starts_with("W-1,b,2023-11-01,,,,,,,,ambiguous,"));
        assert!(lines[3].starts_with("W-1,c,2023-11-01,manual,50.0000,"));
    }
}
