use crate::error::ParseError;
use crate::parse::{self, CsvBatch};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a meter reading was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingType {
    Manual,
    /// Pushed by an automatic (AMI) meter
    Ami,
    Estimated,
    /// Starts a new meter chain; no extraction against the prior reading
    Initial,
    /// Retires the meter; the next reading must be `Initial`
    Final,
}

impl FromStr for ReadingType {
    type Err = crate::fees::UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "manual" => Ok(ReadingType::Manual),
            "ami" | "automatic" | "ami_automatic" => Ok(ReadingType::Ami),
            "estimated" | "estimate" => Ok(ReadingType::Estimated),
            "initial" => Ok(ReadingType::Initial),
            "final" => Ok(ReadingType::Final),
            _ => Err(crate::fees::UnknownVariant {
                kind: "reading type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReadingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReadingType::Manual => "manual",
            ReadingType::Ami => "ami",
            ReadingType::Estimated => "estimated",
            ReadingType::Initial => "initial",
            ReadingType::Final => "final",
        };
        write!(f, "{}", label)
    }
}

/// Position of a reading in its well's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReadingKey {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// A single totalizer reading for one well, as entered by an operator or
/// pushed by a meter. Derived values live on `ComputedReading`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: String,
    pub well_id: String,
    pub date: NaiveDate,
    /// Missing times sort as midnight
    pub time: Option<NaiveTime>,
    pub reading_type: ReadingType,
    /// Raw totalizer value in the meter's native unit
    pub meter_reading: f64,
    /// Totalizer maximum reached before wrapping back to zero
    pub rollover: Option<f64>,
    /// Declared domestic share of this reading's extraction, in AF
    pub domestic_af: Option<f64>,
}

impl Reading {
    pub fn new(
        well_id: impl Into<String>,
        id: impl Into<String>,
        date: NaiveDate,
        reading_type: ReadingType,
        meter_reading: f64,
    ) -> Self {
        Reading {
            id: id.into(),
            well_id: well_id.into(),
            date,
            time: None,
            reading_type,
            meter_reading,
            rollover: None,
            domestic_af: None,
        }
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_rollover(mut self, rollover: f64) -> Self {
        self.rollover = Some(rollover);
        self
    }

    pub fn with_domestic(mut self, domestic_af: f64) -> Self {
        self.domestic_af = Some(domestic_af);
        self
    }

    pub fn key(&self) -> ReadingKey {
        ReadingKey {
            date: self.date,
            time: self.time.unwrap_or(NaiveTime::MIN),
        }
    }

    /// Parse a CSV string of meter readings.
    ///
    /// Expected columns (with headers):
    /// `WELL_ID,READING_ID,DATE,TIME,TYPE,METER_READING,ROLLOVER,DOMESTIC_AF`
    ///
    /// # Example CSV
    /// ```text
    /// WELL_ID,READING_ID,DATE,TIME,TYPE,METER_READING,ROLLOVER,DOMESTIC_AF
    /// W-1,r1,2023-10-01,08:00,initial,1000,,
    /// W-1,r2,2023-11-01,08:00,manual,1500,,20
    /// ```
    pub fn parse_readings_csv(csv_data: &str) -> Result<CsvBatch<Reading>, ParseError> {
        parse::parse_csv(csv_data, "reading", |r, row| {
            let time = parse::cell(r, 3)
                .map(|s| {
                    sgma_utils::dates::parse_time(s)
                        .map_err(|e| ParseError::field(row, e.to_string()))
                })
                .transpose()?;
            Ok(Reading {
                well_id: parse::required(r, 0, "well id", row)?.to_string(),
                id: parse::required(r, 1, "reading id", row)?.to_string(),
                date: parse::optional_date(r, 2, "reading date", row)?
                    .ok_or_else(|| ParseError::field(row, "missing reading date"))?,
                time,
                reading_type: parse::parsed(r, 4, "reading type", row)?,
                meter_reading: parse::parsed(r, 5, "meter reading", row)?,
                rollover: parse::optional(r, 6, "rollover", row)?,
                domestic_af: parse::optional(r, 7, "domestic extraction", row)?,
            })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const READINGS_CSV: &str = "WELL_ID,READING_ID,DATE,TIME,TYPE,METER_READING,ROLLOVER,DOMESTIC_AF
W-1,r1,2023-10-01,08:00,initial,1000,,
W-1,r2,2023-11-01,,manual,1500,,20
W-1,r3,2023-12-01,07:45,ami,999000,1000000,
W-1,r4,2023-12-15,07:45,guess,1,,
W-1,r5,12/20/2023,07:45,manual,1,,
";

    #[test]
    fn test_parse_readings_csv() {
        let batch = Reading::parse_readings_csv(READINGS_CSV).unwrap();
        assert_eq!(batch.records.len(), 3);
        assert_eq!(batch.rejected.len(), 2);

        let r2 = &batch.records[1];
        assert_eq!(r2.reading_type, ReadingType::Manual);
        assert_eq!(r2.time, None);
        assert_eq!(r2.domestic_af, Some(20.0));

        let r3 = &batch.records[2];
        assert_eq!(r3.reading_type, ReadingType::Ami);
        assert_eq!(r3.rollover, Some(1_000_000.0));
    }

    #[test]
    fn test_readings_order_by_date_then_time() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let morning = Reading::new("W-1", "a", d, ReadingType::Manual, 1.0)
            .with_time(NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        let untimed = Reading::new("W-1", "b", d, ReadingType::Manual, 1.0);
        let next_day = Reading::new("W-1", "c", d.succ_opt().unwrap(), ReadingType::Manual, 1.0);
        assert!(untimed.key() < morning.key());
        assert!(morning.key() < next_day.key());

        let mut readings = vec![next_day.clone(), morning.clone(), untimed.clone()];
        readings.sort_by_key(Reading::key);
        assert_eq!(readings, vec![untimed, morning, next_day]);
    }

    #[test]
    fn test_reading_type_aliases() {
        assert_eq!("AMI Automatic".parse::<ReadingType>().unwrap(), ReadingType::Ami);
        assert_eq!("Initial".parse::<ReadingType>().unwrap(), ReadingType::Initial);
        assert!("reset".parse::<ReadingType>().is_err());
    }
}
