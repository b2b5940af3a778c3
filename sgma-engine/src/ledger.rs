//! Per-well ordered reading storage.
//!
//! The ledger is the only source of truth for a well's chain. It keeps
//! readings sorted by `(date, time)` and refuses any mutation that would
//! break the total order, leaving itself untouched on error.

use crate::error::LedgerError;
use crate::reading::{Reading, ReadingKey};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadingLedger {
    well_id: String,
    readings: Vec<Reading>,
}

impl ReadingLedger {
    pub fn new(well_id: impl Into<String>) -> Self {
        ReadingLedger {
            well_id: well_id.into(),
            readings: Vec::new(),
        }
    }

    /// Build a ledger from unordered readings.
    pub fn from_readings(
        well_id: impl Into<String>,
        readings: impl IntoIterator<Item = Reading>,
    ) -> Result<Self, LedgerError> {
        let mut ledger = ReadingLedger::new(well_id);
        for reading in readings {
            ledger.insert(reading)?;
        }
        Ok(ledger)
    }

    /// Group a flat list of readings into one ledger per well.
    ///
    /// Readings that collide with one already placed are returned alongside.
    pub fn group_by_well(readings: Vec<Reading>) -> (BTreeMap<String, ReadingLedger>, Vec<LedgerError>) {
        let mut ledgers: BTreeMap<String, ReadingLedger> = BTreeMap::new();
        let mut errors = Vec::new();
        for reading in readings {
            let ledger = ledgers
                .entry(reading.well_id.clone())
                .or_insert_with(|| ReadingLedger::new(reading.well_id.clone()));
            if let Err(e) = ledger.insert(reading) {
                log::warn!("ledger: {}", e);
                errors.push(e);
            }
        }
        (ledgers, errors)
    }

    pub fn well_id(&self) -> &str {
        &self.well_id
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.readings.iter()
    }

    pub fn last(&self) -> Option<&Reading> {
        self.readings.last()
    }

    pub fn get(&self, reading_id: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.id == reading_id)
    }

    pub fn insert(&mut self, reading: Reading) -> Result<(), LedgerError> {
        self.check_well(&reading)?;
        if self.get(&reading.id).is_some() {
            return Err(LedgerError::DuplicateId {
                well_id: self.well_id.clone(),
                reading_id: reading.id,
            });
        }
        let position = self.vacant_position(reading.key(), None)?;
        self.readings.insert(position, reading);
        Ok(())
    }

    /// Replace the reading with the same id, possibly moving it. Returns the
    /// previous version.
    pub fn update(&mut self, reading: Reading) -> Result<Reading, LedgerError> {
        self.check_well(&reading)?;
        let current = self.index_of(&reading.id)?;
        self.vacant_position(reading.key(), Some(current))?;
        let previous = self.readings.remove(current);
        // cannot collide now that the slot above was checked
        let position = self
            .readings
            .binary_search_by_key(&reading.key(), Reading::key)
            .unwrap_or_else(|p| p);
        self.readings.insert(position, reading);
        Ok(previous)
    }

    pub fn remove(&mut self, reading_id: &str) -> Result<Reading, LedgerError> {
        let index = self.index_of(reading_id)?;
        Ok(self.readings.remove(index))
    }

    fn check_well(&self, reading: &Reading) -> Result<(), LedgerError> {
        if reading.well_id != self.well_id {
            return Err(LedgerError::WrongWell {
                reading_id: reading.id.clone(),
                expected: self.well_id.clone(),
                actual: reading.well_id.clone(),
            });
        }
        Ok(())
    }

    fn index_of(&self, reading_id: &str) -> Result<usize, LedgerError> {
        self.readings
            .iter()
            .position(|r| r.id == reading_id)
            .ok_or_else(|| LedgerError::UnknownReading {
                well_id: self.well_id.clone(),
                reading_id: reading_id.to_string(),
            })
    }

    /// Insertion index for `key`, failing when another reading (other than
    /// the one at `ignore`) already holds it.
    fn vacant_position(&self, key: ReadingKey, ignore: Option<usize>) -> Result<usize, LedgerError> {
        match self.readings.binary_search_by_key(&key, Reading::key) {
            Ok(found) if Some(found) == ignore => Ok(found),
            Ok(_) => Err(LedgerError::DuplicateReading {
                well_id: self.well_id.clone(),
                date: key.date,
                time: key.time,
            }),
            Err(position) => Ok(position),
        }
    }
}

impl<'a> IntoIterator for &'a ReadingLedger {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::ReadingType;
    use chrono::{NaiveDate, NaiveTime};

    fn reading(id: &str, day: u32, value: f64) -> Reading {
        let date = NaiveDate::from_ymd_opt(2023, 11, day).unwrap();
        Reading::new("W-1", id, date, ReadingType::Manual, value)
    }

    fn ids(ledger: &ReadingLedger) -> Vec<&str> {
        ledger.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn inserts_keep_chronological_order() {
        let mut ledger = ReadingLedger::new("W-1");
        ledger.insert(reading("c", 20, 30.0)).unwrap();
        ledger.insert(reading("a", 1, 10.0)).unwrap();
        ledger.insert(reading("b", 10, 20.0)).unwrap();
        assert_eq!(ids(&ledger), vec!["a", "b", "c"]);
        assert_eq!(ledger.last().unwrap().id, "c");
    }

    #[test]
    fn same_day_readings_order_by_time() {
        let mut ledger = ReadingLedger::new("W-1");
        let late = reading("late", 5, 2.0).with_time(NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        let early = reading("early", 5, 1.0).with_time(NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        ledger.insert(late).unwrap();
        ledger.insert(early).unwrap();
        assert_eq!(ids(&ledger), vec!["early", "late"]);
    }

    #[test]
    fn duplicate_key_is_rejected_without_change() {
        let mut ledger = ReadingLedger::from_readings("W-1", vec![reading("a", 1, 10.0)]).unwrap();
        let before = ledger.clone();
        let err = ledger.insert(reading("b", 1, 11.0)).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateReading { .. }));
        assert_eq!(ledger, before);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut ledger = ReadingLedger::from_readings("W-1", vec![reading("a", 1, 10.0)]).unwrap();
        let err = ledger.insert(reading("a", 2, 11.0)).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateId { .. }));
    }

    #[test]
    fn reading_for_other_well_is_rejected() {
        let mut ledger = ReadingLedger::new("W-2");
        let err = ledger.insert(reading("a", 1, 10.0)).unwrap_err();
        assert!(matches!(err, LedgerError::WrongWell { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn update_moves_reading_and_returns_previous() {
        let mut ledger = ReadingLedger::from_readings(
            "W-1",
            vec![reading("a", 1, 10.0), reading("b", 10, 20.0), reading("c", 20, 30.0)],
        )
        .unwrap();
        let previous = ledger.update(reading("a", 25, 40.0)).unwrap();
        assert_eq!(previous.meter_reading, 10.0);
        assert_eq!(ids(&ledger), vec!["b", "c", "a"]);

        // in-place edit keeps its slot
        ledger.update(reading("b", 10, 21.0)).unwrap();
        assert_eq!(ledger.get("b").unwrap().meter_reading, 21.0);
        assert_eq!(ids(&ledger), vec!["b", "c", "a"]);
    }

    #[test]
    fn update_onto_taken_slot_fails() {
        let mut ledger =
            ReadingLedger::from_readings("W-1", vec![reading("a", 1, 10.0), reading("b", 10, 20.0)]).unwrap();
        let before = ledger.clone();
        assert!(ledger.update(reading("a", 10, 15.0)).is_err());
        assert!(ledger.update(reading("zz", 12, 15.0)).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn remove_unknown_reading_fails() {
        let mut ledger = ReadingLedger::from_readings("W-1", vec![reading("a", 1, 10.0)]).unwrap();
        assert!(ledger.remove("zz").is_err());
        assert_eq!(ledger.remove("a").unwrap().id, "a");
        assert!(ledger.is_empty());
    }

    #[test]
    fn group_by_well_splits_and_reports_collisions() {
        let date = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        let readings = vec![
            Reading::new("W-1", "a", date, ReadingType::Manual, 1.0),
            Reading::new("W-2", "a", date, ReadingType::Manual, 1.0),
            Reading::new("W-1", "b", date, ReadingType::Manual, 2.0),
        ];
        let (ledgers, errors) = ReadingLedger::group_by_well(readings);
        assert_eq!(ledgers.len(), 2);
        assert_eq!(ledgers["W-1"].len(), 1);
        assert_eq!(errors.len(), 1);
    }
}
