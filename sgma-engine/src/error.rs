/// Error types for the extraction engine
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// A reading that contradicts the data already on record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidReason {
    /// Raw meter value is negative or not a finite number
    #[error("meter value {0} is negative or not a number")]
    InvalidMeterValue(f64),

    /// Rollover value is below the previous raw reading
    #[error("rollover value {rollover} is below the previous meter reading {previous}")]
    RolloverBelowPrevious { rollover: f64, previous: f64 },

    /// Rollover arithmetic produced a negative delta
    #[error("computed extraction {0} is negative")]
    NegativeExtraction(f64),

    /// Declared domestic volume is larger than the reading's extraction
    #[error("domestic extraction {domestic} AF exceeds total extraction {total} AF")]
    DomesticExceedsTotal { domestic: f64, total: f64 },

    /// Declared domestic volume is negative
    #[error("domestic extraction {0} AF is negative")]
    NegativeDomestic(f64),
}

/// A reading that cannot be resolved without more information from the operator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmbiguousReason {
    /// The meter went backwards and no rollover value was supplied
    #[error(
        "meter went backwards from {previous} to {current}; supply a rollover value or mark the reading as initial"
    )]
    Rollover { previous: f64, current: f64 },

    /// The previous reading retired the meter
    #[error("previous reading was final; mark this reading as initial to start a new meter chain")]
    ChainClosed,
}

/// Why a single reading was rejected from the extraction chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadingError {
    #[error("invalid reading: {0}")]
    InvalidInput(InvalidReason),

    #[error("ambiguous reading: {0}")]
    Ambiguous(AmbiguousReason),
}

impl ReadingError {
    /// Ambiguous readings are resolvable by supplying more information,
    /// invalid ones need their data corrected.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ReadingError::Ambiguous(_))
    }
}

impl From<InvalidReason> for ReadingError {
    fn from(reason: InvalidReason) -> Self {
        ReadingError::InvalidInput(reason)
    }
}

impl From<AmbiguousReason> for ReadingError {
    fn from(reason: AmbiguousReason) -> Self {
        ReadingError::Ambiguous(reason)
    }
}

/// Rejected ledger mutations. The ledger is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("well {well_id} already has a reading at {date} {time}")]
    DuplicateReading {
        well_id: String,
        date: NaiveDate,
        time: NaiveTime,
    },

    #[error("well {well_id} already has a reading with id {reading_id}")]
    DuplicateId { well_id: String, reading_id: String },

    #[error("reading {reading_id} not found for well {well_id}")]
    UnknownReading { well_id: String, reading_id: String },

    #[error("reading {reading_id} belongs to well {actual}, not {expected}")]
    WrongWell {
        reading_id: String,
        expected: String,
        actual: String,
    },
}

/// Errors raised while parsing CSV input.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A row had a missing or malformed field
    #[error("row {row}: {message}")]
    Field { row: usize, message: String },
}

impl ParseError {
    pub(crate) fn field(row: usize, message: impl Into<String>) -> Self {
        ParseError::Field {
            row,
            message: message.into(),
        }
    }
}

/// Errors raised while loading engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
