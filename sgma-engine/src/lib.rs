//! Groundwater extraction accounting.
//!
//! Turns a well's meter readings into extraction volumes (acre-feet) and
//! fees, totals them against annual allocations, projects year-end use and
//! raises compliance alerts. Everything here is a pure computation over
//! ledger state; storage belongs to the caller.
//!
//! The pipeline for one well, leaves first:
//! [`ledger`] → [`rollover`] → [`fees`] → [`pipeline`] → [`allocation`] →
//! [`projection`] → [`alerts`], with [`district`] rolling wells up into
//! their GSA.
pub mod alerts;
pub mod allocation;
pub mod config;
pub mod district;
pub mod error;
pub mod fees;
pub mod ledger;
mod parse;
pub mod pipeline;
pub mod projection;
pub mod reading;
pub mod rollover;
pub mod units;
pub mod water_year;
pub mod well;

pub use alerts::{Alert, AlertCategory, Severity};
pub use allocation::{Allocation, AllocationScope, AllocationSummary, AllocationTable};
pub use config::EngineConfig;
pub use district::{compute_district, compute_districts, DistrictReport, WellReport};
pub use error::{LedgerError, ParseError, ReadingError};
pub use fees::{FeeBreakdown, RateSchedule};
pub use ledger::ReadingLedger;
pub use parse::CsvBatch;
pub use pipeline::{compute_well, compute_wells, ComputedReading, WellBook, WellComputation};
pub use reading::{Reading, ReadingType};
pub use water_year::{Period, WaterYear};
pub use well::{Well, WellStatus};
