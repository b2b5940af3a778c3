//! Full-chain recomputation of a well's derived data.
//!
//! Rollover resolution depends on each reading's neighbours, so any edit to
//! a ledger recomputes the whole chain. [`WellBook`] makes that a single
//! step: the new computation is built beside the old one and swapped in only
//! after the ledger edit succeeded.

use crate::config::EngineConfig;
use crate::error::{LedgerError, ReadingError};
use crate::fees::{compute_fees, FeeBreakdown, RateSchedule};
use crate::ledger::ReadingLedger;
use crate::reading::Reading;
use crate::rollover::resolve_extraction;
use crate::water_year::{Period, WaterYear};
use crate::well::Well;
use chrono::{NaiveDate, NaiveTime};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A reading with its derived figures and the rates it was priced with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedReading {
    pub reading: Reading,
    /// `None` for baseline readings (first or `Initial`)
    pub extraction_af: Option<f64>,
    pub fees: Option<FeeBreakdown>,
    pub rate_schedule: Option<RateSchedule>,
}

/// A reading excluded from the chain, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedReading {
    pub well_id: String,
    pub reading_id: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    #[serde(serialize_with = "serialize_display")]
    pub error: ReadingError,
}

fn serialize_display<S: serde::Serializer>(error: &ReadingError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// A fixed fee owed for a billing period that no single reading covered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodCharge {
    pub period: Period,
    pub amount: f64,
}

/// Everything derived from one well's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct WellComputation {
    pub well_id: String,
    pub computed: Vec<ComputedReading>,
    pub rejected: Vec<RejectedReading>,
    pub period_charges: Vec<PeriodCharge>,
    /// Date of the latest reading on the ledger, accepted or not, whatever
    /// the report date
    pub last_reading_date: Option<NaiveDate>,
}

impl WellComputation {
    /// Accepted readings that carry an extraction volume.
    pub fn extractions(&self) -> impl Iterator<Item = (&Reading, f64)> + '_ {
        self.computed
            .iter()
            .filter_map(|c| c.extraction_af.map(|af| (&c.reading, af)))
    }

    pub fn total_extraction_af(&self) -> f64 {
        self.extractions().fold(0.0, |total, (_, af)| total + af)
    }

    /// Date of the latest reading, accepted or rejected, on or before `as_of`.
    pub fn last_reading_on_or_before(&self, as_of: NaiveDate) -> Option<NaiveDate> {
        let computed = self.computed.iter().map(|c| c.reading.date);
        let rejected = self.rejected.iter().map(|r| r.date);
        computed.chain(rejected).filter(|d| *d <= as_of).max()
    }

    /// Reading-level fees plus fixed fees charged at period level.
    pub fn total_fees(&self) -> f64 {
        let reading_fees = self.computed.iter().filter_map(|c| c.fees).map(|f| f.total_fee);
        let period_fees = self.period_charges.iter().map(|c| c.amount);
        reading_fees.chain(period_fees).fold(0.0, |total, fee| total + fee)
    }

    pub fn get(&self, reading_id: &str) -> Option<&ComputedReading> {
        self.computed.iter().find(|c| c.reading.id == reading_id)
    }

    pub fn rejection(&self, reading_id: &str) -> Option<&RejectedReading> {
        self.rejected.iter().find(|r| r.reading_id == reading_id)
    }
}

/// Rate schedules frozen on readings that were already priced.
pub type FrozenRates = HashMap<String, Option<RateSchedule>>;

/// Compute every reading of a well against its current rate schedule.
pub fn compute_well(well: &Well, ledger: &ReadingLedger, config: &EngineConfig) -> WellComputation {
    compute_well_with_rates(well, ledger, config, &FrozenRates::new())
}

/// Compute every reading of a well. Readings listed in `frozen` are priced
/// with the schedule recorded for them; all others use the well's current one.
pub fn compute_well_with_rates(
    well: &Well,
    ledger: &ReadingLedger,
    config: &EngineConfig,
    frozen: &FrozenRates,
) -> WellComputation {
    let start_month = config.water_year_start_month;
    let mut computed = Vec::with_capacity(ledger.len());
    let mut rejected = Vec::new();
    let mut billed: BTreeSet<Period> = BTreeSet::new();
    let mut previous: Option<&Reading> = None;

    for reading in ledger {
        let schedule = frozen
            .get(&reading.id)
            .cloned()
            .unwrap_or_else(|| well.rate_schedule.clone());
        match price_reading(well, reading, previous, schedule.as_ref(), config) {
            Ok((extraction_af, fees)) => {
                let fees = match (fees, previous, schedule.as_ref()) {
                    (Some(fees), Some(previous), Some(schedule)) if schedule.has_fixed_fee() => {
                        let covered = full_periods_covered(previous.date, reading.date, start_month, schedule, &mut billed);
                        Some(fees.with_fixed_fee(covered as f64 * schedule.fixed_fee.unwrap_or(0.0)))
                    }
                    (fees, _, _) => fees,
                };
                debug!(
                    "well {} reading {}: extraction {:?} AF, fees {:?}",
                    well.id, reading.id, extraction_af, fees
                );
                computed.push(ComputedReading {
                    reading: reading.clone(),
                    extraction_af,
                    fees,
                    rate_schedule: schedule,
                });
                previous = Some(reading);
            }
            Err(error) => {
                warn!("well {} reading {} rejected: {}", well.id, reading.id, error);
                rejected.push(RejectedReading {
                    well_id: well.id.clone(),
                    reading_id: reading.id.clone(),
                    date: reading.date,
                    time: reading.time,
                    error,
                });
            }
        }
    }

    let period_charges = period_level_charges(&computed, start_month, &billed);
    info!(
        "well {}: {} readings computed, {} rejected",
        well.id,
        computed.len(),
        rejected.len()
    );
    WellComputation {
        well_id: well.id.clone(),
        computed,
        rejected,
        period_charges,
        last_reading_date: ledger.last().map(|r| r.date),
    }
}

fn price_reading(
    well: &Well,
    reading: &Reading,
    previous: Option<&Reading>,
    schedule: Option<&RateSchedule>,
    config: &EngineConfig,
) -> Result<(Option<f64>, Option<FeeBreakdown>), ReadingError> {
    let extraction = resolve_extraction(reading, previous, well.meter_unit, well.unit_multiplier)?;
    let Some(extraction) = extraction else {
        if reading.domestic_af.is_some() {
            debug!("well {} reading {}: domestic volume ignored on baseline", well.id, reading.id);
        }
        return Ok((None, None));
    };
    let fees = compute_fees(extraction, reading.domestic_af, schedule, config.domestic_policy)?;
    Ok((Some(extraction), Some(fees)))
}

/// Billing periods lying entirely within `from..=to` that have not been
/// billed yet. They are marked billed.
fn full_periods_covered(
    from: NaiveDate,
    to: NaiveDate,
    start_month: u32,
    schedule: &RateSchedule,
    billed: &mut BTreeSet<Period>,
) -> usize {
    let mut count = 0;
    for period in WaterYear::billing_periods_between(from, to, start_month, schedule.fixed_fee_period) {
        if from <= period.start && period.end <= to && !billed.contains(&period) {
            billed.insert(period);
            count += 1;
        }
    }
    count
}

/// One fixed fee for every billing period holding a priced reading, unless
/// a reading already carried that period's fee.
fn period_level_charges(computed: &[ComputedReading], start_month: u32, billed: &BTreeSet<Period>) -> Vec<PeriodCharge> {
    let mut charges: BTreeMap<Period, f64> = BTreeMap::new();
    for c in computed.iter().filter(|c| c.extraction_af.is_some()) {
        let Some(schedule) = c.rate_schedule.as_ref().filter(|s| s.has_fixed_fee()) else {
            continue;
        };
        let period = WaterYear::billing_period(c.reading.date, start_month, schedule.fixed_fee_period);
        if billed.contains(&period) {
            continue;
        }
        charges
            .entry(period)
            .or_insert_with(|| schedule.fixed_fee.unwrap_or(0.0));
    }
    charges
        .into_iter()
        .map(|(period, amount)| PeriodCharge { period, amount })
        .collect()
}

/// Compute many wells in parallel. Wells share nothing, so one well's bad
/// data never reaches another's figures. Wells without readings get an
/// empty computation.
pub fn compute_wells(
    wells: &[Well],
    ledgers: &BTreeMap<String, ReadingLedger>,
    config: &EngineConfig,
) -> Vec<WellComputation> {
    wells
        .par_iter()
        .map(|well| match ledgers.get(&well.id) {
            Some(ledger) => compute_well(well, ledger, config),
            None => compute_well(well, &ReadingLedger::new(well.id.clone()), config),
        })
        .collect()
}

/// A well, its ledger, and the derived data kept consistent with both.
#[derive(Debug, Clone)]
pub struct WellBook {
    well: Well,
    ledger: ReadingLedger,
    computation: WellComputation,
    config: EngineConfig,
}

impl WellBook {
    pub fn new(well: Well, ledger: ReadingLedger, config: EngineConfig) -> Self {
        let computation = compute_well(&well, &ledger, &config);
        WellBook {
            well,
            ledger,
            computation,
            config,
        }
    }

    pub fn well(&self) -> &Well {
        &self.well
    }

    pub fn ledger(&self) -> &ReadingLedger {
        &self.ledger
    }

    pub fn computation(&self) -> &WellComputation {
        &self.computation
    }

    pub fn insert_reading(&mut self, reading: Reading) -> Result<&WellComputation, LedgerError> {
        let mut ledger = self.ledger.clone();
        ledger.insert(reading)?;
        Ok(self.commit(ledger, None))
    }

    /// Edit a reading. The edited reading is re-priced with the well's
    /// current rates.
    pub fn update_reading(&mut self, reading: Reading) -> Result<&WellComputation, LedgerError> {
        let mut ledger = self.ledger.clone();
        let reading_id = reading.id.clone();
        ledger.update(reading)?;
        Ok(self.commit(ledger, Some(reading_id.as_str())))
    }

    pub fn remove_reading(&mut self, reading_id: &str) -> Result<&WellComputation, LedgerError> {
        let mut ledger = self.ledger.clone();
        ledger.remove(reading_id)?;
        Ok(self.commit(ledger, None))
    }

    /// Change the well's rates. Readings already priced keep the schedule
    /// they were priced with until [`WellBook::reprice`] is called.
    pub fn set_rate_schedule(&mut self, schedule: Option<RateSchedule>) {
        self.well.rate_schedule = schedule;
    }

    /// Recompute every reading against the well's current rates.
    pub fn reprice(&mut self) -> &WellComputation {
        self.computation = compute_well(&self.well, &self.ledger, &self.config);
        &self.computation
    }

    fn frozen_rates(&self, except: Option<&str>) -> FrozenRates {
        self.computation
            .computed
            .iter()
            .filter(|c| Some(c.reading.id.as_str()) != except)
            .map(|c| (c.reading.id.clone(), c.rate_schedule.clone()))
            .collect()
    }

    fn commit(&mut self, ledger: ReadingLedger, repriced: Option<&str>) -> &WellComputation {
        let frozen = self.frozen_rates(repriced);
        let computation = compute_well_with_rates(&self.well, &ledger, &self.config, &frozen);
        self.ledger = ledger;
        self.computation = computation;
        &self.computation
    }
}
