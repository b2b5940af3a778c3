//! Extraction deltas between consecutive readings.
//!
//! The previous reading is always passed in explicitly: it is the last
//! reading the pipeline *accepted* for the well, never a rejected one.

use crate::error::{AmbiguousReason, InvalidReason, ReadingError};
use crate::reading::{Reading, ReadingType};
use crate::units::{to_acre_feet, MeterUnit};

fn check_meter_value(value: f64) -> Result<(), ReadingError> {
    if !value.is_finite() || value < 0.0 {
        return Err(InvalidReason::InvalidMeterValue(value).into());
    }
    Ok(())
}

/// Raw totalizer delta in the meter's native unit.
///
/// `Ok(None)` means the reading only sets a baseline: it is the first
/// reading of the well or an `Initial` reading.
pub fn resolve_raw_delta(current: &Reading, previous: Option<&Reading>) -> Result<Option<f64>, ReadingError> {
    check_meter_value(current.meter_reading)?;

    let previous = match previous {
        Some(previous) if current.reading_type != ReadingType::Initial => previous,
        _ => return Ok(None),
    };
    if previous.reading_type == ReadingType::Final {
        return Err(AmbiguousReason::ChainClosed.into());
    }

    let previous_raw = previous.meter_reading;
    let current_raw = current.meter_reading;
    match current.rollover {
        Some(rollover) => {
            if !rollover.is_finite() || rollover < previous_raw {
                return Err(InvalidReason::RolloverBelowPrevious {
                    rollover,
                    previous: previous_raw,
                }
                .into());
            }
            let delta = (rollover - previous_raw) + current_raw;
            if delta < 0.0 {
                return Err(InvalidReason::NegativeExtraction(delta).into());
            }
            Ok(Some(delta))
        }
        None if current_raw >= previous_raw => Ok(Some(current_raw - previous_raw)),
        None => Err(AmbiguousReason::Rollover {
            previous: previous_raw,
            current: current_raw,
        }
        .into()),
    }
}

/// Extraction in acre-feet attributable to `current`.
pub fn resolve_extraction(
    current: &Reading,
    previous: Option<&Reading>,
    unit: MeterUnit,
    multiplier: f64,
) -> Result<Option<f64>, ReadingError> {
    Ok(resolve_raw_delta(current, previous)?.map(|delta| to_acre_feet(delta, unit, multiplier)))
}
