use crate::fees::FixedFeePeriod;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sgma_utils::dates;
use std::fmt;

/// A 12-month allocation period starting on the first of a configured month.
///
/// California's water year runs from October 1 to September 30; other
/// agencies use a calendar year. The year is labelled by the calendar year
/// it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaterYear {
    pub year: i32,
    pub start_month: u32,
}

/// A closed date range inside a water year: a reporting or billing period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub label: String,
    pub start: NaiveDate,
    /// Inclusive
    pub end: NaiveDate,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl WaterYear {
    pub fn new(year: i32, start_month: u32) -> Self {
        WaterYear {
            year,
            start_month: start_month.clamp(1, 12),
        }
    }

    /// The water year a date falls in.
    pub fn containing(date: NaiveDate, start_month: u32) -> Self {
        WaterYear::new(dates::water_year_for_date(&date, start_month), start_month)
    }

    pub fn start(&self) -> NaiveDate {
        dates::water_year_start(self.year, self.start_month)
    }

    pub fn end(&self) -> NaiveDate {
        dates::water_year_end(self.year, self.start_month)
    }

    pub fn total_days(&self) -> i64 {
        dates::days_in_water_year(self.year, self.start_month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start() <= date && date <= self.end()
    }

    /// Days from the start of the year through `as_of`, inclusive, clamped to
    /// `1..=total_days` so early-year and post-year projections stay finite.
    pub fn elapsed_days(&self, as_of: NaiveDate) -> i64 {
        let elapsed = (as_of - self.start()).num_days() + 1;
        elapsed.clamp(1, self.total_days())
    }

    /// The four quarterly reporting periods, first quarter first.
    pub fn quarters(&self) -> Vec<Period> {
        (0..4)
            .map(|q| {
                let start = dates::first_of_month_offset(self.year, self.start_month, q * 3);
                let next = dates::first_of_month_offset(self.year, self.start_month, q * 3 + 3);
                Period {
                    label: format!("{}-Q{}", self, q + 1),
                    start,
                    end: next - Duration::days(1),
                }
            })
            .collect()
    }

    /// The whole year as a single period.
    pub fn as_period(&self) -> Period {
        Period {
            label: self.to_string(),
            start: self.start(),
            end: self.end(),
        }
    }

    /// Reporting quarter that contains `date`, which need not be in this year.
    pub fn reporting_period(date: NaiveDate, start_month: u32) -> Period {
        WaterYear::containing(date, start_month)
            .quarters()
            .into_iter()
            .find(|q| q.contains(date))
            .unwrap_or_else(|| WaterYear::containing(date, start_month).as_period())
    }

    /// Billing period for a fixed fee that contains `date`.
    pub fn billing_period(date: NaiveDate, start_month: u32, period: FixedFeePeriod) -> Period {
        match period {
            FixedFeePeriod::Quarterly => WaterYear::reporting_period(date, start_month),
            FixedFeePeriod::Annual => WaterYear::containing(date, start_month).as_period(),
        }
    }

    /// Every billing period overlapping `from..=to`, in order.
    pub fn billing_periods_between(
        from: NaiveDate,
        to: NaiveDate,
        start_month: u32,
        period: FixedFeePeriod,
    ) -> Vec<Period> {
        let mut periods = Vec::new();
        let mut cursor = from;
        while cursor <= to {
            let current = WaterYear::billing_period(cursor, start_month, period);
            let Some(next) = current.end.succ_opt() else {
                periods.push(current);
                break;
            };
            cursor = next;
            periods.push(current);
        }
        periods
    }
}

impl fmt::Display for WaterYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WY{}", self.year)
    }
}
