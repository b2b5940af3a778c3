//! Shared utility functions for SGMA crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate, NaiveTime};

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Parse a reading time in "HH:MM" or "HH:MM:SS" format
    pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map_err(|e| anyhow::anyhow!("invalid time '{}': {}", s, e))
    }

    /// First day of the month `offset` months after `year`/`month`.
    /// Months outside 1..=12 are clamped.
    pub fn first_of_month_offset(year: i32, month: u32, offset: i32) -> NaiveDate {
        let month = month.clamp(1, 12) as i32;
        let total = year * 12 + (month - 1) + offset;
        let y = total.div_euclid(12);
        let m = total.rem_euclid(12) as u32 + 1;
        NaiveDate::from_ymd_opt(y, m, 1).expect("first day of a month is always a valid date")
    }

    /// Get the water year for a given date.
    /// A water year is labelled by the calendar year it starts in,
    /// e.g. with an October start, Oct 1 2022 -> 2022 and Sep 30 2023 -> 2022.
    pub fn water_year_for_date(date: &NaiveDate, start_month: u32) -> i32 {
        let start_month = start_month.clamp(1, 12);
        if date.month() >= start_month {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// First day of the given water year.
    pub fn water_year_start(water_year: i32, start_month: u32) -> NaiveDate {
        first_of_month_offset(water_year, start_month, 0)
    }

    /// Last day (inclusive) of the given water year.
    pub fn water_year_end(water_year: i32, start_month: u32) -> NaiveDate {
        let next = first_of_month_offset(water_year, start_month, 12);
        next.pred_opt().unwrap_or(next)
    }

    /// Number of days in the water year (365 or 366).
    pub fn days_in_water_year(water_year: i32, start_month: u32) -> i64 {
        let start = water_year_start(water_year, start_month);
        let next = first_of_month_offset(water_year, start_month, 12);
        (next - start).num_days()
    }

}
