use serde::Serialize;

/// Year-end extrapolation of a year-to-date extraction.
///
/// Informational only: it is never folded back into year-to-date figures
/// and is rebuilt for every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub elapsed_days: i64,
    pub total_days: i64,
    pub monthly_rate_af: f64,
    pub projected_total_af: f64,
    pub projected_percent: Option<f64>,
    /// Projected to finish the year above its allocation
    pub at_risk: bool,
}

/// Extrapolate `ytd_af` over the rest of the year at the pace seen so far.
pub fn project(ytd_af: f64, elapsed_days: i64, total_days: i64, total_allocation_af: Option<f64>) -> Projection {
    let total_days = total_days.max(1);
    let elapsed_days = elapsed_days.clamp(1, total_days);
    // adding 0.0 turns a negative zero positive
    let ytd_af = if ytd_af.is_finite() { ytd_af.max(0.0) + 0.0 } else { 0.0 };

    let elapsed_months = (elapsed_days as f64 * 12.0 / total_days as f64).max(1.0);
    let monthly_rate_af = ytd_af / elapsed_months;
    let projected_total_af = ytd_af * total_days as f64 / elapsed_days as f64;
    let projected_percent = crate::allocation::percent_of(projected_total_af, total_allocation_af);

    Projection {
        elapsed_days,
        total_days,
        monthly_rate_af,
        projected_total_af,
        projected_percent,
        at_risk: projected_percent.is_some_and(|p| p > 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_year_doubles() {
        let p = project(400.0, 183, 366, Some(1000.0));
        assert_eq!(p.projected_total_af, 800.0);
        assert_eq!(p.projected_percent, Some(80.0));
        assert_eq!(p.monthly_rate_af, 400.0 / 6.0);
        assert!(!p.at_risk);
    }

    #[test]
    fn first_days_clamp_months_to_one() {
        let p = project(10.0, 3, 365, Some(100.0));
        assert_eq!(p.monthly_rate_af, 10.0);
        assert!(p.at_risk, "10 AF in 3 days runs far past 100 AF");
    }

    #[test]
    fn zero_elapsed_days_do_not_divide_by_zero() {
        let p = project(5.0, 0, 365, Some(100.0));
        assert_eq!(p.elapsed_days, 1);
        assert!(p.projected_total_af.is_finite());
        let p = project(0.0, 0, 0, None);
        assert_eq!(p.projected_total_af, 0.0);
        assert_eq!(p.projected_percent, None);
    }

    #[test]
    fn never_negative_or_nan() {
        let p = project(f64::NAN, 10, 365, Some(100.0));
        assert_eq!(p.projected_total_af, 0.0);
        let p = project(-3.0, 10, 365, Some(100.0));
        assert_eq!(p.projected_total_af, 0.0);
    }

    #[test]
    fn negative_zero_projects_positive_zero() {
        let p = project(-0.0, 120, 366, Some(100.0));
        assert!(p.monthly_rate_af.is_sign_positive());
        assert!(p.projected_total_af.is_sign_positive());
        assert!(p.projected_percent.unwrap().is_sign_positive());
        assert!(!p.at_risk);
    }

    #[test]
    fn full_year_projects_ytd() {
        let p = project(750.0, 365, 365, Some(0.0));
        assert_eq!(p.projected_total_af, 750.0);
        assert_eq!(p.monthly_rate_af, 62.5);
        assert_eq!(p.projected_percent, None);
        assert!(!p.at_risk);
    }
}
