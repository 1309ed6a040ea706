//! Duration preview result models.
//!
//! This module contains the [`RequestDuration`] type returned by
//! `calc_request_duration`, with one [`YearDuration`] per fiscal year the
//! request touches and the [`DurationTotals`] across all of them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The working time a request consumes within one fiscal year.
///
/// # Example
///
/// ```
/// use leave_ledger::models::YearDuration;
/// use rust_decimal::Decimal;
///
/// let year = YearDuration {
///     fiscal_year: 2024,
///     workday_duration_in_days: Decimal::from(2),
///     workday_duration_in_minutes: 960,
///     allowance_enough: true,
///     outside_of_schedule: false,
///     duration: Decimal::from(2),
/// };
/// assert_eq!(year.fiscal_year, 2024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearDuration {
    /// The fiscal year.
    pub fiscal_year: i32,
    /// Scheduled working days consumed.
    pub workday_duration_in_days: Decimal,
    /// Scheduled working minutes consumed.
    pub workday_duration_in_minutes: i64,
    /// Whether the member's balance covers the request in this year.
    #[serde(rename = "allowanceEnough")]
    pub allowance_enough: bool,
    /// Whether an hour-unit request reaches outside the working windows.
    pub outside_of_schedule: bool,
    /// Schedule-independent length: days for day units, minutes for hour units.
    pub duration: Decimal,
}

/// Sums and flags across every fiscal year of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationTotals {
    /// Sum of working days.
    pub workday_duration_in_days: Decimal,
    /// Sum of working minutes.
    pub workday_duration_in_minutes: i64,
    /// True only if every year has enough allowance.
    #[serde(rename = "allowanceEnough")]
    pub allowance_enough: bool,
    /// True if any year is outside of schedule.
    pub outside_of_schedule: bool,
    /// Sum of raw durations.
    pub duration: Decimal,
}

/// The complete duration preview for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDuration {
    /// Per fiscal year entries in ascending year order.
    pub per_year: Vec<YearDuration>,
    /// Aggregates over `per_year`.
    pub total: DurationTotals,
}

impl RequestDuration {
    /// Builds the result and its totals from per-year entries.
    ///
    /// An empty list yields zero totals with `allowance_enough = true`.
    pub fn from_years(per_year: Vec<YearDuration>) -> Self {
        let total = DurationTotals {
            workday_duration_in_days: per_year.iter().map(|y| y.workday_duration_in_days).sum(),
            workday_duration_in_minutes: per_year
                .iter()
                .map(|y| y.workday_duration_in_minutes)
                .sum(),
            allowance_enough: per_year.iter().all(|y| y.allowance_enough),
            outside_of_schedule: per_year.iter().any(|y| y.outside_of_schedule),
            duration: per_year.iter().map(|y| y.duration).sum(),
        };
        Self { per_year, total }
    }
}
