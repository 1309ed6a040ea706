//! Request duration preview and allowance sufficiency check.
//!
//! [`calc_request_duration`] is the engine's primary entry point. It splits a
//! candidate request by fiscal year, calculates the working time of each
//! part, and compares the result against the member's balances so the caller
//! can block submissions that would overdraw an allowance.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineResult;
use crate::models::{
    AllowanceBalance, EndAt, LeaveType, MemberSchedule, PublicHolidayDay, RequestDuration,
    StartAt, WeeklySchedule, YearDuration,
};

use super::fiscal_year::split_by_fiscal_year;
use super::working_time::{MemberCalendar, calculate_working_time};

/// The fiscal settings of the workspace a request is made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalSettings {
    /// Zero-based month (0 = January) the fiscal year starts in.
    pub fiscal_year_start_month: u32,
}

/// Everything needed to preview a request: the interval and a snapshot of
/// the member's schedules, holidays and balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationInput {
    /// First moment of the absence.
    pub start: NaiveDateTime,
    /// Last moment of the absence.
    pub end: NaiveDateTime,
    /// Boundary marker for the first day (day units).
    #[serde(default)]
    pub start_at: Option<StartAt>,
    /// Boundary marker for the last day (day units).
    #[serde(default)]
    pub end_at: Option<EndAt>,
    /// The workspace default schedule.
    pub workspace_schedule: WeeklySchedule,
    /// The member's dated schedules.
    #[serde(default)]
    pub member_schedules: Vec<MemberSchedule>,
    /// The member's balances, one per year and allowance type.
    #[serde(default)]
    pub member_allowances: Vec<AllowanceBalance>,
    /// Holidays of the member's calendar.
    #[serde(default)]
    pub member_public_holiday_days: Vec<PublicHolidayDay>,
    /// The leave type requested.
    pub leave_type: LeaveType,
    /// The workspace fiscal settings.
    pub workspace: FiscalSettings,
}

/// Calculates the duration of a request per fiscal year and checks it
/// against the member's allowances.
///
/// For every fiscal year the request touches the balance row of that year
/// is compared with the consumed days (day units) or minutes (hour units).
/// Leave types whose allowance type ignores the limit, that do not take from
/// an allowance, or that have no matching balance row are always
/// sufficient. Spending a year's balance also shrinks what the following
/// year can have brought forward; that effect is folded into the balances
/// used for later years of the same request and is never persisted.
///
/// # Errors
///
/// Returns an error if `end` is before `start`, either lies outside the
/// supported ledger years, or the fiscal start month is outside `0..=11`.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::{DurationInput, FiscalSettings, calc_request_duration};
/// use leave_ledger::models::{EndAt, LeaveType, LeaveUnit, StartAt, WeeklySchedule};
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let input = DurationInput {
///     start: NaiveDateTime::parse_from_str("2024-02-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
///     end: NaiveDateTime::parse_from_str("2024-02-02 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
///     start_at: Some(StartAt::Morning),
///     end_at: Some(EndAt::EndOfDay),
///     workspace_schedule: WeeklySchedule::default(),
///     member_schedules: vec![],
///     member_allowances: vec![],
///     member_public_holiday_days: vec![],
///     leave_type: LeaveType {
///         id: Uuid::nil(),
///         name: "Vacation".to_string(),
///         leave_unit: LeaveUnit::Days,
///         take_from_allowance: true,
///         ignore_schedule: false,
///         ignore_public_holidays: false,
///         allowance_type_id: None,
///         allowance_type: None,
///     },
///     workspace: FiscalSettings { fiscal_year_start_month: 0 },
/// };
///
/// let result = calc_request_duration(&input).unwrap();
/// assert_eq!(result.total.workday_duration_in_days, Decimal::from(2));
/// assert!(result.total.allowance_enough);
/// ```
pub fn calc_request_duration(input: &DurationInput) -> EngineResult<RequestDuration> {
    let segments = split_by_fiscal_year(
        input.start,
        input.end,
        input.start_at,
        input.end_at,
        input.workspace.fiscal_year_start_month,
    )?;

    let calendar = MemberCalendar {
        workspace_schedule: &input.workspace_schedule,
        member_schedules: &input.member_schedules,
        public_holidays: &input.member_public_holiday_days,
    };

    let mut years: Vec<YearDuration> = Vec::new();
    for segment in &segments {
        let working_time = calculate_working_time(segment, &calendar, &input.leave_type);
        match years.iter_mut().find(|y| y.fiscal_year == segment.fiscal_year) {
            Some(entry) => {
                entry.workday_duration_in_days += working_time.workday_days;
                entry.workday_duration_in_minutes += working_time.workday_minutes;
                entry.duration += working_time.duration;
                entry.outside_of_schedule |= working_time.outside_of_schedule;
            }
            None => years.push(YearDuration {
                fiscal_year: segment.fiscal_year,
                workday_duration_in_days: working_time.workday_days,
                workday_duration_in_minutes: working_time.workday_minutes,
                allowance_enough: true,
                outside_of_schedule: working_time.outside_of_schedule,
                duration: working_time.duration,
            }),
        }
    }

    let mut balances = input.member_allowances.clone();
    balances.sort_by_key(|b| b.year);

    let (per_year, _) = years.into_iter().fold(
        (Vec::new(), balances),
        |(mut per_year, balances), mut entry| {
            let (enough, balances) = check_year(&entry, &input.leave_type, balances);
            entry.allowance_enough = enough;
            per_year.push(entry);
            (per_year, balances)
        },
    );

    let result = RequestDuration::from_years(per_year);
    debug!(
        years = result.per_year.len(),
        days = %result.total.workday_duration_in_days,
        minutes = result.total.workday_duration_in_minutes,
        allowance_enough = result.total.allowance_enough,
        "Calculated request duration"
    );
    Ok(result)
}

/// Checks one fiscal year against its balance and returns the balances as
/// seen by the following years.
fn check_year(
    entry: &YearDuration,
    leave_type: &LeaveType,
    balances: Vec<AllowanceBalance>,
) -> (bool, Vec<AllowanceBalance>) {
    let allowance_type_id = leave_type.allowance_type_id;
    let consumed = if leave_type.leave_unit.is_day_unit() {
        entry.workday_duration_in_days
    } else {
        Decimal::from(entry.workday_duration_in_minutes)
    };

    let current = balances
        .iter()
        .find(|b| b.year == entry.fiscal_year && b.allowance_type_id == allowance_type_id)
        .map(|b| b.remaining);

    let enough = if leave_type.ignores_allowance_limit() {
        true
    } else {
        match current {
            Some(remaining) => !(leave_type.take_from_allowance && remaining < consumed),
            None => true,
        }
    };

    let balances = match current {
        Some(remaining) if leave_type.take_from_allowance => {
            let carry_limit = (remaining - consumed).max(Decimal::ZERO);
            balances
                .into_iter()
                .map(|b| {
                    if b.year == entry.fiscal_year + 1
                        && b.allowance_type_id == allowance_type_id
                        && b.brought_forward > Decimal::ZERO
                    {
                        shrink_brought_forward(b, carry_limit)
                    } else {
                        b
                    }
                })
                .collect()
        }
        _ => balances,
    };

    (enough, balances)
}

fn shrink_brought_forward(balance: AllowanceBalance, limit: Decimal) -> AllowanceBalance {
    let brought_forward = balance.brought_forward.min(limit);
    let delta = brought_forward - balance.brought_forward;
    AllowanceBalance {
        brought_forward,
        remaining: balance.remaining + delta,
        ..balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AllowanceType, HolidayDuration, LeaveUnit};
    use chrono::NaiveDate;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn vacation_type_id() -> Uuid {
        Uuid::from_u128(100)
    }

    fn vacation() -> LeaveType {
        LeaveType {
            id: Uuid::from_u128(10),
            name: "Vacation".to_string(),
            leave_unit: LeaveUnit::Days,
            take_from_allowance: true,
            ignore_schedule: false,
            ignore_public_holidays: false,
            allowance_type_id: Some(vacation_type_id()),
            allowance_type: Some(AllowanceType {
                id: vacation_type_id(),
                name: "Vacation".to_string(),
                ignore_allowance_limit: false,
                max_carry_forward: dec("5"),
                carry_forward_months_after_fiscal_year: 0,
            }),
        }
    }

    fn balance(year: i32, remaining: &str, brought_forward: &str) -> AllowanceBalance {
        AllowanceBalance {
            year,
            remaining: dec(remaining),
            brought_forward: dec(brought_forward),
            allowance_type_id: Some(vacation_type_id()),
        }
    }

    fn input(start: &str, end: &str, start_at: StartAt, end_at: EndAt) -> DurationInput {
        DurationInput {
            start: make_datetime(start, "00:00:00"),
            end: make_datetime(end, "00:00:00"),
            start_at: Some(start_at),
            end_at: Some(end_at),
            workspace_schedule: WeeklySchedule::default(),
            member_schedules: vec![],
            member_allowances: vec![],
            member_public_holiday_days: vec![],
            leave_type: vacation(),
            workspace: FiscalSettings {
                fiscal_year_start_month: 0,
            },
        }
    }

    #[test]
    fn test_two_weekdays_with_enough_allowance() {
        let mut request = input("2024-02-01", "2024-02-02", StartAt::Morning, EndAt::EndOfDay);
        request.member_allowances = vec![balance(2024, "20", "0")];

        let result = calc_request_duration(&request).unwrap();

        assert_eq!(result.per_year.len(), 1);
        assert_eq!(result.total.workday_duration_in_days, dec("2"));
        assert_eq!(result.total.workday_duration_in_minutes, 960);
        assert_eq!(result.total.duration, dec("2"));
        assert!(result.total.allowance_enough);
    }

    #[test]
    fn test_insufficient_allowance_blocks_request() {
        let mut request = input("2024-02-01", "2024-02-02", StartAt::Morning, EndAt::EndOfDay);
        request.member_allowances = vec![balance(2024, "1", "0")];

        let result = calc_request_duration(&request).unwrap();

        assert!(!result.per_year[0].allowance_enough);
        assert!(!result.total.allowance_enough);
        assert_eq!(result.total.workday_duration_in_days, dec("2"));
        assert_eq!(result.total.workday_duration_in_minutes, 960);
    }

    #[test]
    fn test_ignore_allowance_limit_is_always_enough() {
        let mut request = input("2024-02-01", "2024-02-02", StartAt::Morning, EndAt::EndOfDay);
        request.member_allowances = vec![balance(2024, "0", "0")];
        if let Some(allowance_type) = request.leave_type.allowance_type.as_mut() {
            allowance_type.ignore_allowance_limit = true;
        }

        let result = calc_request_duration(&request).unwrap();
        assert!(result.total.allowance_enough);
    }

    #[test]
    fn test_not_taking_from_allowance_is_always_enough() {
        let mut request = input("2024-02-01", "2024-02-02", StartAt::Morning, EndAt::EndOfDay);
        request.member_allowances = vec![balance(2024, "0", "0")];
        request.leave_type.take_from_allowance = false;

        let result = calc_request_duration(&request).unwrap();
        assert!(result.total.allowance_enough);
    }

    #[test]
    fn test_missing_balance_row_is_enough() {
        let mut request = input("2024-02-01", "2024-02-02", StartAt::Morning, EndAt::EndOfDay);
        request.member_allowances = vec![balance(2023, "0", "0")];

        let result = calc_request_duration(&request).unwrap();
        assert!(result.total.allowance_enough);
    }

    #[test]
    fn test_balance_of_other_allowance_type_is_ignored() {
        let mut request = input("2024-02-01", "2024-02-02", StartAt::Morning, EndAt::EndOfDay);
        request.member_allowances = vec![AllowanceBalance {
            allowance_type_id: Some(Uuid::from_u128(999)),
            ..balance(2024, "0", "0")
        }];

        let result = calc_request_duration(&request).unwrap();
        assert!(result.total.allowance_enough);
    }

    #[test]
    fn test_hour_unit_compares_minutes() {
        let mut request = input("2024-02-05", "2024-02-05", StartAt::Morning, EndAt::EndOfDay);
        request.start = make_datetime("2024-02-05", "09:00:00");
        request.end = make_datetime("2024-02-05", "11:00:00");
        request.start_at = None;
        request.end_at = None;
        request.leave_type.leave_unit = LeaveUnit::Hours;
        request.member_allowances = vec![balance(2024, "90", "0")];

        let result = calc_request_duration(&request).unwrap();

        assert_eq!(result.total.workday_duration_in_minutes, 120);
        assert_eq!(result.total.duration, dec("120"));
        assert!(!result.total.allowance_enough);
    }

    #[test]
    fn test_fiscal_boundary_spends_next_years_carry_forward() {
        let mut request = input("2024-12-29", "2025-01-02", StartAt::Morning, EndAt::EndOfDay);
        request.member_public_holiday_days = vec![PublicHolidayDay {
            date: make_date("2025-01-01"),
            duration: HolidayDuration::FullDay,
        }];
        request.member_allowances = vec![balance(2025, "2", "2"), balance(2024, "2", "0")];

        let result = calc_request_duration(&request).unwrap();

        assert_eq!(result.per_year.len(), 2);
        assert_eq!(result.per_year[0].fiscal_year, 2024);
        assert_eq!(result.per_year[0].workday_duration_in_days, dec("2"));
        assert_eq!(result.per_year[0].duration, dec("3"));
        assert!(result.per_year[0].allowance_enough);

        assert_eq!(result.per_year[1].fiscal_year, 2025);
        assert_eq!(result.per_year[1].workday_duration_in_days, dec("1"));
        assert_eq!(result.per_year[1].duration, dec("2"));
        assert!(!result.per_year[1].allowance_enough);

        assert_eq!(result.total.duration, dec("5"));
        assert!(!result.total.allowance_enough);
    }

    #[test]
    fn test_input_balances_are_not_mutated() {
        let mut request = input("2024-12-29", "2025-01-02", StartAt::Morning, EndAt::EndOfDay);
        request.member_allowances = vec![balance(2024, "2", "0"), balance(2025, "2", "2")];
        let before = request.member_allowances.clone();

        calc_request_duration(&request).unwrap();
        assert_eq!(request.member_allowances, before);
    }

    #[test]
    fn test_shrink_only_reduces_brought_forward() {
        let shrunk = shrink_brought_forward(balance(2025, "10", "3"), dec("1"));
        assert_eq!(shrunk.brought_forward, dec("1"));
        assert_eq!(shrunk.remaining, dec("8"));

        let untouched = shrink_brought_forward(balance(2025, "10", "3"), dec("7"));
        assert_eq!(untouched.brought_forward, dec("3"));
        assert_eq!(untouched.remaining, dec("10"));
    }

    #[test]
    fn test_same_inputs_give_identical_results() {
        let mut request = input("2024-12-23", "2025-01-10", StartAt::Afternoon, EndAt::Lunchtime);
        request.member_allowances = vec![balance(2024, "4", "0"), balance(2025, "25", "4")];

        let first = serde_json::to_string(&calc_request_duration(&request).unwrap()).unwrap();
        let second = serde_json::to_string(&calc_request_duration(&request).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_date_at_end_of_calendar_range_is_an_error() {
        let far = NaiveDate::from_ymd_opt(262142, 6, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut request = input("2024-02-01", "2024-02-01", StartAt::Morning, EndAt::EndOfDay);
        request.start = far;
        request.end = far;

        let result = std::panic::catch_unwind(|| calc_request_duration(&request));
        assert!(matches!(
            result,
            Ok(Err(crate::error::EngineError::InvalidRequest { .. }))
        ));
    }
}
