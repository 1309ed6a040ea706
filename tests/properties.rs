//! Property tests for request duration aggregation.
//!
//! Random requests over several fiscal years must always aggregate
//! consistently: totals are the sums of the per-year figures and the total
//! sufficiency flag is the conjunction of the per-year flags.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use leave_ledger::calculation::{DurationInput, FiscalSettings, calc_request_duration};
use leave_ledger::models::{
    AllowanceBalance, EndAt, LeaveType, LeaveUnit, StartAt, WeeklySchedule,
};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

fn leave_type(leave_unit: LeaveUnit) -> LeaveType {
    LeaveType {
        id: Uuid::from_u128(10),
        name: "Vacation".to_string(),
        leave_unit,
        take_from_allowance: true,
        ignore_schedule: false,
        ignore_public_holidays: false,
        allowance_type_id: None,
        allowance_type: None,
    }
}

fn balances(remaining: &[u32]) -> Vec<AllowanceBalance> {
    remaining
        .iter()
        .enumerate()
        .map(|(i, r)| AllowanceBalance {
            year: 2022 + i as i32,
            remaining: Decimal::from(*r),
            brought_forward: Decimal::from(r % 6),
            allowance_type_id: None,
        })
        .collect()
}

fn day_input(
    offset: i64,
    length: i64,
    afternoon: bool,
    lunchtime: bool,
    start_month: u32,
    remaining: &[u32],
) -> DurationInput {
    let start = base_date() + Duration::days(offset);
    let end = start + Duration::days(length);
    DurationInput {
        start: start.and_time(NaiveTime::MIN),
        end: end.and_time(NaiveTime::MIN),
        start_at: Some(if afternoon {
            StartAt::Afternoon
        } else {
            StartAt::Morning
        }),
        end_at: Some(if lunchtime {
            EndAt::Lunchtime
        } else {
            EndAt::EndOfDay
        }),
        workspace_schedule: WeeklySchedule::default(),
        member_schedules: vec![],
        member_allowances: balances(remaining),
        member_public_holiday_days: vec![],
        leave_type: leave_type(LeaveUnit::Days),
        workspace: FiscalSettings {
            fiscal_year_start_month: start_month,
        },
    }
}

proptest! {
    #[test]
    fn totals_are_sums_of_per_year_figures(
        offset in 0i64..1000,
        length in 0i64..800,
        afternoon in any::<bool>(),
        lunchtime in any::<bool>(),
        start_month in 0u32..12,
        remaining in prop::collection::vec(0u32..400, 6),
    ) {
        let input = day_input(offset, length, afternoon, lunchtime, start_month, &remaining);
        let result = calc_request_duration(&input).unwrap();

        let days: Decimal = result.per_year.iter().map(|y| y.workday_duration_in_days).sum();
        let minutes: i64 = result.per_year.iter().map(|y| y.workday_duration_in_minutes).sum();
        let duration: Decimal = result.per_year.iter().map(|y| y.duration).sum();
        let enough = result.per_year.iter().all(|y| y.allowance_enough);

        prop_assert_eq!(result.total.workday_duration_in_days, days);
        prop_assert_eq!(result.total.workday_duration_in_minutes, minutes);
        prop_assert_eq!(result.total.duration, duration);
        prop_assert_eq!(result.total.allowance_enough, enough);
    }

    #[test]
    fn fiscal_years_are_consecutive(
        offset in 0i64..1000,
        length in 0i64..800,
        start_month in 0u32..12,
    ) {
        let input = day_input(offset, length, false, false, start_month, &[]);
        let result = calc_request_duration(&input).unwrap();

        prop_assert!(!result.per_year.is_empty());
        for pair in result.per_year.windows(2) {
            prop_assert_eq!(pair[1].fiscal_year, pair[0].fiscal_year + 1);
        }
    }

    #[test]
    fn default_schedule_days_match_minutes(
        offset in 0i64..1000,
        length in 0i64..120,
        afternoon in any::<bool>(),
        lunchtime in any::<bool>(),
    ) {
        // A single day from the afternoon to lunchtime still takes the afternoon
        prop_assume!(!(length == 0 && afternoon && lunchtime));
        let input = day_input(offset, length, afternoon, lunchtime, 0, &[]);
        let result = calc_request_duration(&input).unwrap();

        // Every half of the default schedule is four hours
        prop_assert_eq!(
            result.total.workday_duration_in_days * Decimal::from(480),
            Decimal::from(result.total.workday_duration_in_minutes)
        );
        prop_assert!(result.total.workday_duration_in_days <= result.total.duration);
    }

    #[test]
    fn hour_units_never_count_more_than_elapsed_minutes(
        offset in 0i64..1000,
        start_minute in 0i64..(24 * 60),
        length_minutes in 0i64..(5 * 24 * 60),
    ) {
        let start: NaiveDateTime =
            (base_date() + Duration::days(offset)).and_time(NaiveTime::MIN)
                + Duration::minutes(start_minute);
        let end = start + Duration::minutes(length_minutes);
        let input = DurationInput {
            start,
            end,
            start_at: None,
            end_at: None,
            leave_type: leave_type(LeaveUnit::Minutes15),
            ..day_input(0, 0, false, false, 0, &[])
        };

        let result = calc_request_duration(&input).unwrap();
        prop_assert!(result.total.workday_duration_in_minutes <= length_minutes);
        if result.per_year.len() == 1 {
            prop_assert_eq!(result.total.duration, Decimal::from(length_minutes));
        }
    }
}
