//! Working time calculation for a single fiscal-year segment.
//!
//! This is the core of the engine: it walks a request day by day, resolves
//! the schedule in effect, removes public holidays, selects the halves of
//! the boundary days the request covers, and accumulates the scheduled
//! working time the request consumes.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    DaySchedule, EndAt, LeaveType, MemberSchedule, PublicHolidayDay, StartAt, WeeklySchedule,
};

use super::fiscal_year::FiscalYearSegment;
use super::schedule_resolver::resolve_schedule;

/// The schedules and holidays that apply to one member.
#[derive(Debug, Clone, Copy)]
pub struct MemberCalendar<'a> {
    /// The workspace default schedule.
    pub workspace_schedule: &'a WeeklySchedule,
    /// The member's dated schedules, in any order.
    pub member_schedules: &'a [MemberSchedule],
    /// Holidays of the calendar the member observes.
    pub public_holidays: &'a [PublicHolidayDay],
}

impl<'a> MemberCalendar<'a> {
    /// Returns the day schedule in effect on a date.
    pub fn day_schedule(&self, date: NaiveDate) -> &'a DaySchedule {
        resolve_schedule(date, self.workspace_schedule, self.member_schedules).for_date(date)
    }
}

/// The working time consumed by one fiscal-year segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTime {
    /// Scheduled working days consumed.
    pub workday_days: Decimal,
    /// Scheduled working minutes consumed.
    pub workday_minutes: i64,
    /// Whether an hour-unit request reaches outside the working windows.
    pub outside_of_schedule: bool,
    /// Schedule-independent length: days for day units, minutes for hour units.
    pub duration: Decimal,
}

/// One half of a working day, derived from a [`DaySchedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HalfWindow {
    start: NaiveTime,
    end: NaiveTime,
    minutes: i64,
    work: bool,
}

impl HalfWindow {
    fn clipped_minutes(&self, from: NaiveTime, to: NaiveTime) -> i64 {
        let start = self.start.max(from);
        let end = self.end.min(to);
        (end - start).num_minutes().max(0)
    }
}

fn half_day() -> Decimal {
    Decimal::new(5, 1)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).expect("Valid end of day time")
}

/// Derives the morning and afternoon windows of a day.
///
/// The schedule is only read; the returned windows are fresh values.
fn day_windows(day: &DaySchedule, ignore_schedule: bool) -> (HalfWindow, HalfWindow) {
    let morning = HalfWindow {
        start: day.am_start,
        end: day.am_end,
        minutes: day.morning_minutes(),
        work: day.am_enabled || ignore_schedule,
    };
    let afternoon = HalfWindow {
        start: day.pm_start,
        end: day.pm_end,
        minutes: day.afternoon_minutes(),
        work: day.pm_enabled || ignore_schedule,
    };
    (morning, afternoon)
}

/// Returns which halves `(morning, afternoon)` of a day the request covers.
fn selected_halves(
    is_first: bool,
    is_last: bool,
    single_day: bool,
    start_at: StartAt,
    end_at: EndAt,
) -> (bool, bool) {
    if is_first && start_at == StartAt::Afternoon {
        (false, true)
    } else if single_day && end_at == EndAt::Lunchtime {
        (true, false)
    } else if is_last && end_at == EndAt::Lunchtime {
        (true, false)
    } else {
        (true, true)
    }
}

/// Returns true if the requested range on a boundary day leaves the counted windows.
fn reaches_outside(
    range_start: NaiveTime,
    range_end: NaiveTime,
    check_start: bool,
    check_end: bool,
    windows: &[HalfWindow],
) -> bool {
    let working = || windows.iter().filter(|w| w.work && w.minutes > 0);
    let (Some(envelope_start), Some(envelope_end)) = (
        working().map(|w| w.start).min(),
        working().map(|w| w.end).max(),
    ) else {
        return true;
    };

    let start_outside =
        check_start && (range_start < envelope_start || range_start >= envelope_end);
    let end_outside = check_end && (range_end > envelope_end || range_end <= envelope_start);
    start_outside || end_outside
}

/// Calculates the working time a fiscal-year segment consumes.
///
/// Day-unit requests count half days: every selected working half adds 0.5
/// days and its window length in minutes. On weekdays flagged
/// `deduct_fullday` a day with any half taken counts as a full day; a day
/// with both halves taken still counts as 1, never 2.
///
/// Hour-unit requests clip the literal start and end timestamps against the
/// working windows of the first and last day and count full windows on the
/// days in between. Missing `start_at`/`end_at` markers are inferred from
/// the first and last day's windows.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::{FiscalYearSegment, MemberCalendar, calculate_working_time};
/// use leave_ledger::models::{EndAt, LeaveType, LeaveUnit, StartAt, WeeklySchedule};
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let schedule = WeeklySchedule::default();
/// let calendar = MemberCalendar {
///     workspace_schedule: &schedule,
///     member_schedules: &[],
///     public_holidays: &[],
/// };
/// let leave_type = LeaveType {
///     id: Uuid::nil(),
///     name: "Vacation".to_string(),
///     leave_unit: LeaveUnit::Days,
///     take_from_allowance: true,
///     ignore_schedule: false,
///     ignore_public_holidays: false,
///     allowance_type_id: None,
///     allowance_type: None,
/// };
/// // Thursday and Friday
/// let segment = FiscalYearSegment {
///     start: NaiveDateTime::parse_from_str("2024-02-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
///     end: NaiveDateTime::parse_from_str("2024-02-02 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
///     start_at: Some(StartAt::Morning),
///     end_at: Some(EndAt::EndOfDay),
///     fiscal_year: 2024,
/// };
///
/// let result = calculate_working_time(&segment, &calendar, &leave_type);
/// assert_eq!(result.workday_days, Decimal::from(2));
/// assert_eq!(result.workday_minutes, 960);
/// assert_eq!(result.duration, Decimal::from(2));
/// ```
pub fn calculate_working_time(
    segment: &FiscalYearSegment,
    calendar: &MemberCalendar<'_>,
    leave_type: &LeaveType,
) -> WorkingTime {
    let hour_unit = leave_type.leave_unit.is_hour_unit();
    let first_date = segment.start.date();
    let last_date = segment.end.date();
    let day_count = (last_date - first_date).num_days().max(0) + 1;
    let single_day = day_count == 1;

    let start_at = segment.start_at.unwrap_or_else(|| {
        if hour_unit && segment.start.time() >= calendar.day_schedule(first_date).am_end {
            StartAt::Afternoon
        } else {
            StartAt::Morning
        }
    });
    let end_at = segment.end_at.unwrap_or_else(|| {
        if hour_unit && segment.end.time() < calendar.day_schedule(last_date).pm_start {
            EndAt::Lunchtime
        } else {
            EndAt::EndOfDay
        }
    });

    let mut workday_days = Decimal::ZERO;
    let mut workday_minutes: i64 = 0;
    let mut outside_of_schedule = false;

    for (index, date) in first_date.iter_days().take(day_count as usize).enumerate() {
        let is_first = index == 0;
        let is_last = index as i64 == day_count - 1;

        let day = calendar.day_schedule(date);
        let (mut morning, mut afternoon) = day_windows(day, leave_type.ignore_schedule);

        if !leave_type.ignore_public_holidays {
            for holiday in calendar.public_holidays.iter().filter(|h| h.date == date) {
                if holiday.duration.covers_morning() {
                    morning.work = false;
                }
                if holiday.duration.covers_afternoon() {
                    afternoon.work = false;
                }
            }
        }

        let (take_morning, take_afternoon) =
            selected_halves(is_first, is_last, single_day, start_at, end_at);
        let counted: Vec<HalfWindow> = [(take_morning, morning), (take_afternoon, afternoon)]
            .into_iter()
            .filter(|(take, window)| *take && window.work)
            .map(|(_, window)| window)
            .collect();

        if hour_unit && (is_first || is_last) {
            let range_start = if is_first {
                segment.start.time()
            } else {
                NaiveTime::MIN
            };
            let range_end = if is_last {
                segment.end.time()
            } else {
                end_of_day()
            };

            for window in &counted {
                let minutes = window.clipped_minutes(range_start, range_end);
                if minutes > 0 {
                    workday_minutes += minutes;
                    workday_days += half_day();
                }
            }

            if range_start < range_end
                && reaches_outside(range_start, range_end, is_first, is_last, &counted)
            {
                outside_of_schedule = true;
            }
        } else if !counted.is_empty() {
            workday_minutes += counted.iter().map(|w| w.minutes).sum::<i64>();
            workday_days += if !hour_unit && day.deduct_fullday {
                Decimal::ONE
            } else {
                half_day() * Decimal::from(counted.len())
            };
        }
    }

    let duration = if hour_unit {
        Decimal::from((segment.end - segment.start).num_minutes())
    } else {
        let mut days = Decimal::from(day_count);
        if start_at == StartAt::Afternoon {
            days -= half_day();
        }
        if end_at == EndAt::Lunchtime {
            days -= half_day();
        }
        days
    };

    WorkingTime {
        workday_days,
        workday_minutes,
        outside_of_schedule,
        duration,
    }
}
