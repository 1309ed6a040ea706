//! Effective schedule lookup.

use chrono::NaiveDate;

use crate::models::{MemberSchedule, WeeklySchedule};

/// Returns the schedule in effect for a member on a date.
///
/// The member schedule with the latest `from` on or before `date` wins; the
/// workspace schedule applies when no member schedule has started yet.
/// Ties on `from` resolve to the last schedule in the slice.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::resolve_schedule;
/// use leave_ledger::models::{DaySchedule, MemberSchedule, WeeklySchedule};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let workspace = WeeklySchedule::default();
/// let part_time = MemberSchedule {
///     member_id: Uuid::nil(),
///     from: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     schedule: WeeklySchedule::uniform(DaySchedule::off()),
/// };
///
/// let before = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
/// let after = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// assert_eq!(resolve_schedule(before, &workspace, &[part_time.clone()]), &workspace);
/// assert_eq!(resolve_schedule(after, &workspace, &[part_time.clone()]), &part_time.schedule);
/// ```
pub fn resolve_schedule<'a>(
    date: NaiveDate,
    workspace_schedule: &'a WeeklySchedule,
    member_schedules: &'a [MemberSchedule],
) -> &'a WeeklySchedule {
    member_schedules
        .iter()
        .filter(|s| s.from <= date)
        .max_by_key(|s| s.from)
        .map(|s| &s.schedule)
        .unwrap_or(workspace_schedule)
}
