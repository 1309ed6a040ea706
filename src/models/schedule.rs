//! Weekly schedule model.
//!
//! This module defines the [`WeeklySchedule`] type shared by workspace-default
//! and member-specific schedules, together with the per-weekday
//! [`DaySchedule`] record and the dated [`MemberSchedule`] wrapper.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The working windows of a single weekday.
///
/// Times are wall-clock and date independent. A day is split into a
/// morning window (`am_start`..`am_end`) and an afternoon window
/// (`pm_start`..`pm_end`), each of which can be enabled separately.
///
/// # Example
///
/// ```
/// use leave_ledger::models::DaySchedule;
///
/// let day = DaySchedule::working();
/// assert_eq!(day.morning_minutes(), 240);
/// assert_eq!(day.afternoon_minutes(), 240);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Start of the morning window.
    pub am_start: NaiveTime,
    /// End of the morning window.
    pub am_end: NaiveTime,
    /// Start of the afternoon window.
    pub pm_start: NaiveTime,
    /// End of the afternoon window.
    pub pm_end: NaiveTime,
    /// Whether the morning is a working half.
    pub am_enabled: bool,
    /// Whether the afternoon is a working half.
    pub pm_enabled: bool,
    /// Whether a half day taken on this weekday is deducted as a full day.
    #[serde(default)]
    pub deduct_fullday: bool,
}

impl DaySchedule {
    /// A working day with 08:00-12:00 and 13:00-17:00 windows.
    pub fn working() -> Self {
        Self {
            am_start: hm(8, 0),
            am_end: hm(12, 0),
            pm_start: hm(13, 0),
            pm_end: hm(17, 0),
            am_enabled: true,
            pm_enabled: true,
            deduct_fullday: false,
        }
    }

    /// The same windows as [`DaySchedule::working`] with both halves disabled.
    pub fn off() -> Self {
        Self {
            am_enabled: false,
            pm_enabled: false,
            ..Self::working()
        }
    }

    /// Length of the morning window in minutes, zero if the window is empty.
    pub fn morning_minutes(&self) -> i64 {
        window_minutes(self.am_start, self.am_end)
    }

    /// Length of the afternoon window in minutes, zero if the window is empty.
    pub fn afternoon_minutes(&self) -> i64 {
        window_minutes(self.pm_start, self.pm_end)
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn window_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes().max(0)
}

/// A schedule for every day of the week, indexed Monday (0) through Sunday (6).
///
/// # Example
///
/// ```
/// use leave_ledger::models::WeeklySchedule;
/// use chrono::Weekday;
///
/// let schedule = WeeklySchedule::default();
/// assert!(schedule.day(Weekday::Mon).am_enabled);
/// assert!(!schedule.day(Weekday::Sat).am_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    /// Day schedules, Monday first.
    pub days: [DaySchedule; 7],
}

impl WeeklySchedule {
    /// Builds a schedule that uses the same day record for all seven days.
    pub fn uniform(day: DaySchedule) -> Self {
        Self { days: [day; 7] }
    }

    /// Returns the day schedule for a weekday.
    pub fn day(&self, weekday: Weekday) -> &DaySchedule {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    /// Returns the day schedule that applies to a calendar date.
    pub fn for_date(&self, date: NaiveDate) -> &DaySchedule {
        self.day(date.weekday())
    }
}

impl Default for WeeklySchedule {
    /// Monday to Friday working, weekend off.
    fn default() -> Self {
        let working = DaySchedule::working();
        let off = DaySchedule::off();
        Self {
            days: [working, working, working, working, working, off, off],
        }
    }
}

/// A member-specific schedule effective from a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSchedule {
    /// The member this schedule belongs to.
    pub member_id: Uuid,
    /// The first date the schedule applies to.
    pub from: NaiveDate,
    /// The weekly windows.
    pub schedule: WeeklySchedule,
}
