//! Public holiday models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which part of the day a public holiday covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayDuration {
    /// The whole day is off.
    FullDay,
    /// Only the morning is off.
    Morning,
    /// Only the afternoon is off.
    Afternoon,
}

impl HolidayDuration {
    /// Returns true if the holiday suppresses the morning half.
    pub fn covers_morning(self) -> bool {
        matches!(self, HolidayDuration::FullDay | HolidayDuration::Morning)
    }

    /// Returns true if the holiday suppresses the afternoon half.
    pub fn covers_afternoon(self) -> bool {
        matches!(self, HolidayDuration::FullDay | HolidayDuration::Afternoon)
    }
}

/// A single day of a public holiday calendar.
///
/// # Example
///
/// ```
/// use leave_ledger::models::{HolidayDuration, PublicHolidayDay};
/// use chrono::NaiveDate;
///
/// let new_year = PublicHolidayDay {
///     date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     duration: HolidayDuration::FullDay,
/// };
/// assert!(new_year.duration.covers_morning());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHolidayDay {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The part of the day covered.
    pub duration: HolidayDuration,
}

/// A holiday day attached to the calendar it belongs to, as kept by the ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarHolidayDay {
    /// The holiday calendar (region) the day belongs to.
    pub calendar_id: Uuid,
    /// The holiday itself.
    #[serde(flatten)]
    pub day: PublicHolidayDay,
}
