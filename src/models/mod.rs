//! Core data models for the leave ledger engine.
//!
//! This module contains all the domain models used throughout the engine.

mod allowance;
mod duration_result;
mod holiday;
mod leave_type;
mod request;
mod schedule;
mod workspace;

pub use allowance::{AllowanceBalance, MemberAllowance};
pub use duration_result::{DurationTotals, RequestDuration, YearDuration};
pub use holiday::{CalendarHolidayDay, HolidayDuration, PublicHolidayDay};
pub use leave_type::{AllowanceType, LeaveType, LeaveUnit};
pub use request::{EndAt, LeaveRequest, RequestStatus, StartAt};
pub use schedule::{DaySchedule, MemberSchedule, WeeklySchedule};
pub use workspace::{
    LEDGER_YEARS, Member, Workspace, is_ledger_year, validate_fiscal_year_start_month,
};
