//! Calculation logic for the leave ledger engine.
//!
//! This module contains the pure functions behind every figure the engine
//! reports: effective schedule lookup, fiscal year splitting, working time
//! per fiscal-year segment, the request duration preview with its allowance
//! sufficiency check, and the carry-forward expiry check against a stored
//! ledger row.

mod carry_forward;
mod fiscal_year;
mod schedule_resolver;
mod sufficiency;
mod working_time;

pub use carry_forward::{brought_forward_deadline, has_enough_allowance_for_request};
pub use fiscal_year::{FiscalYearSegment, fiscal_year_of, fiscal_year_window, split_by_fiscal_year};
pub use schedule_resolver::resolve_schedule;
pub use sufficiency::{DurationInput, FiscalSettings, calc_request_duration};
pub use working_time::{MemberCalendar, WorkingTime, calculate_working_time};
