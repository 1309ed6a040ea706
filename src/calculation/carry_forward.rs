//! Carry-forward expiry aware sufficiency check against a stored ledger row.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::models::{AllowanceType, MemberAllowance};

use super::fiscal_year::{fiscal_year_of, fiscal_year_window};

/// Returns the first day on which balance brought forward into `row` can no
/// longer be used, or `None` if it never expires or the deadline is not a
/// representable date.
pub fn brought_forward_deadline(
    row: &MemberAllowance,
    allowance_type: &AllowanceType,
    fiscal_year_start_month: u32,
) -> Option<NaiveDate> {
    if allowance_type.carry_forward_months_after_fiscal_year == 0 {
        return None;
    }
    let (fiscal_start, _) = fiscal_year_window(row.year, fiscal_year_start_month).ok()?;
    fiscal_start.checked_add_months(Months::new(
        allowance_type.carry_forward_months_after_fiscal_year,
    ))
}

/// Returns true if `row` can cover `consumed` for a request starting on
/// `request_start`.
///
/// Allowance types that ignore the limit always have enough. When carried
/// balance is only usable for a number of months into the fiscal year, a
/// request starting on or after that deadline cannot use the part of
/// `brought_forward` that is still unspent, so
/// `max(0, brought_forward - taken)` is excluded from the usable balance.
/// Requests starting in a different fiscal year than the row are checked
/// against the plain remaining balance.
///
/// # Example
///
/// ```
/// use leave_ledger::calculation::has_enough_allowance_for_request;
/// use leave_ledger::models::{AllowanceType, MemberAllowance};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let allowance_type = AllowanceType {
///     id: Uuid::nil(),
///     name: "Vacation".to_string(),
///     ignore_allowance_limit: false,
///     max_carry_forward: Decimal::from(5),
///     carry_forward_months_after_fiscal_year: 3,
/// };
/// let mut row = MemberAllowance::zeroed(
///     Uuid::nil(),
///     Uuid::nil(),
///     Uuid::nil(),
///     2024,
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
/// );
/// row.allowance = Decimal::from(2);
/// row.brought_forward = Decimal::from(5);
/// row.remaining = Decimal::from(7);
///
/// let february = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
/// let june = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// assert!(has_enough_allowance_for_request(february, Decimal::from(6), &row, &allowance_type, 0));
/// assert!(!has_enough_allowance_for_request(june, Decimal::from(6), &row, &allowance_type, 0));
/// ```
pub fn has_enough_allowance_for_request(
    request_start: NaiveDate,
    consumed: Decimal,
    row: &MemberAllowance,
    allowance_type: &AllowanceType,
    fiscal_year_start_month: u32,
) -> bool {
    if allowance_type.ignore_allowance_limit {
        return true;
    }

    let expired = fiscal_year_of(request_start, fiscal_year_start_month) == row.year
        && brought_forward_deadline(row, allowance_type, fiscal_year_start_month)
            .is_some_and(|deadline| request_start >= deadline);

    let usable = if expired {
        row.remaining - (row.brought_forward - row.taken).max(Decimal::ZERO)
    } else {
        row.remaining
    };

    usable >= consumed
}
