//! Member allowance (ledger row) model.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One balance snapshot per member, allowance type and fiscal year.
///
/// Amounts are in days for day-unit allowance types and in minutes for
/// hour-unit ones. The invariant
/// `remaining = allowance + brought_forward + compensatory_time_off - taken`
/// holds after every ledger recomputation.
///
/// # Example
///
/// ```
/// use leave_ledger::models::MemberAllowance;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let mut row = MemberAllowance::zeroed(
///     Uuid::nil(),
///     Uuid::nil(),
///     Uuid::nil(),
///     2024,
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
/// );
/// row.allowance = Decimal::from(25);
/// row.taken = Decimal::from(3);
/// assert_eq!(row.balance(), Decimal::from(22));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAllowance {
    /// Unique identifier of the row.
    pub id: Uuid,
    /// The workspace the row belongs to.
    pub workspace_id: Uuid,
    /// The member the balance belongs to.
    pub member_id: Uuid,
    /// The allowance type tracked by this row.
    pub allowance_type_id: Uuid,
    /// The fiscal year.
    pub year: i32,
    /// First day of the fiscal year.
    pub start: NaiveDate,
    /// Last day of the fiscal year.
    pub end: NaiveDate,
    /// Granted allowance for the year.
    pub allowance: Decimal,
    /// Balance carried in from the previous year.
    pub brought_forward: Decimal,
    /// Extra balance granted as compensation.
    #[serde(default)]
    pub compensatory_time_off: Decimal,
    /// Amount consumed by requests.
    #[serde(default)]
    pub taken: Decimal,
    /// Amount still available.
    pub remaining: Decimal,
    /// Previous-year balance above the carry-forward cap that was forfeited.
    #[serde(default)]
    pub expiration: Decimal,
    /// When set, the stored `brought_forward` is authoritative.
    #[serde(default)]
    pub overwrite_brought_forward: bool,
    /// Consumed amount per leave type.
    #[serde(default)]
    pub leave_types_stats: BTreeMap<Uuid, Decimal>,
}

impl MemberAllowance {
    /// Creates an empty row for a fiscal year with a fresh id.
    pub fn zeroed(
        workspace_id: Uuid,
        member_id: Uuid,
        allowance_type_id: Uuid,
        year: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            member_id,
            allowance_type_id,
            year,
            start,
            end,
            allowance: Decimal::ZERO,
            brought_forward: Decimal::ZERO,
            compensatory_time_off: Decimal::ZERO,
            taken: Decimal::ZERO,
            remaining: Decimal::ZERO,
            expiration: Decimal::ZERO,
            overwrite_brought_forward: false,
            leave_types_stats: BTreeMap::new(),
        }
    }

    /// The balance implied by the stored components.
    pub fn balance(&self) -> Decimal {
        self.allowance + self.brought_forward + self.compensatory_time_off - self.taken
    }

    /// The unique key rows are upserted by.
    pub fn key(&self) -> (Uuid, Uuid, i32) {
        (self.member_id, self.allowance_type_id, self.year)
    }
}

/// The slice of a ledger row the sufficiency preview needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceBalance {
    /// The fiscal year.
    pub year: i32,
    /// Amount still available.
    pub remaining: Decimal,
    /// Balance carried in from the previous year.
    #[serde(default)]
    pub brought_forward: Decimal,
    /// The allowance type of the row.
    #[serde(default)]
    pub allowance_type_id: Option<Uuid>,
}

impl From<&MemberAllowance> for AllowanceBalance {
    fn from(row: &MemberAllowance) -> Self {
        Self {
            year: row.year,
            remaining: row.remaining,
            brought_forward: row.brought_forward,
            allowance_type_id: Some(row.allowance_type_id),
        }
    }
}
