//! Leave type and allowance type models.
//!
//! A [`LeaveType`] carries the policy flags that drive the working-time
//! calculation; an [`AllowanceType`] carries the balance rules shared by
//! every leave type drawing from it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The granularity in which a leave type is requested and deducted.
///
/// `Days` and `HalfDays` are day units; every other variant is an hour unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveUnit {
    /// Whole days.
    Days,
    /// Half days (morning or afternoon).
    HalfDays,
    /// Whole hours.
    Hours,
    /// 30 minute steps.
    Minutes30,
    /// 15 minute steps.
    Minutes15,
    /// 10 minute steps.
    Minutes10,
    /// 5 minute steps.
    Minutes5,
}

impl LeaveUnit {
    /// Returns true for units measured in days or half days.
    ///
    /// # Example
    ///
    /// ```
    /// use leave_ledger::models::LeaveUnit;
    ///
    /// assert!(LeaveUnit::HalfDays.is_day_unit());
    /// assert!(!LeaveUnit::Minutes15.is_day_unit());
    /// ```
    pub fn is_day_unit(self) -> bool {
        matches!(self, LeaveUnit::Days | LeaveUnit::HalfDays)
    }

    /// Returns true for units measured in hours or minute steps.
    pub fn is_hour_unit(self) -> bool {
        !self.is_day_unit()
    }
}

/// A named balance category (vacation, overtime, ...) with carry-forward rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceType {
    /// Unique identifier for the allowance type.
    pub id: Uuid,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// When true, requests never fail the sufficiency check.
    #[serde(default)]
    pub ignore_allowance_limit: bool,
    /// The largest unused balance that rolls into the next fiscal year.
    pub max_carry_forward: Decimal,
    /// Months into the next fiscal year during which carried balance is usable.
    /// Zero means carried balance never expires.
    #[serde(default)]
    pub carry_forward_months_after_fiscal_year: u32,
}

/// A kind of leave that can be requested, with its calculation policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveType {
    /// Unique identifier for the leave type.
    pub id: Uuid,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// The unit requests of this type are measured in.
    pub leave_unit: LeaveUnit,
    /// Whether the consumed time is deducted from an allowance.
    #[serde(default)]
    pub take_from_allowance: bool,
    /// Count both halves of every day regardless of the schedule.
    #[serde(default)]
    pub ignore_schedule: bool,
    /// Count public holidays as ordinary working days.
    #[serde(default)]
    pub ignore_public_holidays: bool,
    /// The allowance type this leave type draws from.
    #[serde(default)]
    pub allowance_type_id: Option<Uuid>,
    /// The resolved allowance type, when the caller has it at hand.
    #[serde(default)]
    pub allowance_type: Option<AllowanceType>,
}

impl LeaveType {
    /// Returns true if the allowance type waives the sufficiency limit.
    pub fn ignores_allowance_limit(&self) -> bool {
        self.allowance_type
            .as_ref()
            .is_some_and(|t| t.ignore_allowance_limit)
    }

    /// Returns true if this leave type draws from the given allowance type.
    ///
    /// Leave types without an allowance type draw from every allowance type.
    pub fn draws_from(&self, allowance_type_id: Uuid) -> bool {
        self.allowance_type_id
            .is_none_or(|id| id == allowance_type_id)
    }
}
