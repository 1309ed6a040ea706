//! Workspace and member models.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::WeeklySchedule;

/// A workspace: the tenant that owns members, leave types and the fiscal calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier for the workspace.
    pub id: Uuid,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Zero-based month (0 = January) the fiscal year starts in.
    pub fiscal_year_start_month: u32,
    /// The default weekly schedule for members without their own.
    #[serde(default)]
    pub schedule: WeeklySchedule,
}

impl Workspace {
    /// Checks the fields the calculation relies on.
    ///
    /// # Example
    ///
    /// ```
    /// use leave_ledger::models::{WeeklySchedule, Workspace};
    /// use uuid::Uuid;
    ///
    /// let workspace = Workspace {
    ///     id: Uuid::nil(),
    ///     name: "Acme".to_string(),
    ///     fiscal_year_start_month: 12,
    ///     schedule: WeeklySchedule::default(),
    /// };
    /// assert!(workspace.validate().is_err());
    /// ```
    pub fn validate(&self) -> EngineResult<()> {
        validate_fiscal_year_start_month(self.fiscal_year_start_month)
    }
}

/// Rejects fiscal start months outside `0..=11`.
pub fn validate_fiscal_year_start_month(month: u32) -> EngineResult<()> {
    if month > 11 {
        return Err(EngineError::InvalidWorkspace {
            field: "fiscal_year_start_month".to_string(),
            message: format!("must be between 0 and 11, got {}", month),
        });
    }
    Ok(())
}

/// Calendar years requests and ledger rows may fall in.
pub const LEDGER_YEARS: RangeInclusive<i32> = 1900..=2200;

/// Returns true if `year` lies within [`LEDGER_YEARS`].
pub fn is_ledger_year(year: i32) -> bool {
    LEDGER_YEARS.contains(&year)
}

/// A member of a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier for the member.
    pub id: Uuid,
    /// The workspace the member belongs to.
    pub workspace_id: Uuid,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// The public holiday calendar the member observes.
    #[serde(default)]
    pub public_holiday_calendar_id: Option<Uuid>,
}
