//! Request types for the leave ledger engine API.
//!
//! This module defines the JSON request structures for the `/duration` and
//! `/workspaces/...` endpoints. Fields a caller may leave out fall back to
//! the configured workspace defaults when converted to domain types.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::{DurationInput, FiscalSettings};
use crate::config::DefaultsConfig;
use crate::ledger::WorkspaceSnapshot;
use crate::models::{
    AllowanceBalance, AllowanceType, CalendarHolidayDay, EndAt, LeaveRequest, LeaveType, Member,
    MemberAllowance, MemberSchedule, PublicHolidayDay, StartAt, WeeklySchedule, Workspace,
};

/// Request body for the `/duration` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationRequest {
    /// First moment of the absence.
    pub start: NaiveDateTime,
    /// Last moment of the absence.
    pub end: NaiveDateTime,
    /// Boundary marker for the first day.
    #[serde(default)]
    pub start_at: Option<StartAt>,
    /// Boundary marker for the last day.
    #[serde(default)]
    pub end_at: Option<EndAt>,
    /// Workspace schedule; the configured default when omitted.
    #[serde(default)]
    pub workspace_schedule: Option<WeeklySchedule>,
    /// The member's dated schedules.
    #[serde(default)]
    pub member_schedules: Vec<MemberSchedule>,
    /// The member's balances.
    #[serde(default)]
    pub member_allowances: Vec<AllowanceBalance>,
    /// Holidays of the member's calendar.
    #[serde(default)]
    pub member_public_holiday_days: Vec<PublicHolidayDay>,
    /// The requested leave type.
    pub leave_type: LeaveType,
    /// Workspace fiscal settings; the configured default when omitted.
    #[serde(default)]
    pub workspace: Option<FiscalSettings>,
}

impl DurationRequest {
    /// Converts the request into calculation input, filling omitted
    /// workspace settings from `defaults`.
    pub fn into_input(self, defaults: &DefaultsConfig) -> DurationInput {
        DurationInput {
            start: self.start,
            end: self.end,
            start_at: self.start_at,
            end_at: self.end_at,
            workspace_schedule: self
                .workspace_schedule
                .unwrap_or_else(|| defaults.schedule.clone()),
            member_schedules: self.member_schedules,
            member_allowances: self.member_allowances,
            member_public_holiday_days: self.member_public_holiday_days,
            leave_type: self.leave_type,
            workspace: self.workspace.unwrap_or(FiscalSettings {
                fiscal_year_start_month: defaults.fiscal_year_start_month,
            }),
        }
    }
}

/// Workspace information in a snapshot request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Zero-based fiscal start month; the configured default when omitted.
    #[serde(default)]
    pub fiscal_year_start_month: Option<u32>,
    /// Default weekly schedule; the configured default when omitted.
    #[serde(default)]
    pub schedule: Option<WeeklySchedule>,
}

/// Request body for the `/workspaces/:workspace_id/snapshot` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRequest {
    /// The workspace settings.
    pub workspace: WorkspaceRequest,
    /// Members of the workspace.
    #[serde(default)]
    pub members: Vec<Member>,
    /// Dated member schedules.
    #[serde(default)]
    pub member_schedules: Vec<MemberSchedule>,
    /// Holidays of every calendar used by members.
    #[serde(default)]
    pub holidays: Vec<CalendarHolidayDay>,
    /// Allowance types.
    #[serde(default)]
    pub allowance_types: Vec<AllowanceType>,
    /// Leave types.
    #[serde(default)]
    pub leave_types: Vec<LeaveType>,
    /// Requests of all members.
    #[serde(default)]
    pub requests: Vec<LeaveRequest>,
    /// Existing ledger rows.
    #[serde(default)]
    pub allowances: Vec<MemberAllowance>,
}

impl SnapshotRequest {
    /// Builds the snapshot for `workspace_id`.
    pub fn into_snapshot(self, workspace_id: Uuid, defaults: &DefaultsConfig) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            workspace: Workspace {
                id: workspace_id,
                name: self.workspace.name,
                fiscal_year_start_month: self
                    .workspace
                    .fiscal_year_start_month
                    .unwrap_or(defaults.fiscal_year_start_month),
                schedule: self
                    .workspace
                    .schedule
                    .unwrap_or_else(|| defaults.schedule.clone()),
            },
            members: self.members,
            member_schedules: self.member_schedules,
            holidays: self.holidays,
            allowance_types: self.allowance_types,
            leave_types: self.leave_types,
            requests: self.requests,
            allowances: self.allowances,
        }
    }
}

/// Query parameters of the ledger recompute endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerQuery {
    /// The date recomputation treats as today; the server date when omitted.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}
