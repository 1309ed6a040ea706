//! Leave request model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LeaveUnit;

/// Which half of the first day a day-unit request starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartAt {
    /// The request includes the morning of the first day.
    Morning,
    /// The request starts after lunch on the first day.
    Afternoon,
}

/// Which half of the last day a day-unit request ends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndAt {
    /// The request ends at lunchtime on the last day.
    Lunchtime,
    /// The request includes the afternoon of the last day.
    EndOfDay,
}

/// Lifecycle state of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting approval.
    Pending,
    /// Approved.
    Approved,
    /// Rejected by an approver.
    Declined,
    /// Withdrawn by the requester or an admin.
    Canceled,
}

impl RequestStatus {
    /// Returns true if requests in this state consume allowance.
    pub fn counts_against_allowance(self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Approved)
    }
}

/// A stored leave request.
///
/// For hour-unit requests `start_at`/`end_at` are `None` and `start`/`end`
/// are exact timestamps. For day-unit requests only the dates of `start`
/// and `end` matter and the markers select the boundary halves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier for the request.
    pub id: Uuid,
    /// The workspace the request belongs to.
    pub workspace_id: Uuid,
    /// The member taking the leave.
    pub requester_member_id: Uuid,
    /// The leave type requested.
    pub leave_type_id: Uuid,
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
    /// Unit the request was made in.
    pub leave_unit: LeaveUnit,
    /// Current state.
    pub status: RequestStatus,
}
