//! Ledger persistence seam.
//!
//! [`LedgerStore`] is the read/write interface the gap filler and the ledger
//! updater work against. [`InMemoryLedgerStore`] backs the HTTP server and
//! the tests; it is loaded from [`WorkspaceSnapshot`]s.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AllowanceType, CalendarHolidayDay, LEDGER_YEARS, LeaveRequest, LeaveType, Member,
    MemberAllowance, MemberSchedule, PublicHolidayDay, Workspace, is_ledger_year,
};

/// Read and write access to ledger data.
///
/// Reads return owned snapshots. `upsert_allowances` is atomic per batch:
/// either every row of the batch is written or none is. Rows are keyed by
/// `(member_id, allowance_type_id, year)`, so writing a row whose key
/// already exists replaces the stored row instead of adding a second one.
pub trait LedgerStore: Send + Sync {
    /// Returns the workspace, if loaded.
    fn workspace(&self, workspace_id: Uuid) -> EngineResult<Option<Workspace>>;

    /// Returns a member of a workspace, if present.
    fn member(&self, workspace_id: Uuid, member_id: Uuid) -> EngineResult<Option<Member>>;

    /// Returns the dated schedules of a member.
    fn member_schedules(
        &self,
        workspace_id: Uuid,
        member_id: Uuid,
    ) -> EngineResult<Vec<MemberSchedule>>;

    /// Returns the holidays of a holiday calendar.
    fn holiday_days(
        &self,
        workspace_id: Uuid,
        calendar_id: Uuid,
    ) -> EngineResult<Vec<PublicHolidayDay>>;

    /// Returns the allowance types of a workspace.
    fn allowance_types(&self, workspace_id: Uuid) -> EngineResult<Vec<AllowanceType>>;

    /// Returns the leave types of a workspace.
    fn leave_types(&self, workspace_id: Uuid) -> EngineResult<Vec<LeaveType>>;

    /// Returns every request of a workspace, whatever its status.
    fn workspace_requests(&self, workspace_id: Uuid) -> EngineResult<Vec<LeaveRequest>>;

    /// Returns the ledger rows of a member ordered by allowance type and year.
    fn member_allowances(
        &self,
        workspace_id: Uuid,
        member_id: Uuid,
    ) -> EngineResult<Vec<MemberAllowance>>;

    /// Inserts or replaces a batch of ledger rows.
    fn upsert_allowances(&self, batch: &[MemberAllowance]) -> EngineResult<()>;
}

/// Everything the engine knows about one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    /// The workspace itself.
    pub workspace: Workspace,
    /// Members of the workspace.
    #[serde(default)]
    pub members: Vec<Member>,
    /// Dated member schedules.
    #[serde(default)]
    pub member_schedules: Vec<MemberSchedule>,
    /// Holidays of every calendar used in the workspace.
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

type AllowanceKey = (Uuid, Uuid, i32);

#[derive(Debug, Default)]
struct WorkspaceData {
    snapshot: Option<WorkspaceSnapshot>,
    allowances: BTreeMap<AllowanceKey, MemberAllowance>,
}

/// A [`LedgerStore`] that keeps every workspace in memory.
///
/// # Example
///
/// ```
/// use leave_ledger::ledger::{InMemoryLedgerStore, LedgerStore, WorkspaceSnapshot};
/// use leave_ledger::models::{WeeklySchedule, Workspace};
/// use uuid::Uuid;
///
/// let store = InMemoryLedgerStore::new();
/// let workspace = Workspace {
///     id: Uuid::new_v4(),
///     name: "Acme".to_string(),
///     fiscal_year_start_month: 0,
///     schedule: WeeklySchedule::default(),
/// };
/// store
///     .load_snapshot(WorkspaceSnapshot {
///         workspace: workspace.clone(),
///         members: vec![],
///         member_schedules: vec![],
///         holidays: vec![],
///         allowance_types: vec![],
///         leave_types: vec![],
///         requests: vec![],
///         allowances: vec![],
///     })
///     .unwrap();
///
/// assert_eq!(store.workspace(workspace.id).unwrap(), Some(workspace));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    workspaces: RwLock<HashMap<Uuid, WorkspaceData>>,
}

fn poisoned<T>(_: PoisonError<T>) -> EngineError {
    EngineError::Store {
        message: "ledger store lock poisoned".to_string(),
    }
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything stored for the snapshot's workspace.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWorkspace` if the workspace fails validation, an
    /// entity of the snapshot belongs to another workspace, or a ledger row
    /// or request falls outside [`LEDGER_YEARS`].
    pub fn load_snapshot(&self, snapshot: WorkspaceSnapshot) -> EngineResult<()> {
        snapshot.workspace.validate()?;
        let workspace_id = snapshot.workspace.id;

        let foreign = |field: &str| EngineError::InvalidWorkspace {
            field: field.to_string(),
            message: format!("contains entries of another workspace than {}", workspace_id),
        };
        if snapshot.members.iter().any(|m| m.workspace_id != workspace_id) {
            return Err(foreign("members"));
        }
        if snapshot.requests.iter().any(|r| r.workspace_id != workspace_id) {
            return Err(foreign("requests"));
        }
        if snapshot.allowances.iter().any(|a| a.workspace_id != workspace_id) {
            return Err(foreign("allowances"));
        }

        let outside = |field: &str, year: i32| EngineError::InvalidWorkspace {
            field: field.to_string(),
            message: format!(
                "year {} is outside the supported years {}..={}",
                year,
                LEDGER_YEARS.start(),
                LEDGER_YEARS.end()
            ),
        };
        if let Some(row) = snapshot.allowances.iter().find(|a| !is_ledger_year(a.year)) {
            return Err(outside("allowances", row.year));
        }
        if let Some(year) = snapshot
            .requests
            .iter()
            .flat_map(|r| [r.start.year(), r.end.year()])
            .find(|year| !is_ledger_year(*year))
        {
            return Err(outside("requests", year));
        }

        let allowances = snapshot
            .allowances
            .iter()
            .map(|row| (row.key(), row.clone()))
            .collect();

        let mut workspaces = self.workspaces.write().map_err(poisoned)?;
        workspaces.insert(
            workspace_id,
            WorkspaceData {
                snapshot: Some(WorkspaceSnapshot {
                    allowances: Vec::new(),
                    ..snapshot
                }),
                allowances,
            },
        );
        Ok(())
    }

    fn read<T>(
        &self,
        workspace_id: Uuid,
        f: impl FnOnce(&WorkspaceSnapshot, &BTreeMap<AllowanceKey, MemberAllowance>) -> T,
    ) -> EngineResult<Option<T>> {
        let workspaces = self.workspaces.read().map_err(poisoned)?;
        Ok(workspaces.get(&workspace_id).and_then(|data| {
            data.snapshot
                .as_ref()
                .map(|snapshot| f(snapshot, &data.allowances))
        }))
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn workspace(&self, workspace_id: Uuid) -> EngineResult<Option<Workspace>> {
        self.read(workspace_id, |s, _| s.workspace.clone())
    }

    fn member(&self, workspace_id: Uuid, member_id: Uuid) -> EngineResult<Option<Member>> {
        Ok(self
            .read(workspace_id, |s, _| {
                s.members.iter().find(|m| m.id == member_id).cloned()
            })?
            .flatten())
    }

    fn member_schedules(
        &self,
        workspace_id: Uuid,
        member_id: Uuid,
    ) -> EngineResult<Vec<MemberSchedule>> {
        Ok(self
            .read(workspace_id, |s, _| {
                s.member_schedules
                    .iter()
                    .filter(|schedule| schedule.member_id == member_id)
                    .cloned()
                    .collect()
            })?
            .unwrap_or_default())
    }

    fn holiday_days(
        &self,
        workspace_id: Uuid,
        calendar_id: Uuid,
    ) -> EngineResult<Vec<PublicHolidayDay>> {
        Ok(self
            .read(workspace_id, |s, _| {
                s.holidays
                    .iter()
                    .filter(|h| h.calendar_id == calendar_id)
                    .map(|h| h.day.clone())
                    .collect()
            })?
            .unwrap_or_default())
    }

    fn allowance_types(&self, workspace_id: Uuid) -> EngineResult<Vec<AllowanceType>> {
        Ok(self
            .read(workspace_id, |s, _| s.allowance_types.clone())?
            .unwrap_or_default())
    }

    fn leave_types(&self, workspace_id: Uuid) -> EngineResult<Vec<LeaveType>> {
        Ok(self
            .read(workspace_id, |s, _| s.leave_types.clone())?
            .unwrap_or_default())
    }

    fn workspace_requests(&self, workspace_id: Uuid) -> EngineResult<Vec<LeaveRequest>> {
        Ok(self
            .read(workspace_id, |s, _| s.requests.clone())?
            .unwrap_or_default())
    }

    fn member_allowances(
        &self,
        workspace_id: Uuid,
        member_id: Uuid,
    ) -> EngineResult<Vec<MemberAllowance>> {
        let mut rows: Vec<MemberAllowance> = self
            .read(workspace_id, |_, allowances| {
                allowances
                    .values()
                    .filter(|row| row.member_id == member_id)
                    .cloned()
                    .collect()
            })?
            .unwrap_or_default();
        rows.sort_by_key(|row| (row.allowance_type_id, row.year));
        Ok(rows)
    }

    fn upsert_allowances(&self, batch: &[MemberAllowance]) -> EngineResult<()> {
        let mut workspaces = self.workspaces.write().map_err(poisoned)?;

        if let Some(row) = batch
            .iter()
            .find(|row| !workspaces.contains_key(&row.workspace_id))
        {
            return Err(EngineError::Store {
                message: format!(
                    "cannot write ledger row for unknown workspace {}",
                    row.workspace_id
                ),
            });
        }

        for row in batch {
            if let Some(data) = workspaces.get_mut(&row.workspace_id) {
                let mut row = row.clone();
                if let Some(existing) = data.allowances.get(&row.key()) {
                    row.id = existing.id;
                }
                data.allowances.insert(row.key(), row);
            }
        }
        Ok(())
    }
}
