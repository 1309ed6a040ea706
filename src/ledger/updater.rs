//! Full recomputation of a member's ledger from request history.
//!
//! [`AllowanceLedgerUpdater::recompute`] rebuilds `taken`, `brought_forward`,
//! `expiration`, `remaining` and the per leave type statistics of every
//! ledger row of a member. The recomputation is total: it never depends on
//! the previously stored derived values, so running it twice without new
//! requests yields identical rows.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{
    MemberCalendar, calculate_working_time, fiscal_year_window, split_by_fiscal_year,
};
use crate::config::LedgerConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AllowanceType, LeaveType, Member, MemberAllowance, Workspace, is_ledger_year,
};

use super::gap_filler::fill_allowance_gaps;
use super::store::LedgerStore;

/// Consumed amount per fiscal year and leave type.
pub type LeaveTypeStats = BTreeMap<i32, BTreeMap<Uuid, Decimal>>;

/// Registry of per-member mutexes serializing ledger writes.
///
/// Recomputations for different members run in parallel; two
/// recomputations for the same `(workspace, member)` never overlap.
#[derive(Debug, Default)]
pub struct MemberLocks {
    locks: Mutex<HashMap<(Uuid, Uuid), Arc<Mutex<()>>>>,
}

impl MemberLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex guarding one member's ledger.
    pub fn lock_for(&self, workspace_id: Uuid, member_id: Uuid) -> EngineResult<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| EngineError::Store {
            message: "member lock registry poisoned".to_string(),
        })?;
        Ok(Arc::clone(
            locks.entry((workspace_id, member_id)).or_default(),
        ))
    }

    /// Removes a member's mutex from the registry once no caller holds it.
    ///
    /// Callers drop their handle from [`MemberLocks::lock_for`] first.
    pub fn release(&self, workspace_id: Uuid, member_id: Uuid) {
        let Ok(mut locks) = self.locks.lock() else {
            warn!("member lock registry poisoned, entry kept");
            return;
        };
        let key = (workspace_id, member_id);
        if locks.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&key);
        }
    }
}

/// Recomputes stored balances of a member.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use leave_ledger::config::LedgerConfig;
/// use leave_ledger::ledger::{AllowanceLedgerUpdater, InMemoryLedgerStore};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let updater = AllowanceLedgerUpdater::new(
///     Arc::new(InMemoryLedgerStore::new()),
///     LedgerConfig::default(),
/// );
/// let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
///
/// // Nothing is loaded, so the workspace cannot be found
/// assert!(updater.recompute(Uuid::new_v4(), Uuid::new_v4(), today).is_err());
/// ```
pub struct AllowanceLedgerUpdater {
    store: Arc<dyn LedgerStore>,
    locks: MemberLocks,
    settings: LedgerConfig,
}

impl AllowanceLedgerUpdater {
    /// Creates an updater writing through `store`.
    pub fn new(store: Arc<dyn LedgerStore>, settings: LedgerConfig) -> Self {
        Self {
            store,
            locks: MemberLocks::new(),
            settings,
        }
    }

    /// Recomputes the ledger of one member and returns the persisted rows.
    ///
    /// # Arguments
    ///
    /// * `workspace_id` - The member's workspace
    /// * `member_id` - The member whose ledger is rebuilt
    /// * `today` - The current date, used to decide which years need a row
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if `today` is outside the supported ledger
    /// years, and `WorkspaceNotFound`, `MemberNotFound` or
    /// `LeaveTypeNotFound` before anything is written. Returns `Store` if
    /// persisting fails; a failed batch aborts the recomputation.
    pub fn recompute(
        &self,
        workspace_id: Uuid,
        member_id: Uuid,
        today: NaiveDate,
    ) -> EngineResult<Vec<MemberAllowance>> {
        if !is_ledger_year(today.year()) {
            return Err(EngineError::InvalidRequest {
                message: format!("date {} is outside the supported ledger years", today),
            });
        }

        let store = self.store.as_ref();
        let workspace = store
            .workspace(workspace_id)?
            .ok_or(EngineError::WorkspaceNotFound { workspace_id })?;
        let member = store
            .member(workspace_id, member_id)?
            .ok_or(EngineError::MemberNotFound {
                workspace_id,
                member_id,
            })?;

        let lock = self.locks.lock_for(workspace_id, member_id)?;
        let result = match lock.lock() {
            Ok(_guard) => self.recompute_locked(&workspace, &member, today),
            Err(_) => Err(EngineError::Store {
                message: format!("ledger lock of member {} poisoned", member_id),
            }),
        };
        drop(lock);
        self.locks.release(workspace_id, member_id);
        result
    }

    fn recompute_locked(
        &self,
        workspace: &Workspace,
        member: &Member,
        today: NaiveDate,
    ) -> EngineResult<Vec<MemberAllowance>> {
        let store = self.store.as_ref();
        let workspace_id = workspace.id;
        let member_id = member.id;
        let leave_types: HashMap<Uuid, LeaveType> = store
            .leave_types(workspace_id)?
            .into_iter()
            .map(|lt| (lt.id, lt))
            .collect();

        let requests: Vec<_> = store
            .workspace_requests(workspace_id)?
            .into_iter()
            .filter(|r| r.requester_member_id == member_id && r.status.counts_against_allowance())
            .collect();
        if let Some(unknown) = requests
            .iter()
            .find(|r| !leave_types.contains_key(&r.leave_type_id))
        {
            warn!(
                workspace_id = %workspace_id,
                member_id = %member_id,
                request_id = %unknown.id,
                "Request references unknown leave type"
            );
            return Err(EngineError::LeaveTypeNotFound {
                leave_type_id: unknown.leave_type_id,
            });
        }

        fill_allowance_gaps(store, workspace, member_id, today, &self.settings)?;

        let schedules = store.member_schedules(workspace_id, member_id)?;
        let holidays = match member.public_holiday_calendar_id {
            Some(calendar_id) => store.holiday_days(workspace_id, calendar_id)?,
            None => Vec::new(),
        };
        let calendar = MemberCalendar {
            workspace_schedule: &workspace.schedule,
            member_schedules: &schedules,
            public_holidays: &holidays,
        };

        let mut stats = LeaveTypeStats::new();
        for request in &requests {
            let Some(leave_type) = leave_types.get(&request.leave_type_id) else {
                continue;
            };
            let leave_type = LeaveType {
                leave_unit: request.leave_unit,
                ..leave_type.clone()
            };
            let segments = split_by_fiscal_year(
                request.start,
                request.end,
                request.start_at,
                request.end_at,
                workspace.fiscal_year_start_month,
            )?;
            for segment in &segments {
                let working_time = calculate_working_time(segment, &calendar, &leave_type);
                let amount = if leave_type.leave_unit.is_day_unit() {
                    working_time.workday_days
                } else {
                    Decimal::from(working_time.workday_minutes)
                };
                *stats
                    .entry(segment.fiscal_year)
                    .or_default()
                    .entry(leave_type.id)
                    .or_insert(Decimal::ZERO) += amount;
            }
        }
        debug!(
            member_id = %member_id,
            requests = requests.len(),
            years = stats.len(),
            "Accumulated leave type stats"
        );

        let rows = store.member_allowances(workspace_id, member_id)?;
        let mut updated = Vec::with_capacity(rows.len());
        for allowance_type in store.allowance_types(workspace_id)? {
            let type_rows: Vec<MemberAllowance> = rows
                .iter()
                .filter(|row| row.allowance_type_id == allowance_type.id)
                .cloned()
                .collect();
            updated.extend(recompute_rows(
                workspace,
                &allowance_type,
                type_rows,
                &stats,
                &leave_types,
            )?);
        }

        for batch in updated.chunks(self.settings.batch_size.max(1)) {
            if let Err(e) = store.upsert_allowances(batch) {
                warn!(
                    workspace_id = %workspace_id,
                    member_id = %member_id,
                    error = %e,
                    "Ledger batch write failed"
                );
                return Err(e);
            }
        }

        info!(
            workspace_id = %workspace_id,
            member_id = %member_id,
            rows = updated.len(),
            "Recomputed member ledger"
        );
        Ok(updated)
    }
}

/// Recomputes the rows of one allowance type in ascending year order.
///
/// The first row keeps its stored `brought_forward`. Later rows carry
/// `min(max_carry_forward, previous remaining)` unless flagged with
/// `overwrite_brought_forward`; the flag is cleared once the stored and
/// computed values agree.
///
/// # Errors
///
/// Returns `CalculationError` if a row's year has no representable fiscal
/// window.
pub fn recompute_rows(
    workspace: &Workspace,
    allowance_type: &AllowanceType,
    mut rows: Vec<MemberAllowance>,
    stats: &LeaveTypeStats,
    leave_types: &HashMap<Uuid, LeaveType>,
) -> EngineResult<Vec<MemberAllowance>> {
    rows.sort_by_key(|row| row.year);

    let mut last_remaining: Option<Decimal> = None;
    for row in &mut rows {
        let year_stats = stats.get(&row.year).cloned().unwrap_or_default();

        row.taken = year_stats
            .iter()
            .filter(|(leave_type_id, _)| {
                leave_types.get(leave_type_id).is_some_and(|lt| {
                    lt.take_from_allowance && lt.draws_from(allowance_type.id)
                })
            })
            .map(|(_, amount)| *amount)
            .sum();

        match last_remaining {
            None => row.expiration = Decimal::ZERO,
            Some(previous) => {
                let computed = previous.min(allowance_type.max_carry_forward);
                if row.overwrite_brought_forward {
                    if row.brought_forward == computed {
                        row.overwrite_brought_forward = false;
                    }
                } else {
                    row.brought_forward = computed;
                }
                row.expiration = (previous - allowance_type.max_carry_forward).max(Decimal::ZERO);
            }
        }

        let (start, end) = fiscal_year_window(row.year, workspace.fiscal_year_start_month)?;
        row.start = start;
        row.end = end;
        row.leave_types_stats = year_stats;
        row.remaining = row.balance();
        last_remaining = Some(row.remaining);
    }

    Ok(rows)
}
