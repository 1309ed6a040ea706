//! Ledger row creation for every fiscal year a member's balance spans.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::calculation::{fiscal_year_of, fiscal_year_window};
use crate::config::LedgerConfig;
use crate::error::EngineResult;
use crate::models::{AllowanceType, LeaveRequest, MemberAllowance, Workspace};

use super::store::LedgerStore;

/// Returns the inclusive range of fiscal years that need a ledger row.
///
/// The range starts at the earliest year of an existing row or a workspace
/// request (one year earlier if that year has not started on `today`) and
/// ends at the later of `years_ahead` years after the current one and the
/// latest year a workspace request touches.
///
/// # Errors
///
/// Returns `CalculationError` if the earliest year has no representable
/// fiscal window.
pub fn ledger_year_range(
    workspace: &Workspace,
    existing: &[MemberAllowance],
    requests: &[LeaveRequest],
    today: NaiveDate,
    years_ahead: u32,
) -> EngineResult<(i32, i32)> {
    let start_month = workspace.fiscal_year_start_month;
    let current = fiscal_year_of(today, start_month);

    let request_years = || {
        requests.iter().flat_map(|r| {
            [
                fiscal_year_of(r.start.date(), start_month),
                fiscal_year_of(r.end.date(), start_month),
            ]
        })
    };

    let earliest = existing
        .iter()
        .map(|row| row.year)
        .chain(request_years())
        .min()
        .unwrap_or(current);
    let (earliest_start, _) = fiscal_year_window(earliest, start_month)?;
    let oldest = if earliest_start > today {
        earliest - 1
    } else {
        earliest
    };

    let newest = request_years()
        .max()
        .map_or(current, |latest| latest.max(current))
        .max(current + years_ahead as i32);

    Ok((oldest.min(newest), newest))
}

/// Ensures the member has a ledger row for every allowance type and every
/// fiscal year in [`ledger_year_range`].
///
/// Missing years before the first year with data get zeroed rows. Later
/// missing years inherit the previous year's allowance and carry forward
/// `min(previous remaining, max_carry_forward)`. The earliest stored row of
/// a type that already carries a brought-forward balance is flagged with
/// `overwrite_brought_forward` so later recomputations keep that value.
///
/// Rows are written with upserts in chunks of `settings.batch_size`.
/// Returns the number of rows written.
///
/// # Errors
///
/// Propagates store failures; a failing batch aborts the remaining writes.
pub fn fill_allowance_gaps(
    store: &dyn LedgerStore,
    workspace: &Workspace,
    member_id: Uuid,
    today: NaiveDate,
    settings: &LedgerConfig,
) -> EngineResult<usize> {
    let existing = store.member_allowances(workspace.id, member_id)?;
    let requests = store.workspace_requests(workspace.id)?;
    let allowance_types = store.allowance_types(workspace.id)?;

    let (oldest, newest) =
        ledger_year_range(workspace, &existing, &requests, today, settings.years_ahead)?;
    debug!(
        workspace_id = %workspace.id,
        member_id = %member_id,
        oldest,
        newest,
        "Ledger year range"
    );

    let mut pending = Vec::new();
    for allowance_type in &allowance_types {
        let rows: BTreeMap<i32, &MemberAllowance> = existing
            .iter()
            .filter(|row| row.allowance_type_id == allowance_type.id)
            .map(|row| (row.year, row))
            .collect();
        pending.extend(missing_rows(
            workspace,
            member_id,
            allowance_type,
            &rows,
            oldest,
            newest,
        )?);

        if let Some(first) = rows.values().next() {
            if first.brought_forward > Decimal::ZERO && !first.overwrite_brought_forward {
                let mut flagged = (*first).clone();
                flagged.overwrite_brought_forward = true;
                pending.push(flagged);
            }
        }
    }

    let batch_size = settings.batch_size.max(1);
    for batch in pending.chunks(batch_size) {
        store.upsert_allowances(batch)?;
    }

    if !pending.is_empty() {
        info!(
            workspace_id = %workspace.id,
            member_id = %member_id,
            rows = pending.len(),
            "Filled ledger gaps"
        );
    }
    Ok(pending.len())
}

fn missing_rows(
    workspace: &Workspace,
    member_id: Uuid,
    allowance_type: &AllowanceType,
    rows: &BTreeMap<i32, &MemberAllowance>,
    oldest: i32,
    newest: i32,
) -> EngineResult<Vec<MemberAllowance>> {
    let mut created = Vec::new();
    let mut previous: Option<MemberAllowance> = None;

    for year in oldest..=newest {
        if let Some(row) = rows.get(&year) {
            previous = Some((*row).clone());
            continue;
        }

        let (start, end) = fiscal_year_window(year, workspace.fiscal_year_start_month)?;
        let mut row = MemberAllowance::zeroed(
            workspace.id,
            member_id,
            allowance_type.id,
            year,
            start,
            end,
        );
        if let Some(prior) = &previous {
            row.allowance = prior.allowance;
            row.brought_forward = prior.remaining.min(allowance_type.max_carry_forward);
            row.remaining = row.allowance + row.brought_forward;
        }

        previous = Some(row.clone());
        created.push(row);
    }

    Ok(created)
}
