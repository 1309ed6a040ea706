//! Stored allowance ledger maintenance.
//!
//! This module owns the persisted side of the engine: the [`LedgerStore`]
//! seam and its in-memory implementation, the gap filler that guarantees a
//! row per member, allowance type and fiscal year, and the updater that
//! recomputes every row from request history.

mod gap_filler;
mod store;
mod updater;

pub use gap_filler::{fill_allowance_gaps, ledger_year_range};
pub use store::{InMemoryLedgerStore, LedgerStore, WorkspaceSnapshot};
pub use updater::{AllowanceLedgerUpdater, LeaveTypeStats, MemberLocks, recompute_rows};
