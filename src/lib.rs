//! Leave Duration & Allowance Ledger Engine
//!
//! This crate computes how much scheduled working time a leave request
//! consumes, split by fiscal year, checks it against a member's allowance
//! balances, and maintains the persisted per-year allowance ledger with
//! carry-forward, expiration and per leave type statistics.
//!
//! The calculation functions in [`calculation`] are pure and operate on
//! in-memory snapshots; [`ledger`] recomputes stored balances through the
//! [`ledger::LedgerStore`] seam; [`api`] exposes both over HTTP.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod models;
