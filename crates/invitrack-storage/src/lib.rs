// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence layer for the Invitrack invite tracker.
//!
//! Provides a single-worker [`WorkQueue`] that serializes transactions,
//! a [`Database`] wrapper over one `tokio-rusqlite` connection, the
//! invitation queries, and [`SqliteInvitationStore`], the
//! [`InvitationStore`](invitrack_core::InvitationStore) implementation used
//! by the tracker.

pub mod adapter;
pub mod database;
pub mod queries;
pub mod work_queue;

pub use adapter::SqliteInvitationStore;
pub use database::{Database, OnSuccess, Statement, TransactionTicket};
pub use work_queue::{Work, WorkQueue};
