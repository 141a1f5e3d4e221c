// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Invitrack invite tracker.

use thiserror::Error;

/// Boxed error source carried by the storage and gateway variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all Invitrack crates.
#[derive(Debug, Error)]
pub enum InvitrackError {
    /// Configuration errors (missing bot token, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The database file could not be opened or created.
    #[error("database connection error: {source}")]
    Connection { source: BoxError },

    /// A direct (non-queued) read or write failed.
    #[error("query error: {source}")]
    Query { source: BoxError },

    /// A statement inside a queued transaction failed and the transaction was rolled back.
    #[error("transaction failed: {message}")]
    Transaction {
        message: String,
        source: Option<BoxError>,
    },

    /// A uniqueness constraint was violated, e.g. inserting a duplicate invite code.
    #[error("constraint violation: {source}")]
    Constraint { source: BoxError },

    /// A caller-side precondition was not met.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A member carries more than one pending invite role.
    #[error("member {member_id} has multiple pending invite roles")]
    MultiplePendingRoles { member_id: String },

    /// Discord API errors (HTTP failure, unknown guild, missing permissions).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<BoxError>,
    },

    /// The work queue has shut down and no longer accepts or completes work.
    #[error("work queue is closed")]
    QueueClosed,
}

impl InvitrackError {
    /// Returns `true` if this error is a uniqueness violation.
    pub fn is_constraint(&self) -> bool {
        match self {
            Self::Constraint { .. } => true,
            Self::Transaction {
                source: Some(source),
                ..
            } => source
                .downcast_ref::<InvitrackError>()
                .is_some_and(InvitrackError::is_constraint),
            _ => false,
        }
    }
}
