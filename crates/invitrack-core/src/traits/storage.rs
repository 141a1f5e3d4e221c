// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence trait for invitation records.

use async_trait::async_trait;

use crate::error::InvitrackError;
use crate::types::{HealthStatus, Invitation, InvitationPatch, LeaderboardEntry};

/// Store of [`Invitation`] records.
///
/// Implementations log failures before returning them; callers decide
/// whether to recover.
#[async_trait]
pub trait InvitationStore: Send + Sync + 'static {
    /// Inserts a new record. Fails with [`InvitrackError::Constraint`] if the code exists.
    async fn add(&self, invitation: &Invitation) -> Result<(), InvitrackError>;

    /// Writes the fields set in `patch`. An empty patch is rejected.
    async fn update(&self, code: &str, patch: InvitationPatch) -> Result<(), InvitrackError>;

    /// Adds one credited invite to `code` in a single statement.
    ///
    /// Returns `false` when no record matches.
    async fn increment_count(&self, code: &str) -> Result<bool, InvitrackError>;

    /// Point lookup by code. `Ok(None)` when no record matches.
    async fn get(&self, code: &str) -> Result<Option<Invitation>, InvitrackError>;

    /// Deletes the record for `code`. Deleting nothing is not an error.
    async fn remove(&self, code: &str) -> Result<(), InvitrackError>;

    /// Inviters ranked by total credited invites, descending, at most `limit` rows.
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, InvitrackError>;

    /// Reports whether the backing store is reachable.
    async fn health_check(&self) -> Result<HealthStatus, InvitrackError>;
}
