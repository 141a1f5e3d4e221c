// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage layer, the tracker and the Discord adapter.

use serde::{Deserialize, Serialize};

/// Inviter recorded when the platform does not report who created an invite.
pub const UNKNOWN_INVITER: &str = "none";

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Store is fully operational.
    Healthy,
    /// Store is not operational.
    Unhealthy(String),
}

/// A persisted invite link and its redemption counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Platform-assigned invite code. Primary key.
    pub code: String,
    /// Id of the member who created the invite, or [`UNKNOWN_INVITER`].
    pub inviter: String,
    /// Total redemptions as reported by the platform.
    pub uses: u64,
    /// Redemptions that ended with an approved member.
    pub count: u64,
}

impl Invitation {
    /// Creates a record with both counters at zero.
    ///
    /// A missing inviter is stored as [`UNKNOWN_INVITER`].
    pub fn new(code: impl Into<String>, inviter: Option<&str>) -> Self {
        Self {
            code: code.into(),
            inviter: inviter.unwrap_or(UNKNOWN_INVITER).to_string(),
            uses: 0,
            count: 0,
        }
    }

    pub fn with_uses(mut self, uses: u64) -> Self {
        self.uses = uses;
        self
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }
}

/// A partial update of an [`Invitation`]. Only `Some` fields are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvitationPatch {
    pub count: Option<u64>,
    pub uses: Option<u64>,
}

impl InvitationPatch {
    pub fn count(count: u64) -> Self {
        Self {
            count: Some(count),
            uses: None,
        }
    }

    pub fn uses(uses: u64) -> Self {
        Self {
            count: None,
            uses: Some(uses),
        }
    }

    /// Returns `true` when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.count.is_none() && self.uses.is_none()
    }
}

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub inviter: String,
    /// Sum of credited invites across all of the inviter's codes.
    pub total: u64,
}

/// An invite as currently reported by the guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInvite {
    pub code: String,
    pub inviter_id: Option<String>,
    pub uses: u64,
}

/// A guild role reduced to what the tracker needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuildRole {
    pub id: String,
    pub name: String,
}

impl GuildRole {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A member role update, already diffed against the previous member state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRolesChanged {
    pub guild_id: String,
    pub member_id: String,
    /// All roles the member holds after the update.
    pub roles: Vec<GuildRole>,
    /// Roles present after the update but not before.
    pub added: Vec<GuildRole>,
}
