// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guild gateway trait for the Discord operations the tracker needs.

use async_trait::async_trait;

use crate::error::InvitrackError;
use crate::types::{GuildInvite, GuildRole};

/// The subset of the Discord API consumed by the invite tracker.
///
/// Ids are passed as decimal strings so the tracker stays independent of
/// the client library's id types.
#[async_trait]
pub trait GuildGateway: Send + Sync + 'static {
    /// Lists the guild's current invites with their usage counts.
    async fn fetch_invites(&self, guild_id: &str) -> Result<Vec<GuildInvite>, InvitrackError>;

    /// Returns the role called `name`, creating it when the guild has none.
    async fn find_or_create_role(
        &self,
        guild_id: &str,
        name: &str,
    ) -> Result<GuildRole, InvitrackError>;

    /// Grants `role_id` to the member.
    async fn add_member_role(
        &self,
        guild_id: &str,
        member_id: &str,
        role_id: &str,
    ) -> Result<(), InvitrackError>;

    /// Revokes `role_id` from the member.
    async fn remove_member_role(
        &self,
        guild_id: &str,
        member_id: &str,
        role_id: &str,
    ) -> Result<(), InvitrackError>;
}
