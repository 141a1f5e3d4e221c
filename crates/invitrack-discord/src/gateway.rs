// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `GuildGateway` over serenity's HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{EditRole, GuildId, Http, RoleId, UserId};

use invitrack_core::{GuildGateway, GuildInvite, GuildRole, InvitrackError};

const ROLE_REASON: &str = "invite tracking";

/// Discord REST access for the tracker.
pub struct SerenityGateway {
    http: Arc<Http>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl GuildGateway for SerenityGateway {
    async fn fetch_invites(&self, guild_id: &str) -> Result<Vec<GuildInvite>, InvitrackError> {
        let guild = GuildId::new(parse_id("guild", guild_id)?);
        let invites = guild
            .invites(&*self.http)
            .await
            .map_err(|e| gateway_error(format!("failed to fetch invites of guild {guild_id}"), e))?;

        Ok(invites
            .into_iter()
            .map(|invite| GuildInvite {
                code: invite.code,
                inviter_id: invite.inviter.map(|user| user.id.to_string()),
                uses: invite.uses,
            })
            .collect())
    }

    async fn find_or_create_role(
        &self,
        guild_id: &str,
        name: &str,
    ) -> Result<GuildRole, InvitrackError> {
        let guild = GuildId::new(parse_id("guild", guild_id)?);
        let roles = guild
            .roles(&*self.http)
            .await
            .map_err(|e| gateway_error(format!("failed to list roles of guild {guild_id}"), e))?;

        if let Some(role) = roles.values().find(|role| role.name == name) {
            return Ok(GuildRole::new(role.id.to_string(), role.name.clone()));
        }

        let role = guild
            .create_role(&*self.http, EditRole::new().name(name).audit_log_reason(ROLE_REASON))
            .await
            .map_err(|e| gateway_error(format!("failed to create role {name}"), e))?;
        Ok(GuildRole::new(role.id.to_string(), role.name))
    }

    async fn add_member_role(
        &self,
        guild_id: &str,
        member_id: &str,
        role_id: &str,
    ) -> Result<(), InvitrackError> {
        let (guild, user, role) = parse_member_role(guild_id, member_id, role_id)?;
        self.http
            .add_member_role(guild, user, role, Some(ROLE_REASON))
            .await
            .map_err(|e| gateway_error(format!("failed to grant role {role_id} to {member_id}"), e))
    }

    async fn remove_member_role(
        &self,
        guild_id: &str,
        member_id: &str,
        role_id: &str,
    ) -> Result<(), InvitrackError> {
        let (guild, user, role) = parse_member_role(guild_id, member_id, role_id)?;
        self.http
            .remove_member_role(guild, user, role, Some(ROLE_REASON))
            .await
            .map_err(|e| gateway_error(format!("failed to revoke role {role_id} from {member_id}"), e))
    }
}

/// Parses a decimal snowflake. Zero is rejected since serenity ids must be non-zero.
pub(crate) fn parse_id(kind: &str, raw: &str) -> Result<u64, InvitrackError> {
    raw.parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| InvitrackError::InvalidInput(format!("invalid {kind} id `{raw}`")))
}

fn parse_member_role(
    guild_id: &str,
    member_id: &str,
    role_id: &str,
) -> Result<(GuildId, UserId, RoleId), InvitrackError> {
    Ok((
        GuildId::new(parse_id("guild", guild_id)?),
        UserId::new(parse_id("user", member_id)?),
        RoleId::new(parse_id("role", role_id)?),
    ))
}

fn gateway_error(message: String, source: serenity::Error) -> InvitrackError {
    InvitrackError::Gateway {
        message,
        source: Some(Box::new(source)),
    }
}
