// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock guild gateway for deterministic testing.
//!
//! `MockGuild` implements `GuildGateway` over in-memory invites, roles and
//! member role sets, and records every grant and revoke for assertions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use invitrack_core::{GuildGateway, GuildInvite, GuildRole, InvitrackError};

/// A role grant or revoke observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleChange {
    Granted {
        guild_id: String,
        member_id: String,
        role: GuildRole,
    },
    Revoked {
        guild_id: String,
        member_id: String,
        role: GuildRole,
    },
}

#[derive(Default)]
struct GuildState {
    invites: HashMap<String, Vec<GuildInvite>>,
    roles: HashMap<String, Vec<GuildRole>>,
    member_roles: HashMap<(String, String), Vec<GuildRole>>,
    changes: Vec<RoleChange>,
    next_role_id: u64,
    fail_fetch: bool,
}

impl GuildState {
    fn role_by_id(&self, guild_id: &str, role_id: &str) -> Result<GuildRole, InvitrackError> {
        self.roles
            .get(guild_id)
            .and_then(|roles| roles.iter().find(|r| r.id == role_id))
            .cloned()
            .ok_or_else(|| InvitrackError::Gateway {
                message: format!("unknown role {role_id} in guild {guild_id}"),
                source: None,
            })
    }
}

/// A mock guild gateway for testing.
///
/// Cloning shares the underlying state, so a test can keep one handle for
/// assertions while the tracker owns another.
#[derive(Clone, Default)]
pub struct MockGuild {
    state: Arc<Mutex<GuildState>>,
}

impl MockGuild {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the invites the guild reports.
    pub async fn set_invites(&self, guild_id: &str, invites: Vec<GuildInvite>) {
        self.state
            .lock()
            .await
            .invites
            .insert(guild_id.to_string(), invites);
    }

    /// Sets the `uses` of one reported invite, adding the invite if needed.
    pub async fn set_invite_uses(&self, guild_id: &str, code: &str, inviter: Option<&str>, uses: u64) {
        let mut state = self.state.lock().await;
        let invites = state.invites.entry(guild_id.to_string()).or_default();
        match invites.iter_mut().find(|i| i.code == code) {
            Some(invite) => invite.uses = uses,
            None => invites.push(GuildInvite {
                code: code.to_string(),
                inviter_id: inviter.map(str::to_string),
                uses,
            }),
        }
    }

    /// Creates a role directly, as a guild admin would.
    pub async fn create_role(&self, guild_id: &str, name: &str) -> GuildRole {
        let mut state = self.state.lock().await;
        state.next_role_id += 1;
        let role = GuildRole::new(state.next_role_id.to_string(), name);
        state
            .roles
            .entry(guild_id.to_string())
            .or_default()
            .push(role.clone());
        role
    }

    pub async fn role_named(&self, guild_id: &str, name: &str) -> Option<GuildRole> {
        self.state
            .lock()
            .await
            .roles
            .get(guild_id)
            .and_then(|roles| roles.iter().find(|r| r.name == name))
            .cloned()
    }

    /// Roles the member currently holds.
    pub async fn member_roles(&self, guild_id: &str, member_id: &str) -> Vec<GuildRole> {
        self.state
            .lock()
            .await
            .member_roles
            .get(&(guild_id.to_string(), member_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Every grant and revoke, in call order.
    pub async fn role_changes(&self) -> Vec<RoleChange> {
        self.state.lock().await.changes.clone()
    }

    /// Makes `fetch_invites` fail until reset.
    pub async fn fail_invite_fetches(&self, fail: bool) {
        self.state.lock().await.fail_fetch = fail;
    }
}

#[async_trait]
impl GuildGateway for MockGuild {
    async fn fetch_invites(&self, guild_id: &str) -> Result<Vec<GuildInvite>, InvitrackError> {
        let state = self.state.lock().await;
        if state.fail_fetch {
            return Err(InvitrackError::Gateway {
                message: format!("invite fetch failed for guild {guild_id}"),
                source: None,
            });
        }
        Ok(state.invites.get(guild_id).cloned().unwrap_or_default())
    }

    async fn find_or_create_role(
        &self,
        guild_id: &str,
        name: &str,
    ) -> Result<GuildRole, InvitrackError> {
        if let Some(role) = self.role_named(guild_id, name).await {
            return Ok(role);
        }
        Ok(self.create_role(guild_id, name).await)
    }

    async fn add_member_role(
        &self,
        guild_id: &str,
        member_id: &str,
        role_id: &str,
    ) -> Result<(), InvitrackError> {
        let mut state = self.state.lock().await;
        let role = state.role_by_id(guild_id, role_id)?;
        let held = state
            .member_roles
            .entry((guild_id.to_string(), member_id.to_string()))
            .or_default();
        if !held.contains(&role) {
            held.push(role.clone());
        }
        state.changes.push(RoleChange::Granted {
            guild_id: guild_id.to_string(),
            member_id: member_id.to_string(),
            role,
        });
        Ok(())
    }

    async fn remove_member_role(
        &self,
        guild_id: &str,
        member_id: &str,
        role_id: &str,
    ) -> Result<(), InvitrackError> {
        let mut state = self.state.lock().await;
        let role = state.role_by_id(guild_id, role_id)?;
        if let Some(held) = state
            .member_roles
            .get_mut(&(guild_id.to_string(), member_id.to_string()))
        {
            held.retain(|r| r.id != role.id);
        }
        state.changes.push(RoleChange::Revoked {
            guild_id: guild_id.to_string(),
            member_id: member_id.to_string(),
            role,
        });
        Ok(())
    }
}
