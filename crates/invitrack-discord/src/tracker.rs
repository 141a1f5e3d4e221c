// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invite attribution logic behind the guild events.
//!
//! A member who joins through an invite gets a pending role named after the
//! invite code. When one of the configured approval roles is later granted,
//! the invite's `count` is credited and the pending role is revoked.

use std::sync::Arc;

use tracing::{debug, info, warn};

use invitrack_config::model::BotConfig;
use invitrack_core::{
    GuildGateway, GuildInvite, GuildRole, Invitation, InvitationPatch, InvitationStore,
    InvitrackError, LeaderboardEntry, MemberRolesChanged,
};

/// Applies guild events to the invitation store.
pub struct InviteTracker {
    store: Arc<dyn InvitationStore>,
    gateway: Arc<dyn GuildGateway>,
    bot: BotConfig,
}

impl InviteTracker {
    pub fn new(
        store: Arc<dyn InvitationStore>,
        gateway: Arc<dyn GuildGateway>,
        bot: BotConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            bot,
        }
    }

    pub fn bot_config(&self) -> &BotConfig {
        &self.bot
    }

    /// Records every invite the guilds currently have, after the warm-up delay.
    ///
    /// Known codes get their `uses` refreshed. A failing guild is logged and
    /// skipped; the first failure is returned once all guilds were tried.
    pub async fn cache_invites(&self, guild_ids: &[String]) -> Result<(), InvitrackError> {
        tokio::time::sleep(self.bot.cache_warm_delay()).await;

        let mut first_error = None;
        for guild_id in guild_ids {
            match self.cache_guild_invites(guild_id).await {
                Ok(cached) => info!(guild_id = %guild_id, cached, "invitations cached"),
                Err(e) => {
                    warn!(guild_id = %guild_id, error = %e, "failed to cache guild invitations");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn cache_guild_invites(&self, guild_id: &str) -> Result<usize, InvitrackError> {
        let invites = self.gateway.fetch_invites(guild_id).await?;
        for invite in &invites {
            match self.store.get(&invite.code).await? {
                None => self.store.add(&snapshot(invite)).await?,
                Some(_) => {
                    self.store
                        .update(&invite.code, InvitationPatch::uses(invite.uses))
                        .await?
                }
            }
        }
        Ok(invites.len())
    }

    /// Stores a freshly created invite with zeroed counters.
    pub async fn on_invite_created(
        &self,
        code: &str,
        inviter_id: Option<&str>,
    ) -> Result<(), InvitrackError> {
        self.store.add(&Invitation::new(code, inviter_id)).await
    }

    /// Finds the invite whose `uses` moved and marks the member with its pending role.
    pub async fn on_member_joined(
        &self,
        guild_id: &str,
        member_id: &str,
    ) -> Result<(), InvitrackError> {
        let invites = self.gateway.fetch_invites(guild_id).await?;

        for invite in invites {
            let stored = match self.store.get(&invite.code).await? {
                Some(stored) => stored,
                None => {
                    let record = snapshot(&invite);
                    match self.store.add(&record).await {
                        Ok(()) => {}
                        // Another event inserted it first.
                        Err(e) if e.is_constraint() => {
                            debug!(code = %invite.code, "invitation already recorded")
                        }
                        Err(e) => return Err(e),
                    }
                    record
                }
            };

            if invite.uses == 0 || invite.uses == stored.uses {
                continue;
            }

            self.store
                .update(&invite.code, InvitationPatch::uses(invite.uses))
                .await?;

            let role_name = self.bot.pending_role_name(&invite.code);
            let role = self
                .gateway
                .find_or_create_role(guild_id, &role_name)
                .await?;
            self.gateway
                .add_member_role(guild_id, member_id, &role.id)
                .await?;
            info!(
                member_id = %member_id,
                code = %invite.code,
                inviter = invite.inviter_id.as_deref().unwrap_or(invitrack_core::UNKNOWN_INVITER),
                "member joined through invite"
            );
        }
        Ok(())
    }

    /// Credits the inviter when a pending member receives an approval role.
    pub async fn on_member_roles_changed(
        &self,
        change: &MemberRolesChanged,
    ) -> Result<(), InvitrackError> {
        if change.added.is_empty() {
            return Ok(());
        }

        let Some((code, pending_role)) = self.pending_role(change)? else {
            return Ok(());
        };

        let approved = change
            .added
            .iter()
            .any(|role| self.bot.is_special_role(&role.name));
        if !approved {
            return Ok(());
        }

        if !self.store.increment_count(code).await? {
            let invites = self.gateway.fetch_invites(&change.guild_id).await?;
            let Some(invite) = invites.into_iter().find(|i| i.code == code) else {
                debug!(code = %code, "approved member's invite no longer exists");
                return Ok(());
            };
            let record = Invitation::new(invite.code, invite.inviter_id.as_deref())
                .with_uses(1)
                .with_count(1);
            self.store.add(&record).await?;
        }

        self.gateway
            .remove_member_role(&change.guild_id, &change.member_id, &pending_role.id)
            .await?;
        info!(member_id = %change.member_id, code = %code, "member approved, inviter credited");
        Ok(())
    }

    /// The member's single pending role and the invite code it encodes.
    fn pending_role<'a>(
        &self,
        change: &'a MemberRolesChanged,
    ) -> Result<Option<(&'a str, &'a GuildRole)>, InvitrackError> {
        let mut pending = change.roles.iter().filter_map(|role| {
            self.bot
                .pending_role_code(&role.name)
                .map(|code| (code, role))
        });
        let first = pending.next();
        if first.is_some() && pending.next().is_some() {
            warn!(member_id = %change.member_id, "member has multiple pending invite roles");
            return Err(InvitrackError::MultiplePendingRoles {
                member_id: change.member_id.clone(),
            });
        }
        Ok(first)
    }

    pub async fn get_invitation(&self, code: &str) -> Result<Option<Invitation>, InvitrackError> {
        self.store.get(code).await
    }

    pub async fn get_leaderboard(
        &self,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, InvitrackError> {
        self.store.leaderboard(limit).await
    }
}

/// A store record mirroring what the guild reports, with nothing credited yet.
fn snapshot(invite: &GuildInvite) -> Invitation {
    Invitation::new(invite.code.clone(), invite.inviter_id.as_deref()).with_uses(invite.uses)
}
