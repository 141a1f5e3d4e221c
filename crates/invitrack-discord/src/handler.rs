// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway event handler: converts serenity events into tracker calls.
//!
//! Errors stop here. Every failure is logged and the event is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    ActivityData, Command, CommandInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EventHandler, GuildId, GuildMemberUpdateEvent, Interaction,
    InviteCreateEvent, Member, OnlineStatus, Ready, Role, RoleId, UserId,
};
use tracing::{debug, error, info, warn};

use invitrack_core::{GuildRole, MemberRolesChanged};

use crate::commands;
use crate::tracker::InviteTracker;

/// serenity event handler backed by an [`InviteTracker`].
pub struct Handler {
    tracker: Arc<InviteTracker>,
    version: String,
}

impl Handler {
    pub fn new(tracker: Arc<InviteTracker>, version: impl Into<String>) -> Self {
        Self {
            tracker,
            version: version.into(),
        }
    }

    async fn reply_content(&self, ctx: &Context, command: &CommandInteraction) -> Option<String> {
        let bot = self.tracker.bot_config();
        match command.data.name.as_str() {
            commands::LEADERBOARD => Some(self.leaderboard(ctx, command.guild_id).await),
            commands::INVITE => {
                let code = command
                    .data
                    .options
                    .iter()
                    .find(|option| option.name == commands::CODE_OPTION)
                    .and_then(|option| option.value.as_str())
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                Some(match self.tracker.get_invitation(&code).await {
                    Ok(invitation) => commands::render_invitation(&code, invitation.as_ref()),
                    Err(e) => {
                        error!(code = %code, error = %e, "invite command failed");
                        "Could not load that invite right now".to_string()
                    }
                })
            }
            commands::HELP => Some(commands::help_text(
                bot.leaderboard_limit,
                &bot.special_roles,
            )),
            other => {
                warn!(command = other, "unknown slash command");
                None
            }
        }
    }

    /// Leaderboard rows with inviter ids resolved to display names.
    ///
    /// Inviters that are no longer guild members are skipped.
    async fn leaderboard(&self, ctx: &Context, guild_id: Option<GuildId>) -> String {
        let Some(guild_id) = guild_id else {
            return "The leaderboard is only available inside a server".to_string();
        };
        let entries = match self
            .tracker
            .get_leaderboard(self.tracker.bot_config().leaderboard_limit)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "leaderboard command failed");
                return "Could not load the leaderboard right now".to_string();
            }
        };

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(user_id) = entry.inviter.parse::<u64>().ok().filter(|id| *id != 0) else {
                continue;
            };
            match guild_id.member(ctx, UserId::new(user_id)).await {
                Ok(member) => rows.push((member.display_name().to_string(), entry.total)),
                Err(e) => debug!(inviter = %entry.inviter, error = %e, "inviter not in guild"),
            }
        }
        commands::render_leaderboard(&rows)
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected to Discord");
        ctx.set_presence(
            Some(ActivityData::watching(format!("v{}", self.version))),
            OnlineStatus::Online,
        );

        if let Err(e) = Command::set_global_commands(&ctx.http, commands::definitions()).await {
            error!(error = %e, "failed to register slash commands");
        }

        let guild_ids: Vec<String> = ready.guilds.iter().map(|g| g.id.to_string()).collect();
        let tracker = Arc::clone(&self.tracker);
        tokio::spawn(async move {
            if let Err(e) = tracker.cache_invites(&guild_ids).await {
                error!(error = %e, "invite cache warm-up incomplete");
            }
        });
    }

    async fn invite_create(&self, _ctx: Context, data: InviteCreateEvent) {
        let inviter = data.inviter.as_ref().map(|user| user.id.to_string());
        if let Err(e) = self
            .tracker
            .on_invite_created(&data.code, inviter.as_deref())
            .await
        {
            error!(code = %data.code, error = %e, "failed to record created invite");
        }
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        let guild_id = new_member.guild_id.to_string();
        let member_id = new_member.user.id.to_string();
        if let Err(e) = self.tracker.on_member_joined(&guild_id, &member_id).await {
            error!(guild_id = %guild_id, member_id = %member_id, error = %e, "failed to attribute new member");
        }
    }

    async fn guild_member_update(
        &self,
        ctx: Context,
        old_if_available: Option<Member>,
        _new: Option<Member>,
        event: GuildMemberUpdateEvent,
    ) {
        let Some(old) = old_if_available else {
            debug!(member_id = %event.user.id, "member update without cached previous state");
            return;
        };
        let added = added_roles(&old.roles, &event.roles);
        if added.is_empty() {
            return;
        }

        let guild_roles = match event.guild_id.roles(&ctx.http).await {
            Ok(roles) => roles,
            Err(e) => {
                error!(guild_id = %event.guild_id, error = %e, "failed to load guild roles");
                return;
            }
        };

        let change = MemberRolesChanged {
            guild_id: event.guild_id.to_string(),
            member_id: event.user.id.to_string(),
            roles: resolve_roles(&event.roles, &guild_roles),
            added: resolve_roles(&added, &guild_roles),
        };
        if let Err(e) = self.tracker.on_member_roles_changed(&change).await {
            error!(member_id = %change.member_id, error = %e, "failed to process role update");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let Some(content) = self.reply_content(&ctx, &command).await else {
            return;
        };

        let response =
            CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().content(content));
        if let Err(e) = command.create_response(&ctx.http, response).await {
            error!(command = %command.data.name, error = %e, "failed to answer slash command");
        }
    }
}

/// Roles present in `new` but not in `old`.
pub(crate) fn added_roles(old: &[RoleId], new: &[RoleId]) -> Vec<RoleId> {
    new.iter().filter(|id| !old.contains(id)).copied().collect()
}

/// Attaches names to role ids. Ids unknown to the guild are dropped.
pub(crate) fn resolve_roles(ids: &[RoleId], guild_roles: &HashMap<RoleId, Role>) -> Vec<GuildRole> {
    ids.iter()
        .filter_map(|id| guild_roles.get(id))
        .map(|role| GuildRole::new(role.id.to_string(), role.name.clone()))
        .collect()
}
