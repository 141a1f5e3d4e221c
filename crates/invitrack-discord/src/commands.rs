// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash command definitions and plain-text reply rendering.

use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption};

use invitrack_core::Invitation;

pub const LEADERBOARD: &str = "leaderboard";
pub const INVITE: &str = "invite";
pub const HELP: &str = "help";

/// Name of the `/invite` option holding the code.
pub const CODE_OPTION: &str = "code";

/// Global commands registered when the gateway is ready.
pub fn definitions() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(LEADERBOARD).description("Show the members with the most approved invites"),
        CreateCommand::new(INVITE)
            .description("Show the stats of one invite code")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, CODE_OPTION, "Invite code")
                    .required(true),
            ),
        CreateCommand::new(HELP).description("Explain what this bot tracks"),
    ]
}

/// Renders ranked `(display name, total)` rows.
pub fn render_leaderboard(rows: &[(String, u64)]) -> String {
    if rows.is_empty() {
        return "Empty leaderboard".to_string();
    }

    let mut out = format!("Invitations leaderboard, top {} inviters:\n", rows.len());
    for (index, (name, total)) in rows.iter().enumerate() {
        out.push_str(&format!("{}. {name} - {total}\n", index + 1));
    }
    out
}

pub fn render_invitation(code: &str, invitation: Option<&Invitation>) -> String {
    match invitation {
        Some(inv) => format!(
            "Invite `{code}` by <@{}>: {} uses, {} approved",
            inv.inviter, inv.uses, inv.count
        ),
        None => format!("No invite `{code}` is being tracked"),
    }
}

pub fn help_text(limit: usize, special_roles: &[String]) -> String {
    format!(
        "Invitation bot\n\
         /{LEADERBOARD} - top {limit} inviters by approved members\n\
         /{INVITE} code:<code> - stats of one invite\n\
         /{HELP} - this message\n\
         A member counts for their inviter once granted one of: {}",
        special_roles.join(", ")
    )
}
