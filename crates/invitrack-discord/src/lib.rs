// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord adapter for the Invitrack invite tracker.
//!
//! [`InviteTracker`] holds the attribution logic and talks to Discord only
//! through [`GuildGateway`](invitrack_core::GuildGateway). [`run`] wires it
//! to a serenity client: [`handler::Handler`] receives gateway events and
//! slash commands, [`gateway::SerenityGateway`] performs the REST calls.

pub mod commands;
pub mod gateway;
pub mod handler;
pub mod tracker;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serenity::all::{Client, GatewayIntents, Http};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use invitrack_config::model::{DiscordConfig, InvitrackConfig};
use invitrack_core::{InvitationStore, InvitrackError};

pub use gateway::SerenityGateway;
pub use handler::Handler;
pub use tracker::InviteTracker;

/// Pause between client start attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Gateway intents the tracker depends on.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_INVITES
        | GatewayIntents::GUILD_MEMBERS
}

/// Returns the configured bot token, or a config error when it is missing.
pub fn bot_token(config: &DiscordConfig) -> Result<&str, InvitrackError> {
    match config.bot_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(InvitrackError::Config(
            "discord.bot_token is required to connect to Discord".into(),
        )),
    }
}

/// Runs the bot until `cancel` fires or the client fails for good.
///
/// A failed client start is retried up to `bot.max_connect_attempts` times,
/// [`RECONNECT_DELAY`] apart.
pub async fn run(
    config: &InvitrackConfig,
    store: Arc<dyn InvitationStore>,
    cancel: CancellationToken,
) -> Result<(), InvitrackError> {
    let token = bot_token(&config.discord)?.to_string();
    let http = Arc::new(Http::new(&token));
    let tracker = Arc::new(InviteTracker::new(
        store,
        Arc::new(SerenityGateway::new(http)),
        config.bot.clone(),
    ));

    retry(config.bot.max_connect_attempts, RECONNECT_DELAY, |attempt| {
        let token = token.clone();
        let tracker = Arc::clone(&tracker);
        let cancel = cancel.clone();
        async move {
            info!(attempt, "starting Discord client");
            let mut client = Client::builder(&token, intents())
                .event_handler(Handler::new(tracker, env!("CARGO_PKG_VERSION")))
                .await?;
            let shard_manager = Arc::clone(&client.shard_manager);

            tokio::select! {
                result = client.start() => result,
                _ = cancel.cancelled() => {
                    info!("stopping Discord client");
                    shard_manager.shutdown_all().await;
                    Ok::<(), serenity::Error>(())
                }
            }
        }
    })
    .await
}

/// Runs `op` until it succeeds or `max_attempts` attempts have failed.
///
/// Attempts are numbered from 1. The last error is wrapped in
/// [`InvitrackError::Gateway`].
pub async fn retry<F, Fut, E>(
    max_attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<(), InvitrackError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %e, "Discord client failed, reconnecting");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(InvitrackError::Gateway {
                    message: format!("Discord client failed after {attempt} attempts"),
                    source: Some(Box::new(e)),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("flaky")]
    struct Flaky;

    #[test]
    fn intents_cover_invites_and_members() {
        let intents = intents();
        assert!(intents.contains(GatewayIntents::GUILD_INVITES));
        assert!(intents.contains(GatewayIntents::GUILD_MEMBERS));
        assert!(intents.contains(GatewayIntents::GUILDS));
        assert!(intents.contains(GatewayIntents::GUILD_MESSAGES));
    }

    #[test]
    fn missing_or_blank_token_is_a_config_error() {
        let missing = DiscordConfig { bot_token: None };
        assert!(matches!(bot_token(&missing), Err(InvitrackError::Config(_))));

        let blank = DiscordConfig {
            bot_token: Some("  ".into()),
        };
        assert!(bot_token(&blank).is_err());

        let set = DiscordConfig {
            bot_token: Some("abc".into()),
        };
        assert_eq!(bot_token(&set).unwrap(), "abc");
    }

    #[tokio::test]
    async fn retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        retry(5, Duration::from_millis(1), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { if attempt < 3 { Err(Flaky) } else { Ok(()) } }
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let err = retry(5, Duration::from_millis(1), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Flaky) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(matches!(err, InvitrackError::Gateway { .. }));
    }
}
