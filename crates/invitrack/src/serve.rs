// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `invitrack serve` command.

use std::sync::Arc;

use tracing::{error, info};

use invitrack_config::InvitrackConfig;
use invitrack_core::{InvitationStore, InvitrackError};
use invitrack_storage::SqliteInvitationStore;

use crate::shutdown;

/// Runs the bot until a shutdown signal arrives or Discord gives up.
///
/// The store is opened and its schema committed before the client connects,
/// and closed again on the way out whatever the outcome.
pub async fn run_serve(config: InvitrackConfig) -> Result<(), InvitrackError> {
    init_tracing(&config.bot.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting invitrack serve");

    // Fail on a missing token before touching the database.
    invitrack_discord::bot_token(&config.discord)?;

    let store = Arc::new(SqliteInvitationStore::new(
        config.storage.clone(),
        config.queue.clone(),
    ));
    store.initialize().await?;
    info!(path = %config.storage.database_file().display(), "invitation store ready");

    let cancel = shutdown::install_signal_handler();
    let result = invitrack_discord::run(
        &config,
        Arc::clone(&store) as Arc<dyn InvitationStore>,
        cancel,
    )
    .await;
    if let Err(e) = &result {
        error!(error = %e, "Discord client stopped");
    }

    store.close().await?;
    info!("invitrack serve shutdown complete");
    result
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "invitrack={level},invitrack_storage={level},invitrack_discord={level},warn",
            level = log_level.to_ascii_lowercase()
        ))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
