// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temp-directory SQLite stores and test configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use invitrack_config::model::{BotConfig, QueueConfig, StorageConfig};
use invitrack_core::InvitrackError;
use invitrack_storage::SqliteInvitationStore;

/// An initialized [`SqliteInvitationStore`] in its own temp directory.
///
/// The directory is deleted when this value drops, so keep it alive for the
/// duration of the test.
pub struct TempStore {
    store: Arc<SqliteInvitationStore>,
    dir: TempDir,
}

impl TempStore {
    /// Creates and initializes a store with a 1 ms queue step.
    pub async fn new() -> Result<Self, InvitrackError> {
        Self::with_step_interval(Duration::from_millis(1)).await
    }

    pub async fn with_step_interval(step: Duration) -> Result<Self, InvitrackError> {
        let dir = tempfile::tempdir().map_err(|e| InvitrackError::Connection {
            source: Box::new(e),
        })?;
        let store = SqliteInvitationStore::new(
            StorageConfig {
                data_dir: dir.path().display().to_string(),
                database_name: "invitrack-test".to_string(),
                busy_timeout_ms: 1000,
            },
            QueueConfig {
                step_interval_ms: u64::try_from(step.as_millis()).unwrap_or(u64::MAX),
            },
        );
        store.initialize().await?;

        Ok(Self {
            store: Arc::new(store),
            dir,
        })
    }

    pub fn store(&self) -> Arc<SqliteInvitationStore> {
        Arc::clone(&self.store)
    }

    /// Path of the database file.
    pub fn database_file(&self) -> PathBuf {
        self.dir.path().join("invitrack-test.db.sqlite")
    }
}

/// Bot settings for tests: defaults with no cache warm-up delay.
pub fn test_bot_config() -> BotConfig {
    BotConfig {
        cache_warm_delay_ms: 0,
        ..BotConfig::default()
    }
}
