// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the InvitationStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use invitrack_config::model::{QueueConfig, StorageConfig};
use invitrack_core::{
    HealthStatus, Invitation, InvitationPatch, InvitationStore, InvitrackError, LeaderboardEntry,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed invitation store.
///
/// Wraps a [`Database`] handle and delegates to [`queries::invitations`].
/// The database is opened, and its schema created, by
/// [`SqliteInvitationStore::initialize`].
pub struct SqliteInvitationStore {
    storage: StorageConfig,
    queue: QueueConfig,
    db: OnceCell<Database>,
}

impl SqliteInvitationStore {
    /// The database file is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(storage: StorageConfig, queue: QueueConfig) -> Self {
        Self {
            storage,
            queue,
            db: OnceCell::new(),
        }
    }

    /// Opens the database and waits for the schema transaction to commit.
    pub async fn initialize(&self) -> Result<(), InvitrackError> {
        let path = self.storage.database_file();
        let db = Database::open(
            &path,
            self.storage.busy_timeout(),
            self.queue.step_interval(),
        )
        .await?;
        self.db.set(db).map_err(|_| InvitrackError::Connection {
            source: "storage already initialized".into(),
        })?;

        queries::invitations::ensure_schema(self.database()?)
            .wait()
            .await?;
        debug!(path = %path.display(), "SQLite invitation store initialized");
        Ok(())
    }

    /// Shuts the work queue down and closes the connection. A no-op before `initialize`.
    pub async fn close(&self) -> Result<(), InvitrackError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
        }
        Ok(())
    }

    /// The underlying database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, InvitrackError> {
        self.db.get().ok_or_else(|| InvitrackError::Connection {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl InvitationStore for SqliteInvitationStore {
    async fn add(&self, invitation: &Invitation) -> Result<(), InvitrackError> {
        queries::invitations::add(self.database()?, invitation).await
    }

    async fn update(&self, code: &str, patch: InvitationPatch) -> Result<(), InvitrackError> {
        queries::invitations::update(self.database()?, code, patch).await
    }

    async fn increment_count(&self, code: &str) -> Result<bool, InvitrackError> {
        queries::invitations::increment_count(self.database()?, code).await
    }

    async fn get(&self, code: &str) -> Result<Option<Invitation>, InvitrackError> {
        queries::invitations::get(self.database()?, code).await
    }

    async fn remove(&self, code: &str) -> Result<(), InvitrackError> {
        queries::invitations::remove(self.database()?, code).await
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, InvitrackError> {
        queries::invitations::leaderboard(self.database()?, limit).await
    }

    async fn health_check(&self) -> Result<HealthStatus, InvitrackError> {
        Ok(self.database()?.health_check().await)
    }
}
