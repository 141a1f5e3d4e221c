// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection ownership and the three access paths over it.
//!
//! [`Database::read`] and [`Database::write`] run directly on the connection.
//! [`Database::execute_transaction`] goes through the [`WorkQueue`], so
//! queued transactions never interleave with each other. Each transaction
//! step is its own call on the connection thread, which means a direct
//! read or write can land between two steps and see uncommitted state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{ErrorCode, OpenFlags, params_from_iter};
use tokio::sync::oneshot;
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use invitrack_core::{HealthStatus, InvitrackError};

use crate::work_queue::{Work, WorkQueue};

/// Callback run after a queued transaction commits.
pub type OnSuccess = Box<dyn FnOnce() + Send + 'static>;

/// One statement of a transaction with its own parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Awaitable outcome of a queued transaction.
///
/// Dropping the ticket is allowed; the outcome is then only logged by the queue.
#[derive(Debug)]
pub struct TransactionTicket {
    id: String,
    rx: oneshot::Receiver<Result<(), InvitrackError>>,
}

impl TransactionTicket {
    /// Work id of the queued transaction, as it appears in logs.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Waits for the transaction to commit or roll back.
    ///
    /// Yields [`InvitrackError::QueueClosed`] if the queue dropped the
    /// transaction before it ran.
    pub async fn wait(self) -> Result<(), InvitrackError> {
        self.rx.await.map_err(|_| InvitrackError::QueueClosed)?
    }
}

/// The single SQLite connection of a store plus the queue that serializes its transactions.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    queue: WorkQueue,
    path: PathBuf,
    next_work_id: Arc<AtomicU64>,
}

impl Database {
    /// Opens (creating if needed) the database file at `path`.
    ///
    /// The parent directory is created when missing. Must be called from
    /// within a tokio runtime, since it starts the work queue.
    pub async fn open(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
        step_interval: Duration,
    ) -> Result<Self, InvitrackError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| InvitrackError::Connection {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open_with_flags(
            path.clone(),
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .await
        .map_err(|e| InvitrackError::Connection {
            source: Box::new(e),
        })?;

        conn.call(move |conn| conn.busy_timeout(busy_timeout))
            .await
            .map_err(|e| InvitrackError::Connection {
                source: Box::new(e),
            })?;

        debug!(path = %path.display(), "database opened");
        Ok(Self {
            conn,
            queue: WorkQueue::start(step_interval),
            path,
            next_work_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The queue that runs this database's transactions.
    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Runs a read-only statement and maps every row with `map`.
    pub async fn read<T, F>(
        &self,
        sql: impl Into<String>,
        params: Vec<Value>,
        map: F,
    ) -> Result<Vec<T>, InvitrackError>
    where
        T: Send + 'static,
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
    {
        let sql = sql.into();
        self.call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(params_from_iter(params), map)?.collect()
        })
        .await
    }

    /// Runs one mutating statement outside any explicit transaction.
    ///
    /// Returns the number of affected rows.
    pub async fn write(
        &self,
        sql: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<usize, InvitrackError> {
        let sql = sql.into();
        self.call(move |conn| conn.execute(&sql, params_from_iter(params)))
            .await
    }

    /// Queues `statements` as one atomic transaction and returns immediately.
    ///
    /// The queued work issues `BEGIN`, each statement in order, then `COMMIT`.
    /// Any failure rolls back and resolves the ticket with
    /// [`InvitrackError::Transaction`]. `on_success` runs after a commit.
    pub fn execute_transaction(
        &self,
        statements: Vec<Statement>,
        on_success: Option<OnSuccess>,
    ) -> TransactionTicket {
        let id = format!(
            "tx-{}",
            self.next_work_id.fetch_add(1, Ordering::Relaxed)
        );
        let (tx, rx) = oneshot::channel();
        let db = self.clone();

        let work = Work::new(id.clone(), move || async move {
            let outcome = db.run_transaction(statements).await;
            let logged = match &outcome {
                Ok(()) => Ok(()),
                Err(e) => Err(InvitrackError::Transaction {
                    message: e.to_string(),
                    source: None,
                }),
            };
            // Resolve the ticket before the callback runs.
            let _ = tx.send(outcome);
            if let (Ok(()), Some(callback)) = (&logged, on_success) {
                callback();
            }
            logged
        });

        if let Err(e) = self.queue.enqueue(work) {
            warn!(work_id = %id, error = %e, "transaction not queued");
        }
        TransactionTicket { id, rx }
    }

    /// Runs `SELECT 1` against the connection.
    pub async fn health_check(&self) -> HealthStatus {
        match self.call(|conn| conn.execute_batch("SELECT 1;")).await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    /// Shuts the work queue down, dropping pending transactions, then closes the connection.
    pub async fn close(&self) -> Result<(), InvitrackError> {
        self.queue.shutdown().await;
        self.conn
            .clone()
            .close()
            .await
            .map_err(|e| InvitrackError::Connection {
                source: Box::new(e),
            })?;
        debug!(path = %self.path.display(), "database closed");
        Ok(())
    }

    async fn run_transaction(&self, statements: Vec<Statement>) -> Result<(), InvitrackError> {
        self.call(|conn| conn.execute_batch("BEGIN;"))
            .await
            .map_err(|e| transaction_error("BEGIN failed", e))?;

        for (index, Statement { sql, params }) in statements.into_iter().enumerate() {
            let step = self
                .call(move |conn| conn.execute(&sql, params_from_iter(params)))
                .await;
            if let Err(e) = step {
                self.rollback().await;
                return Err(transaction_error(format!("statement {index} failed"), e));
            }
        }

        if let Err(e) = self.call(|conn| conn.execute_batch("COMMIT;")).await {
            self.rollback().await;
            return Err(transaction_error("COMMIT failed", e));
        }
        Ok(())
    }

    async fn rollback(&self) {
        if let Err(e) = self.call(|conn| conn.execute_batch("ROLLBACK;")).await {
            warn!(error = %e, "rollback failed");
        }
    }

    /// Runs `f` on the connection thread and classifies its error.
    ///
    /// The closure's own result travels inside `Ok`, so the outer error only
    /// ever reports a closed connection.
    async fn call<T, F>(&self, f: F) -> Result<T, InvitrackError>
    where
        T: Send + 'static,
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        self.conn
            .call(move |conn| Ok::<_, rusqlite::Error>(f(conn)))
            .await
            .map_err(map_tr_err)?
            .map_err(classify)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// Maps a tokio-rusqlite error (connection thread gone) to [`InvitrackError`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> InvitrackError {
    InvitrackError::Connection {
        source: Box::new(e),
    }
}

/// Uniqueness and other constraint failures become [`InvitrackError::Constraint`].
fn classify(e: rusqlite::Error) -> InvitrackError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => InvitrackError::Constraint {
            source: Box::new(e),
        },
        _ => InvitrackError::Query {
            source: Box::new(e),
        },
    }
}

fn transaction_error(message: impl Into<String>, cause: InvitrackError) -> InvitrackError {
    InvitrackError::Transaction {
        message: message.into(),
        source: Some(Box::new(cause)),
    }
}

/// Converts a counter to SQLite's signed integer.
pub fn to_sql_int(value: u64) -> Result<i64, InvitrackError> {
    i64::try_from(value)
        .map_err(|_| InvitrackError::InvalidInput(format!("{value} does not fit in an SQLite integer")))
}

/// Converts a stored integer back to a counter. Negative values read as zero.
pub fn from_sql_int(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}
