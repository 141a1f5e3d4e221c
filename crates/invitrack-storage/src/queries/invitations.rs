// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invitation CRUD and leaderboard aggregation.
//!
//! Single-statement operations run directly on the connection; only the
//! schema setup goes through a queued transaction.

use rusqlite::types::Value;
use tracing::{debug, error, info};

use invitrack_core::{Invitation, InvitationPatch, InvitrackError, LeaderboardEntry};

use crate::database::{Database, Statement, TransactionTicket, from_sql_int, to_sql_int};

const CREATE_INVITATIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS `Invitations` (
    `code` TEXT UNIQUE PRIMARY KEY,
    `inviter` TEXT NOT NULL,
    `uses` INTEGER DEFAULT 0,
    `count` INTEGER DEFAULT 0)";

/// Queues creation of the `Invitations` table. Idempotent.
///
/// Await the ticket once at startup before issuing other calls.
pub fn ensure_schema(db: &Database) -> TransactionTicket {
    db.execute_transaction(
        vec![Statement::new(CREATE_INVITATIONS_TABLE)],
        Some(Box::new(|| info!("invitation tables are ready"))),
    )
}

/// Insert a new invitation. A duplicate code is a constraint error.
pub async fn add(db: &Database, invitation: &Invitation) -> Result<(), InvitrackError> {
    let params = vec![
        Value::Text(invitation.code.clone()),
        Value::Text(invitation.inviter.clone()),
        Value::Integer(to_sql_int(invitation.uses)?),
        Value::Integer(to_sql_int(invitation.count)?),
    ];
    db.write(
        "INSERT INTO Invitations (code, inviter, uses, count) VALUES (?1, ?2, ?3, ?4)",
        params,
    )
    .await
    .inspect_err(|e| error!(code = %invitation.code, error = %e, "failed to insert invitation"))?;
    info!(code = %invitation.code, inviter = %invitation.inviter, "invitation inserted");
    Ok(())
}

/// Write the fields set in `patch`. Updating a missing code changes nothing.
pub async fn update(
    db: &Database,
    code: &str,
    patch: InvitationPatch,
) -> Result<(), InvitrackError> {
    let Statement { sql, params } = build_update(code, patch)
        .inspect_err(|e| error!(code = %code, error = %e, "rejected invitation update"))?;
    let affected = db
        .write(sql, params)
        .await
        .inspect_err(|e| error!(code = %code, error = %e, "failed to update invitation"))?;
    debug!(code = %code, affected, ?patch, "invitation updated");
    Ok(())
}

/// Credit one approved member to `code`. `false` when the code is unknown.
pub async fn increment_count(db: &Database, code: &str) -> Result<bool, InvitrackError> {
    let affected = db
        .write(
            "UPDATE Invitations SET count = count + 1 WHERE code = ?1",
            vec![Value::Text(code.to_string())],
        )
        .await
        .inspect_err(|e| error!(code = %code, error = %e, "failed to credit invitation"))?;
    debug!(code = %code, affected, "invitation credited");
    Ok(affected > 0)
}

/// Point lookup by code.
pub async fn get(db: &Database, code: &str) -> Result<Option<Invitation>, InvitrackError> {
    let rows = db
        .read(
            "SELECT code, inviter, uses, count FROM Invitations WHERE code = ?1",
            vec![Value::Text(code.to_string())],
            |row| {
                Ok(Invitation {
                    code: row.get(0)?,
                    inviter: row.get(1)?,
                    uses: from_sql_int(row.get(2)?),
                    count: from_sql_int(row.get(3)?),
                })
            },
        )
        .await
        .inspect_err(|e| error!(code = %code, error = %e, "failed to load invitation"))?;
    Ok(rows.into_iter().next())
}

/// Delete by code. Deleting nothing is not an error.
pub async fn remove(db: &Database, code: &str) -> Result<(), InvitrackError> {
    let affected = db
        .write(
            "DELETE FROM Invitations WHERE code = ?1",
            vec![Value::Text(code.to_string())],
        )
        .await
        .inspect_err(|e| error!(code = %code, error = %e, "failed to remove invitation"))?;
    info!(code = %code, affected, "invitation removed");
    Ok(())
}

/// Inviters ranked by the sum of their credited invites. Ties come back in no particular order.
pub async fn leaderboard(
    db: &Database,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>, InvitrackError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.read(
        "SELECT inviter, SUM(count) AS total FROM Invitations
         GROUP BY inviter ORDER BY total DESC LIMIT ?1",
        vec![Value::Integer(limit)],
        |row| {
            Ok(LeaderboardEntry {
                inviter: row.get(0)?,
                total: from_sql_int(row.get(1)?),
            })
        },
    )
    .await
    .inspect_err(|e| error!(error = %e, "failed to load leaderboard"))
}

/// Builds the partial `UPDATE` for `patch`. `SET` clauses follow the order count, uses.
pub fn build_update(code: &str, patch: InvitationPatch) -> Result<Statement, InvitrackError> {
    if patch.is_empty() {
        return Err(InvitrackError::InvalidInput(format!(
            "update of invitation {code} sets no fields"
        )));
    }

    let mut sets = Vec::with_capacity(2);
    let mut params = Vec::with_capacity(3);
    for (column, value) in [("count", patch.count), ("uses", patch.uses)] {
        if let Some(value) = value {
            params.push(Value::Integer(to_sql_int(value)?));
            sets.push(format!("{column} = ?{}", params.len()));
        }
    }
    params.push(Value::Text(code.to_string()));

    Ok(Statement::with_params(
        format!(
            "UPDATE Invitations SET {} WHERE code = ?{}",
            sets.join(", "),
            params.len()
        ),
        params,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, Database) {
        let dir = tempdir().unwrap();
        let db = Database::open(
            dir.path().join("invitrack.db.sqlite"),
            Duration::from_secs(1),
            Duration::from_millis(1),
        )
        .await
        .unwrap();
        ensure_schema(&db).wait().await.unwrap();
        (dir, db)
    }

    #[test]
    fn build_update_count_then_uses() {
        let patch = InvitationPatch {
            count: Some(2),
            uses: Some(7),
        };
        let stmt = build_update("abc", patch).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE Invitations SET count = ?1, uses = ?2 WHERE code = ?3"
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::Integer(2),
                Value::Integer(7),
                Value::Text("abc".into())
            ]
        );
    }

    #[test]
    fn build_update_single_field() {
        let stmt = build_update("abc", InvitationPatch::uses(3)).unwrap();
        assert_eq!(stmt.sql, "UPDATE Invitations SET uses = ?1 WHERE code = ?2");
    }

    #[test]
    fn build_update_rejects_empty_patch() {
        let err = build_update("abc", InvitationPatch::default()).unwrap_err();
        assert!(matches!(err, InvitrackError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let (_dir, db) = setup().await;
        ensure_schema(&db).wait().await.unwrap();
    }

    #[tokio::test]
    async fn add_then_get() {
        let (_dir, db) = setup().await;
        let invitation = Invitation::new("abc", Some("u1")).with_uses(2);
        add(&db, &invitation).await.unwrap();

        assert_eq!(get(&db, "abc").await.unwrap(), Some(invitation));
    }

    #[tokio::test]
    async fn get_missing_code_is_none() {
        let (_dir, db) = setup().await;
        assert_eq!(get(&db, "nonexistent-code").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_add_fails_and_keeps_first_row() {
        let (_dir, db) = setup().await;
        add(&db, &Invitation::new("abc", Some("u1")).with_count(1))
            .await
            .unwrap();

        let err = add(&db, &Invitation::new("abc", Some("u2")))
            .await
            .unwrap_err();
        assert!(err.is_constraint(), "got: {err}");

        let stored = get(&db, "abc").await.unwrap().unwrap();
        assert_eq!(stored.inviter, "u1");
        assert_eq!(stored.count, 1);
    }

    #[tokio::test]
    async fn partial_update_leaves_other_field() {
        let (_dir, db) = setup().await;
        add(&db, &Invitation::new("abc", Some("u1")).with_uses(3))
            .await
            .unwrap();

        update(&db, "abc", InvitationPatch::count(4)).await.unwrap();

        let stored = get(&db, "abc").await.unwrap().unwrap();
        assert_eq!(stored.count, 4);
        assert_eq!(stored.uses, 3);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let (_dir, db) = setup().await;
        add(&db, &Invitation::new("abc", Some("u1")).with_uses(9))
            .await
            .unwrap();

        let increments: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { increment_count(&db, "abc").await })
            })
            .collect();
        for handle in increments {
            assert!(handle.await.unwrap().unwrap());
        }

        let stored = get(&db, "abc").await.unwrap().unwrap();
        assert_eq!(stored.count, 8);
        assert_eq!(stored.uses, 9);
    }

    #[tokio::test]
    async fn increment_missing_code_reports_false() {
        let (_dir, db) = setup().await;
        assert!(!increment_count(&db, "ghost").await.unwrap());
        assert_eq!(get(&db, "ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_missing_code_is_ok() {
        let (_dir, db) = setup().await;
        update(&db, "ghost", InvitationPatch::uses(1)).await.unwrap();
        assert_eq!(get(&db, "ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_deletes_and_tolerates_missing() {
        let (_dir, db) = setup().await;
        add(&db, &Invitation::new("abc", None)).await.unwrap();

        remove(&db, "abc").await.unwrap();
        assert_eq!(get(&db, "abc").await.unwrap(), None);
        remove(&db, "abc").await.unwrap();
    }

    #[tokio::test]
    async fn leaderboard_sums_per_inviter() {
        let (_dir, db) = setup().await;
        add(&db, &Invitation::new("a", Some("u1")).with_count(3))
            .await
            .unwrap();
        add(&db, &Invitation::new("b", Some("u1")).with_count(2))
            .await
            .unwrap();
        add(&db, &Invitation::new("c", Some("u2")).with_count(5))
            .await
            .unwrap();

        let mut board = leaderboard(&db, 10).await.unwrap();
        board.sort_by(|a, b| a.inviter.cmp(&b.inviter));
        assert_eq!(
            board,
            vec![
                LeaderboardEntry {
                    inviter: "u1".into(),
                    total: 5
                },
                LeaderboardEntry {
                    inviter: "u2".into(),
                    total: 5
                },
            ]
        );
    }

    #[tokio::test]
    async fn leaderboard_orders_descending_and_truncates() {
        let (_dir, db) = setup().await;
        add(&db, &Invitation::new("a", Some("u2")).with_count(1))
            .await
            .unwrap();
        add(&db, &Invitation::new("b", Some("u1")).with_count(5))
            .await
            .unwrap();
        add(&db, &Invitation::new("c", Some("u3")))
            .await
            .unwrap();

        let board = leaderboard(&db, 2).await.unwrap();
        let ranked: Vec<_> = board.iter().map(|e| (e.inviter.as_str(), e.total)).collect();
        assert_eq!(ranked, vec![("u1", 5), ("u2", 1)]);
    }
}
