//! Durable SQLite backend.
//!
//! ## Schema
//! ```sql
//! LinkedPlayers(bedrockId TEXT PRIMARY KEY, javaUniqueId TEXT, javaUsername TEXT)
//! LinkedPlayerRequests(javaUsername TEXT PRIMARY KEY, javaUniqueId TEXT,
//!                      linkCode TEXT, bedrockUsername TEXT, requestTime INTEGER)
//! ```
//!
//! The request table's primary key enforces "one pending request per
//! initiating username" in the store itself; `create_request` is an
//! `ON CONFLICT DO UPDATE` upsert so concurrent creators (possibly in
//! different processes) race safely and the last writer wins.
//! `resolve_and_consume` is a single `DELETE ... RETURNING`, making
//! lookup and deletion one atomic statement. `requestTime` is indexed for
//! expiry sweeps.

use crate::error::{GatepassError, Result};
use crate::identity::LinkedPlayer;
use crate::link::{LinkRegistry, LinkRequest};
use crate::utils::time::epoch_seconds;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS LinkedPlayers (
        bedrockId TEXT PRIMARY KEY NOT NULL,
        javaUniqueId TEXT NOT NULL,
        javaUsername TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS LinkedPlayersIndex
        ON LinkedPlayers (bedrockId, javaUniqueId)",
    "CREATE TABLE IF NOT EXISTS LinkedPlayerRequests (
        javaUsername TEXT PRIMARY KEY NOT NULL,
        javaUniqueId TEXT,
        linkCode TEXT NOT NULL,
        bedrockUsername TEXT NOT NULL,
        requestTime INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS LinkedPlayerRequestsTimeIndex
        ON LinkedPlayerRequests (requestTime)",
];

/// Durable link registry backed by a SQLite database file.
pub struct SqliteLinkRegistry {
    pool: SqlitePool,
}

impl SqliteLinkRegistry {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists.
    pub async fn connect(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(store_error)?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(store_error)?;
        }

        debug!(path = %path.display(), "Linked player database ready");
        Ok(Self { pool })
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn store_error(error: sqlx::Error) -> GatepassError {
    GatepassError::StoreUnavailable(error.to_string())
}

fn parse_uuid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text)
        .map_err(|_| GatepassError::StoreUnavailable(format!("corrupt uuid in store: {text}")))
}

fn linked_player_from_row(row: &SqliteRow, bedrock_id: Uuid) -> Result<LinkedPlayer> {
    let java_unique_id: String = row.try_get("javaUniqueId").map_err(store_error)?;
    let java_username: String = row.try_get("javaUsername").map_err(store_error)?;
    Ok(LinkedPlayer::new(
        bedrock_id,
        parse_uuid(&java_unique_id)?,
        java_username,
    ))
}

#[async_trait]
impl LinkRegistry for SqliteLinkRegistry {
    async fn fetch_link(&self, bedrock_id: Uuid) -> Result<Option<LinkedPlayer>> {
        let row = sqlx::query(
            "SELECT javaUniqueId, javaUsername FROM LinkedPlayers WHERE bedrockId = ?",
        )
        .bind(bedrock_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(|row| linked_player_from_row(&row, bedrock_id))
            .transpose()
    }

    async fn is_linked(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM LinkedPlayers WHERE bedrockId = ? OR javaUniqueId = ?",
        )
        .bind(id.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(row.is_some())
    }

    async fn add_link(
        &self,
        java_unique_id: Uuid,
        java_username: &str,
        bedrock_id: Uuid,
    ) -> Result<LinkedPlayer> {
        sqlx::query(
            "INSERT INTO LinkedPlayers (bedrockId, javaUniqueId, javaUsername)
             VALUES (?, ?, ?)
             ON CONFLICT(bedrockId) DO UPDATE SET
                 javaUniqueId = excluded.javaUniqueId,
                 javaUsername = excluded.javaUsername",
        )
        .bind(bedrock_id.to_string())
        .bind(java_unique_id.to_string())
        .bind(java_username)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(LinkedPlayer::new(bedrock_id, java_unique_id, java_username))
    }

    async fn unlink(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM LinkedPlayers WHERE javaUniqueId = ? OR bedrockId = ?")
            .bind(id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn create_request(&self, request: LinkRequest) -> Result<()> {
        sqlx::query(
            "INSERT INTO LinkedPlayerRequests
                 (javaUsername, javaUniqueId, linkCode, bedrockUsername, requestTime)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(javaUsername) DO UPDATE SET
                 javaUniqueId = excluded.javaUniqueId,
                 linkCode = excluded.linkCode,
                 bedrockUsername = excluded.bedrockUsername,
                 requestTime = excluded.requestTime",
        )
        .bind(&request.java_username)
        .bind(request.java_unique_id.map(|id| id.to_string()))
        .bind(&request.link_code)
        .bind(&request.bedrock_username)
        .bind(request.requested_at as i64)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn resolve_and_consume(
        &self,
        java_username: &str,
        bedrock_username: &str,
    ) -> Result<Option<LinkRequest>> {
        let row = sqlx::query(
            "DELETE FROM LinkedPlayerRequests
             WHERE javaUsername = ? AND bedrockUsername = ?
             RETURNING javaUniqueId, linkCode, requestTime",
        )
        .bind(java_username)
        .bind(bedrock_username)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let java_unique_id: Option<String> = row.try_get("javaUniqueId").map_err(store_error)?;
        let link_code: String = row.try_get("linkCode").map_err(store_error)?;
        let request_time: i64 = row.try_get("requestTime").map_err(store_error)?;

        Ok(Some(LinkRequest {
            java_unique_id: java_unique_id.as_deref().map(parse_uuid).transpose()?,
            java_username: java_username.to_string(),
            bedrock_unique_id: None,
            bedrock_username: bedrock_username.to_string(),
            link_code,
            requested_at: request_time as u64,
        }))
    }

    async fn sweep_expired(&self, max_age: Duration) -> Result<u64> {
        let cutoff = epoch_seconds()?.saturating_sub(max_age.as_secs());
        let result = sqlx::query("DELETE FROM LinkedPlayerRequests WHERE requestTime < ?")
            .bind(cutoff as i64)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        let purged = result.rows_affected();
        if purged > 0 {
            debug!(purged, "Expired link requests swept");
        }
        Ok(purged)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::xuid_to_uuid;

    async fn registry(dir: &tempfile::TempDir) -> SqliteLinkRegistry {
        SqliteLinkRegistry::connect(&dir.path().join("linked-players.db"))
            .await
            .unwrap()
    }

    fn java_id() -> Uuid {
        Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap()
    }

    #[tokio::test]
    async fn test_link_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir).await;
        let bedrock = xuid_to_uuid(77);

        assert!(registry.fetch_link(bedrock).await.unwrap().is_none());
        registry.add_link(java_id(), "Alice", bedrock).await.unwrap();

        let linked = registry.fetch_link(bedrock).await.unwrap().unwrap();
        assert_eq!(linked.java_username, "Alice");
        assert_eq!(linked.java_unique_id, java_id());

        assert!(registry.is_linked(bedrock).await.unwrap());
        assert!(registry.is_linked(java_id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_unlink_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir).await;
        let bedrock = xuid_to_uuid(78);

        registry.add_link(java_id(), "Alice", bedrock).await.unwrap();
        registry.unlink(bedrock).await.unwrap();
        // second unlink of the same identity is a no-op, not an error
        registry.unlink(bedrock).await.unwrap();
        assert!(!registry.is_linked(bedrock).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_supersedes_pending_request() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir).await;

        let first = LinkRequest::new_java(java_id(), "Alice", "AliceBedrock", "FIRST1").unwrap();
        let second = LinkRequest::new_java(java_id(), "Alice", "AliceBedrock", "SECOND").unwrap();
        registry.create_request(first).await.unwrap();
        registry.create_request(second).await.unwrap();

        let consumed = registry
            .resolve_and_consume("Alice", "AliceBedrock")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(consumed.link_code, "SECOND");
    }

    #[tokio::test]
    async fn test_consume_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir).await;

        let request = LinkRequest::new_java(java_id(), "Alice", "AliceBedrock", "CODE42").unwrap();
        registry.create_request(request).await.unwrap();

        assert!(registry
            .resolve_and_consume("Alice", "AliceBedrock")
            .await
            .unwrap()
            .is_some());
        assert!(registry
            .resolve_and_consume("Alice", "AliceBedrock")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sweep_expired() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir).await;

        let mut stale = LinkRequest::new_java(java_id(), "Alice", "AliceBedrock", "OLD111").unwrap();
        stale.requested_at -= 10_000;
        registry.create_request(stale).await.unwrap();
        registry
            .create_request(LinkRequest::new_java(java_id(), "Bob", "BobBedrock", "NEW111").unwrap())
            .await
            .unwrap();

        let purged = registry.sweep_expired(Duration::from_secs(300)).await.unwrap();
        assert_eq!(purged, 1);
        assert!(registry
            .resolve_and_consume("Bob", "BobBedrock")
            .await
            .unwrap()
            .is_some());
    }
}
