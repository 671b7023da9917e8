//! # Session Registry
//!
//! Live-connection bookkeeping for resolved handshakes.
//!
//! A [`Connection`] is the read-mostly aggregate produced by the resolver:
//! the decoded identity record, the (optional) confirmed link, and the
//! derived primary-ecosystem UUID. The [`ConnectionRegistry`] owns these
//! for the lifetime of the network session, keyed by both the numeric
//! identity and the resulting UUID; entries are inserted on accept and
//! destroyed on disconnect.
//!
//! ## Concurrency
//! - Thread-safe: a tokio mutex guards the inner maps
//! - No cross-connection shared mutable state lives anywhere else in the
//!   core; per-connection resolution state is owned by its resolution task

use crate::identity::{IdentityRecord, LinkedPlayer};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::trace;
use uuid::Uuid;

/// A resolved, accepted gateway connection.
#[derive(Debug, Clone)]
pub struct Connection {
    record: IdentityRecord,
    linked_player: Option<LinkedPlayer>,
    java_uuid: Uuid,
    clean_hostname: String,
}

impl Connection {
    /// Assemble a connection from its resolved parts.
    ///
    /// The linked player, when present, takes precedence over the one the
    /// record may embed (they are the same after resolution) and decides
    /// the derived UUID.
    pub fn new(
        record: IdentityRecord,
        linked_player: Option<LinkedPlayer>,
        clean_hostname: impl Into<String>,
    ) -> Self {
        let java_uuid = linked_player
            .as_ref()
            .map(|linked| linked.java_unique_id)
            .unwrap_or_else(|| record.bedrock_uuid());
        Self {
            record,
            linked_player,
            java_uuid,
            clean_hostname: clean_hostname.into(),
        }
    }

    pub fn record(&self) -> &IdentityRecord {
        &self.record
    }

    pub fn username(&self) -> &str {
        &self.record.username
    }

    pub fn xuid(&self) -> u64 {
        self.record.xuid
    }

    /// The UUID this connection joins the primary ecosystem under.
    pub fn java_uuid(&self) -> Uuid {
        self.java_uuid
    }

    pub fn linked_player(&self) -> Option<&LinkedPlayer> {
        self.linked_player.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.linked_player.is_some()
    }

    /// The hostname with the embedded payload segment removed.
    pub fn clean_hostname(&self) -> &str {
        &self.clean_hostname
    }
}

#[derive(Default)]
struct RegistryInner {
    by_xuid: HashMap<u64, Arc<Connection>>,
    by_uuid: HashMap<Uuid, Arc<Connection>>,
}

/// Thread-safe registry of live connections.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an accepted connection under both of its keys.
    ///
    /// A reconnect with the same identity replaces the previous entry.
    pub async fn insert(&self, connection: Connection) -> Arc<Connection> {
        let connection = Arc::new(connection);
        let mut inner = self.inner.lock().await;
        inner
            .by_xuid
            .insert(connection.xuid(), Arc::clone(&connection));
        inner
            .by_uuid
            .insert(connection.java_uuid(), Arc::clone(&connection));
        trace!(
            xuid = connection.xuid(),
            connections = inner.by_xuid.len(),
            "Connection registered"
        );
        connection
    }

    pub async fn get_by_xuid(&self, xuid: u64) -> Option<Arc<Connection>> {
        self.inner.lock().await.by_xuid.get(&xuid).cloned()
    }

    pub async fn get_by_uuid(&self, uuid: &Uuid) -> Option<Arc<Connection>> {
        self.inner.lock().await.by_uuid.get(uuid).cloned()
    }

    /// Remove a connection on disconnect. Idempotent.
    pub async fn remove(&self, xuid: u64) -> Option<Arc<Connection>> {
        let mut inner = self.inner.lock().await;
        let connection = inner.by_xuid.remove(&xuid)?;
        inner.by_uuid.remove(&connection.java_uuid());
        trace!(
            xuid,
            connections = inner.by_xuid.len(),
            "Connection removed"
        );
        Some(connection)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.by_xuid.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.by_xuid.is_empty()
    }
}
