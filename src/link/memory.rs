//! In-memory backend.
//!
//! A single-process registry for tests and small deployments: links and
//! pending requests live in locked maps and are lost on restart. Unlike
//! the ambient global map it replaces, this is an explicit component with
//! defined construction and teardown: ownership is always visible at the
//! call site.

use crate::error::Result;
use crate::identity::LinkedPlayer;
use crate::link::{LinkRegistry, LinkRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct MemoryInner {
    /// Pending requests keyed by initiating username
    requests: HashMap<String, LinkRequest>,
    /// Confirmed links keyed by gateway identity
    links: HashMap<Uuid, LinkedPlayer>,
    /// Reverse index: java unique id -> gateway identity
    java_index: HashMap<Uuid, Uuid>,
}

/// Explicit in-process registry.
#[derive(Default)]
pub struct MemoryLinkRegistry {
    inner: Mutex<MemoryInner>,
}

impl MemoryLinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRegistry for MemoryLinkRegistry {
    async fn fetch_link(&self, bedrock_id: Uuid) -> Result<Option<LinkedPlayer>> {
        Ok(self.inner.lock().await.links.get(&bedrock_id).cloned())
    }

    async fn is_linked(&self, id: Uuid) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(inner.links.contains_key(&id) || inner.java_index.contains_key(&id))
    }

    async fn add_link(
        &self,
        java_unique_id: Uuid,
        java_username: &str,
        bedrock_id: Uuid,
    ) -> Result<LinkedPlayer> {
        let linked = LinkedPlayer::new(bedrock_id, java_unique_id, java_username);
        let mut inner = self.inner.lock().await;
        if let Some(previous) = inner.links.insert(bedrock_id, linked.clone()) {
            inner.java_index.remove(&previous.java_unique_id);
        }
        inner.java_index.insert(java_unique_id, bedrock_id);
        Ok(linked)
    }

    async fn unlink(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let bedrock_id = match inner.java_index.get(&id) {
            Some(bedrock_id) => *bedrock_id,
            None => id,
        };
        if let Some(linked) = inner.links.remove(&bedrock_id) {
            inner.java_index.remove(&linked.java_unique_id);
        }
        Ok(())
    }

    async fn create_request(&self, request: LinkRequest) -> Result<()> {
        // last writer wins; any previous pending request is superseded
        self.inner
            .lock()
            .await
            .requests
            .insert(request.java_username.clone(), request);
        Ok(())
    }

    async fn resolve_and_consume(
        &self,
        java_username: &str,
        bedrock_username: &str,
    ) -> Result<Option<LinkRequest>> {
        let mut inner = self.inner.lock().await;
        let matched = inner
            .requests
            .get(java_username)
            .map(|request| request.bedrock_username == bedrock_username)
            .unwrap_or(false);
        if !matched {
            return Ok(None);
        }
        Ok(inner.requests.remove(java_username))
    }

    async fn sweep_expired(&self, max_age: Duration) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.requests.len();
        inner
            .requests
            .retain(|_, request| !request.is_expired(max_age));
        Ok((before - inner.requests.len()) as u64)
    }
}
