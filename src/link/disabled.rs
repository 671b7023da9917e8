//! No-op backend for deployments with linking turned off.
//!
//! Every operation fails fast with `LinkingDisabled` so misconfigured
//! callers get a clear answer instead of silently missing links. (The
//! [`Linking`](crate::link::Linking) front short-circuits reads before
//! reaching this backend; hitting these errors means someone bypassed it.)

use crate::error::{GatepassError, Result};
use crate::identity::LinkedPlayer;
use crate::link::{LinkRegistry, LinkRequest};
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

/// Backend used when the linking feature is disabled.
pub struct DisabledLinkRegistry;

#[async_trait]
impl LinkRegistry for DisabledLinkRegistry {
    async fn fetch_link(&self, _bedrock_id: Uuid) -> Result<Option<LinkedPlayer>> {
        Err(GatepassError::LinkingDisabled)
    }

    async fn is_linked(&self, _id: Uuid) -> Result<bool> {
        Err(GatepassError::LinkingDisabled)
    }

    async fn add_link(
        &self,
        _java_unique_id: Uuid,
        _java_username: &str,
        _bedrock_id: Uuid,
    ) -> Result<LinkedPlayer> {
        Err(GatepassError::LinkingDisabled)
    }

    async fn unlink(&self, _id: Uuid) -> Result<()> {
        Err(GatepassError::LinkingDisabled)
    }

    async fn create_request(&self, _request: LinkRequest) -> Result<()> {
        Err(GatepassError::LinkingDisabled)
    }

    async fn resolve_and_consume(
        &self,
        _java_username: &str,
        _bedrock_username: &str,
    ) -> Result<Option<LinkRequest>> {
        Err(GatepassError::LinkingDisabled)
    }

    async fn sweep_expired(&self, _max_age: Duration) -> Result<u64> {
        Err(GatepassError::LinkingDisabled)
    }
}
