//! Global linking mode.
//!
//! A central lookup service answers link queries for the whole network;
//! individual servers read from it and may keep a local durable backend
//! of their own. Reads consult the remote service first and fall back to
//! the local backend only when the remote has no definitive answer.
//! Writes (link/unlink/create/consume) never reach the remote service -
//! they require a local backend and otherwise fail with a clear
//! "unavailable in this mode" error.

use crate::error::{constants, GatepassError, Result};
use crate::identity::{uuid_to_xuid, xuid_to_uuid, LinkedPlayer};
use crate::link::{LinkRegistry, LinkRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Response shape of the global lookup endpoint.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    /// Empty object when the identity has no link
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LookupData {
    #[serde(rename = "javaName")]
    java_name: String,
    #[serde(rename = "javaId")]
    java_id: Uuid,
    #[serde(rename = "bedrockId")]
    bedrock_id: u64,
}

/// HTTP client for the central link lookup service.
pub struct RemoteLinkService {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteLinkService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Query the service for the link of a gateway identity.
    ///
    /// # Errors
    /// `StoreUnavailable` for transport failures and for lookups the
    /// service itself reports as failed.
    pub async fn fetch_link(&self, bedrock_id: Uuid) -> Result<Option<LinkedPlayer>> {
        let xuid = uuid_to_xuid(&bedrock_id);
        let url = format!("{}/api/link/bedrock?xuid={xuid}", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GatepassError::StoreUnavailable(e.to_string()))?;
        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| GatepassError::StoreUnavailable(e.to_string()))?;

        if !body.success {
            return Err(GatepassError::StoreUnavailable(
                body.message
                    .unwrap_or_else(|| "global lookup reported failure".into()),
            ));
        }

        // an empty data object means "definitely not linked"
        let data = match body.data {
            Some(value) if value.as_object().map(|o| !o.is_empty()).unwrap_or(false) => value,
            _ => return Ok(None),
        };
        let data: LookupData = serde_json::from_value(data)
            .map_err(|e| GatepassError::StoreUnavailable(format!("malformed lookup data: {e}")))?;

        Ok(Some(LinkedPlayer::new(
            xuid_to_uuid(data.bedrock_id),
            data.java_id,
            data.java_name,
        )))
    }

    pub async fn is_linked(&self, bedrock_id: Uuid) -> Result<bool> {
        Ok(self.fetch_link(bedrock_id).await?.is_some())
    }
}

/// Registry composing the remote lookup service with an optional local
/// durable backend.
pub struct GlobalLinkRegistry {
    remote: RemoteLinkService,
    local: Option<Arc<dyn LinkRegistry>>,
}

impl GlobalLinkRegistry {
    pub fn new(remote: RemoteLinkService, local: Option<Arc<dyn LinkRegistry>>) -> Self {
        Self { remote, local }
    }

    fn local(&self) -> Result<&Arc<dyn LinkRegistry>> {
        self.local
            .as_ref()
            .ok_or_else(|| GatepassError::OperationUnavailable(constants::ERR_GLOBAL_READ_ONLY.into()))
    }
}

#[async_trait]
impl LinkRegistry for GlobalLinkRegistry {
    async fn fetch_link(&self, bedrock_id: Uuid) -> Result<Option<LinkedPlayer>> {
        match self.remote.fetch_link(bedrock_id).await {
            Ok(Some(linked)) => return Ok(Some(linked)),
            Ok(None) => {}
            Err(error) => {
                // degrade to the local backend when one exists
                if self.local.is_none() {
                    return Err(error);
                }
                warn!(%error, "Global link lookup failed, falling back to local store");
            }
        }
        match &self.local {
            Some(local) => local.fetch_link(bedrock_id).await,
            None => Ok(None),
        }
    }

    async fn is_linked(&self, id: Uuid) -> Result<bool> {
        if self.fetch_link(id).await?.is_some() {
            return Ok(true);
        }
        match &self.local {
            Some(local) => local.is_linked(id).await,
            None => Ok(false),
        }
    }

    async fn add_link(
        &self,
        java_unique_id: Uuid,
        java_username: &str,
        bedrock_id: Uuid,
    ) -> Result<LinkedPlayer> {
        self.local()?
            .add_link(java_unique_id, java_username, bedrock_id)
            .await
    }

    async fn unlink(&self, id: Uuid) -> Result<()> {
        self.local()?.unlink(id).await
    }

    async fn create_request(&self, request: LinkRequest) -> Result<()> {
        self.local()?.create_request(request).await
    }

    async fn resolve_and_consume(
        &self,
        java_username: &str,
        bedrock_username: &str,
    ) -> Result<Option<LinkRequest>> {
        self.local()?
            .resolve_and_consume(java_username, bedrock_username)
            .await
    }

    async fn sweep_expired(&self, max_age: Duration) -> Result<u64> {
        self.local()?.sweep_expired(max_age).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_require_local_backend() {
        let registry =
            GlobalLinkRegistry::new(RemoteLinkService::new("http://localhost:4000"), None);
        let java_id = Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap();

        let result = registry
            .add_link(java_id, "Alice", xuid_to_uuid(1))
            .await;
        assert!(matches!(
            result,
            Err(GatepassError::OperationUnavailable(_))
        ));

        let result = registry.unlink(java_id).await;
        assert!(matches!(
            result,
            Err(GatepassError::OperationUnavailable(_))
        ));
    }
}
