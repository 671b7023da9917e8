//! # Account Linking
//!
//! The request/verify/expire state machine that associates a gateway
//! identity with a primary-ecosystem identity, and the persistence
//! contract behind it.
//!
//! ## Lifecycle
//! 1. A Java player creates a [`LinkRequest`] naming the Bedrock player
//!    and receives a short code. Creating a second request for the same
//!    initiator supersedes the first (last-writer-wins, enforced by an
//!    atomic upsert at the storage layer).
//! 2. The Bedrock player verifies with the code. The matched pending
//!    request is **always consumed on lookup**: whether the code turns
//!    out wrong or the request expired is judged only afterwards, so a
//!    failed verification requires issuing a fresh request, and an
//!    expired, consumed request still surfaces as `Expired` rather than
//!    `NoSuchRequest`.
//! 3. On success the confirmed [`LinkedPlayer`] is stored; pending
//!    requests are deleted on verification or invalidation, never on mere
//!    read.
//!
//! ## Backends
//! - [`DisabledLinkRegistry`]: linking off; every operation fails fast
//! - [`MemoryLinkRegistry`]: explicit single-process component
//! - [`SqliteLinkRegistry`]: durable store with the uniqueness constraint
//! - [`GlobalLinkRegistry`]: remote lookup service + optional local store

pub mod disabled;
pub mod global;
pub mod memory;
pub mod sqlite;

pub use disabled::DisabledLinkRegistry;
pub use global::{GlobalLinkRegistry, RemoteLinkService};
pub use memory::MemoryLinkRegistry;
pub use sqlite::SqliteLinkRegistry;

use crate::config::LinkingConfig;
use crate::error::{constants, GatepassError, Result};
use crate::identity::LinkedPlayer;
use crate::utils::time::epoch_seconds;
use async_trait::async_trait;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Length of a generated verification code
pub const LINK_CODE_LENGTH: usize = 6;

/// Code alphabet: 32 unambiguous symbols (no I/O/0/1). The length divides
/// 256, so reducing a random byte modulo the alphabet stays uniform.
const CODE_CHARSET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a fixed-length verification code from the OS secure source.
pub fn generate_link_code() -> String {
    let mut raw = [0u8; LINK_CODE_LENGTH];
    OsRng.fill_bytes(&mut raw);
    raw.iter()
        .map(|byte| CODE_CHARSET[*byte as usize % CODE_CHARSET.len()] as char)
        .collect()
}

/// A pending, single-use, code-protected proposal to associate two
/// identities. At least one identity half is present at creation; the
/// other is completed at verification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub java_unique_id: Option<Uuid>,
    pub java_username: String,
    pub bedrock_unique_id: Option<Uuid>,
    pub bedrock_username: String,
    pub link_code: String,
    /// Unix time (seconds) the request was created
    pub requested_at: u64,
}

impl LinkRequest {
    /// Create a Java-initiated request, stamped with the current time.
    pub fn new_java(
        java_unique_id: Uuid,
        java_username: impl Into<String>,
        bedrock_username: impl Into<String>,
        link_code: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            java_unique_id: Some(java_unique_id),
            java_username: java_username.into(),
            bedrock_unique_id: None,
            bedrock_username: bedrock_username.into(),
            link_code: link_code.into(),
            requested_at: epoch_seconds()?,
        })
    }

    /// Whether more than `timeout` has passed since the request was made.
    /// A clock before the epoch counts as expired rather than panicking.
    pub fn is_expired(&self, timeout: Duration) -> bool {
        match epoch_seconds() {
            Ok(now) => now.saturating_sub(self.requested_at) > timeout.as_secs(),
            Err(_) => true,
        }
    }
}

/// Outcome of verifying a link request. These are results surfaced to the
/// requesting user, not errors: the flow continues and allows retry via a
/// fresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkVerifyOutcome {
    /// The link was created and stored.
    Completed(LinkedPlayer),
    /// No pending request matched the given usernames.
    NoSuchRequest,
    /// A request matched and was consumed, but the code was wrong.
    InvalidCode,
    /// A request matched and was consumed, but had already expired.
    Expired,
}

/// Persistence contract for link requests and confirmed links.
///
/// All operations are asynchronous and safe under concurrent access from
/// multiple connecting clients; the one-pending-request-per-username
/// invariant is enforced by the storage layer, not an application lock.
/// Transient store failures surface once as `StoreUnavailable`: nothing
/// retries internally.
#[async_trait]
pub trait LinkRegistry: Send + Sync {
    /// Look up the confirmed link for a gateway identity.
    async fn fetch_link(&self, bedrock_id: Uuid) -> Result<Option<LinkedPlayer>>;

    /// Whether the given id (gateway or primary side) is linked.
    async fn is_linked(&self, id: Uuid) -> Result<bool>;

    /// Store a confirmed link. A new link replaces an existing one for the
    /// same gateway identity.
    async fn add_link(
        &self,
        java_unique_id: Uuid,
        java_username: &str,
        bedrock_id: Uuid,
    ) -> Result<LinkedPlayer>;

    /// Remove the link for the given id (either side). Unlinking an
    /// already-unlinked identity succeeds as a no-op.
    async fn unlink(&self, id: Uuid) -> Result<()>;

    /// Store a pending request, superseding any pending request by the
    /// same initiating username (atomic upsert).
    async fn create_request(&self, request: LinkRequest) -> Result<()>;

    /// Find the pending request matching both usernames and delete it.
    /// Pending requests are single-use: deletion happens on the lookup
    /// itself, before any code or expiry judgment.
    async fn resolve_and_consume(
        &self,
        java_username: &str,
        bedrock_username: &str,
    ) -> Result<Option<LinkRequest>>;

    /// Delete pending requests older than `max_age`, returning how many
    /// were purged.
    async fn sweep_expired(&self, max_age: Duration) -> Result<u64>;
}

/// The explicitly owned linking component: a registry plus the
/// configuration that governs it.
pub struct Linking {
    registry: Arc<dyn LinkRegistry>,
    enabled: bool,
    allow_create_requests: bool,
    code_timeout: Duration,
}

impl Linking {
    pub fn new(
        registry: Arc<dyn LinkRegistry>,
        enabled: bool,
        allow_create_requests: bool,
        code_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            enabled,
            allow_create_requests,
            code_timeout,
        }
    }

    pub fn from_config(config: &LinkingConfig, registry: Arc<dyn LinkRegistry>) -> Self {
        Self::new(
            registry,
            config.enabled,
            config.allow_create_requests,
            config.code_timeout,
        )
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn registry(&self) -> &Arc<dyn LinkRegistry> {
        &self.registry
    }

    /// Best-effort link lookup for the resolver. Disabled linking is not
    /// an error here: it simply means "no link".
    pub async fn fetch_link(&self, bedrock_id: Uuid) -> Result<Option<LinkedPlayer>> {
        if !self.enabled {
            return Ok(None);
        }
        self.registry.fetch_link(bedrock_id).await
    }

    pub async fn is_linked(&self, id: Uuid) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        self.registry.is_linked(id).await
    }

    /// Create (or supersede) a pending request and return its code.
    #[instrument(skip(self, java_unique_id))]
    pub async fn create_request(
        &self,
        java_unique_id: Uuid,
        java_username: &str,
        bedrock_username: &str,
    ) -> Result<String> {
        if !self.enabled {
            return Err(GatepassError::LinkingDisabled);
        }
        if !self.allow_create_requests {
            return Err(GatepassError::OperationUnavailable(
                "link request creation is not allowed on this instance".into(),
            ));
        }

        let code = generate_link_code();
        let request =
            LinkRequest::new_java(java_unique_id, java_username, bedrock_username, code.as_str())?;
        self.registry.create_request(request).await?;

        debug!(java_username, bedrock_username, "Link request created");
        Ok(code)
    }

    /// Verify a pending request from the Bedrock side.
    ///
    /// The matched request is consumed before the code and expiry are
    /// judged; order matters and is part of the observable contract.
    #[instrument(skip(self, bedrock_id, code))]
    pub async fn verify_request(
        &self,
        bedrock_id: Uuid,
        bedrock_username: &str,
        java_username: &str,
        code: &str,
    ) -> Result<LinkVerifyOutcome> {
        if !self.enabled {
            return Err(GatepassError::LinkingDisabled);
        }

        let Some(request) = self
            .registry
            .resolve_and_consume(java_username, bedrock_username)
            .await?
        else {
            return Ok(LinkVerifyOutcome::NoSuchRequest);
        };

        if request.link_code != code {
            debug!(java_username, "Link verification failed: wrong code");
            return Ok(LinkVerifyOutcome::InvalidCode);
        }
        if request.is_expired(self.code_timeout) {
            debug!(java_username, "Link verification failed: request expired");
            return Ok(LinkVerifyOutcome::Expired);
        }

        let java_unique_id = request.java_unique_id.ok_or_else(|| {
            GatepassError::StoreUnavailable(constants::ERR_REQUEST_NO_JAVA_HALF.into())
        })?;
        let linked = self
            .registry
            .add_link(java_unique_id, &request.java_username, bedrock_id)
            .await?;

        debug!(java_username, bedrock_username, "Link completed");
        Ok(LinkVerifyOutcome::Completed(linked))
    }

    pub async fn unlink(&self, id: Uuid) -> Result<()> {
        if !self.enabled {
            return Err(GatepassError::LinkingDisabled);
        }
        self.registry.unlink(id).await
    }

    /// Purge pending requests that outlived the configured code timeout.
    pub async fn sweep_expired(&self) -> Result<u64> {
        if !self.enabled {
            return Ok(0);
        }
        self.registry.sweep_expired(self.code_timeout).await
    }
}

/// Build the registry selected by the configuration.
pub async fn build_registry(config: &LinkingConfig) -> Result<Arc<dyn LinkRegistry>> {
    if !config.enabled {
        return Ok(Arc::new(DisabledLinkRegistry));
    }

    let local: Option<Arc<dyn LinkRegistry>> = match config.backend {
        LinkBackend::None => None,
        LinkBackend::Memory => Some(Arc::new(MemoryLinkRegistry::new())),
        LinkBackend::Sqlite => Some(Arc::new(
            SqliteLinkRegistry::connect(&config.database_path).await?,
        )),
    };

    if config.global.enabled {
        let remote = RemoteLinkService::new(config.global.lookup_url.clone());
        return Ok(Arc::new(GlobalLinkRegistry::new(remote, local)));
    }

    local.ok_or_else(|| {
        GatepassError::ConfigError(
            "linking is enabled but no backend is configured (set backend or enable global mode)"
                .into(),
        )
    })
}

/// Storage backend selector for the linking feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkBackend {
    /// No local storage (only valid together with global mode)
    None,
    /// In-process map, lost on restart
    Memory,
    /// Durable SQLite database
    #[default]
    Sqlite,
}
