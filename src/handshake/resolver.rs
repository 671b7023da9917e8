//! # Handshake Resolver
//!
//! The state machine that takes a raw hostname and produces a resolved
//! [`Connection`] or a typed disconnect reason.
//!
//! ## States
//! ```text
//! Start -> Extracted -> Decrypted -> LengthValidated -> LinkResolved
//!       -> Accepted | Disconnected
//! ```
//!
//! Failing to find a payload segment is **not** an error: the client is
//! simply not participating and the handshake proceeds unmodified.
//! Transport-layer failures (wrong version, tampered data, bad field
//! count) disconnect with one user-facing reason each, carrying the raw
//! cause for logging. A link-registry failure degrades to "no link": the
//! lookup is best-effort and never a hard dependency for connecting.
//!
//! Per-connection state lives entirely in the resolution call; the
//! resolver itself is shared and immutable.

use crate::crypto::EnvelopeCodec;
use crate::error::{constants, GatepassError};
use crate::handshake::hostname::separate_hostname;
use crate::identity::IdentityRecord;
use crate::link::Linking;
use crate::session::Connection;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// The single user-facing reason attached to a rejected handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    UnsupportedVersion { expected: u8, received: u8 },
    InvalidData,
    InvalidFieldCount { expected: usize, actual: usize },
    LinkRequired,
}

impl DisconnectReason {
    /// The message shown to the disconnected user.
    pub fn user_message(&self) -> String {
        match self {
            DisconnectReason::UnsupportedVersion { expected, received } => format!(
                "{} (server speaks {expected}, client sent {received})",
                constants::KICK_UNSUPPORTED_VERSION
            ),
            DisconnectReason::InvalidData => constants::KICK_INVALID_DATA.into(),
            DisconnectReason::InvalidFieldCount { expected, actual } => format!(
                "{} (expected {expected}, got {actual})",
                constants::KICK_INVALID_FIELD_COUNT
            ),
            DisconnectReason::LinkRequired => constants::KICK_LINK_REQUIRED.into(),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// Outcome of resolving one handshake.
#[derive(Debug)]
pub enum Resolution {
    /// No payload segment found (or not ours): the handshake proceeds
    /// unmodified and the hostname passes through untouched.
    NotParticipating,
    /// The identity decoded and validated; the connection is ready for
    /// delivery to the session.
    Accepted(Box<Connection>),
    /// The handshake is rejected with exactly one user-facing reason; the
    /// raw cause is carried for logging only.
    Disconnected {
        reason: DisconnectReason,
        cause: Option<GatepassError>,
    },
}

impl Resolution {
    fn disconnect(reason: DisconnectReason, cause: GatepassError) -> Self {
        Resolution::Disconnected {
            reason,
            cause: Some(cause),
        }
    }
}

/// Orchestrates envelope decoding, record validation, and link resolution.
pub struct HandshakeResolver {
    envelope: EnvelopeCodec,
    linking: Arc<Linking>,
    require_link: bool,
}

impl HandshakeResolver {
    pub fn new(envelope: EnvelopeCodec, linking: Arc<Linking>, require_link: bool) -> Self {
        Self {
            envelope,
            linking,
            require_link,
        }
    }

    /// Resolve one handshake. Exactly one resolution is produced per
    /// connection; nothing is retried.
    #[instrument(skip(self, raw_hostname))]
    pub async fn resolve(&self, raw_hostname: &str) -> Resolution {
        // Start -> Extracted
        let separation = separate_hostname(raw_hostname);
        let Some(payload) = separation.payload() else {
            return Resolution::NotParticipating;
        };

        // Extracted -> Decrypted
        let decrypted = match self.envelope.decode_to_string(payload) {
            Ok(plaintext) => plaintext,
            Err(GatepassError::NotRecognized) => return Resolution::NotParticipating,
            Err(cause @ GatepassError::UnsupportedVersion { expected, received }) => {
                return Resolution::disconnect(
                    DisconnectReason::UnsupportedVersion { expected, received },
                    cause,
                );
            }
            Err(cause) => {
                debug!(error = %cause, "Embedded payload failed to decode");
                return Resolution::disconnect(DisconnectReason::InvalidData, cause);
            }
        };

        // Decrypted -> LengthValidated
        let record = match IdentityRecord::decode(&decrypted) {
            Ok(record) => record,
            Err(cause @ GatepassError::InvalidFieldCount { expected, actual }) => {
                return Resolution::disconnect(
                    DisconnectReason::InvalidFieldCount { expected, actual },
                    cause,
                );
            }
            Err(cause) => {
                debug!(error = %cause, "Identity record failed to parse");
                return Resolution::disconnect(DisconnectReason::InvalidData, cause);
            }
        };

        // LengthValidated -> LinkResolved
        let linked_player = match record.linked_player.clone() {
            // an upstream proxy already resolved the link; use it as-is
            Some(linked) => Some(linked),
            None => match self.linking.fetch_link(record.bedrock_uuid()).await {
                Ok(linked) => linked,
                Err(error) => {
                    warn!(
                        xuid = record.xuid,
                        %error,
                        "Link lookup failed, continuing without a link"
                    );
                    None
                }
            },
        };

        // LinkResolved -> Accepted | Disconnected
        if self.require_link && linked_player.is_none() {
            return Resolution::Disconnected {
                reason: DisconnectReason::LinkRequired,
                cause: None,
            };
        }

        debug!(
            username = %record.username,
            xuid = record.xuid,
            linked = linked_player.is_some(),
            "Handshake resolved"
        );
        Resolution::Accepted(Box::new(Connection::new(
            record,
            linked_player,
            separation.clean_hostname(),
        )))
    }
}
