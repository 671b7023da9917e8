//! Transport capability seam.
//!
//! The core never touches a host runtime's internals. A platform
//! integration implements [`Transport`] over its own connection type and
//! [`resolve_with`] drives one handshake through it: deliver the resolved
//! connection to the session, kick with a reason, or leave the handshake
//! untouched for non-participating clients.

use crate::handshake::resolver::{DisconnectReason, HandshakeResolver, Resolution};
use crate::session::Connection;
use tracing::info;

/// Capabilities a host platform exposes to the resolver.
pub trait Transport {
    /// The raw hostname field from the login handshake.
    fn raw_hostname(&self) -> &str;

    /// Hand the resolved connection to the session layer.
    fn deliver(&mut self, connection: Connection);

    /// Kick the connection with a user-facing reason.
    fn disconnect(&mut self, reason: &DisconnectReason);
}

/// What [`resolve_with`] did to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Non-participating client; nothing was applied.
    Ignored,
    /// The connection was delivered to the session.
    Delivered,
    /// The connection was disconnected with a reason.
    Rejected,
}

/// Resolve one handshake and apply the resolution to the transport.
pub async fn resolve_with<T: Transport>(
    resolver: &HandshakeResolver,
    transport: &mut T,
) -> HandshakeOutcome {
    match resolver.resolve(transport.raw_hostname()).await {
        Resolution::NotParticipating => HandshakeOutcome::Ignored,
        Resolution::Accepted(connection) => {
            transport.deliver(*connection);
            HandshakeOutcome::Delivered
        }
        Resolution::Disconnected { reason, cause } => {
            info!(%reason, ?cause, "Rejecting handshake");
            transport.disconnect(&reason);
            HandshakeOutcome::Rejected
        }
    }
}
