//! # Handshake Resolution
//!
//! Everything between a raw hostname string arriving on a login handshake
//! and a resolved connection (or a typed disconnect reason) leaving.
//!
//! ## Components
//! - **Hostname multiplexer**: isolates the embedded payload segment from
//!   proxy-appended forwarding fields sharing the same carrier field
//! - **Resolver**: the decrypt → validate → link-resolve state machine
//! - **Transport**: the capability seam host platforms implement to
//!   receive resolutions
//!
//! ## Control Flow
//! ```text
//! raw hostname -> multiplexer -> envelope.decode -> record.decode
//!              -> link lookup -> Accepted | Disconnected | NotParticipating
//! ```

pub mod hostname;
pub mod resolver;
pub mod transport;

pub use hostname::{separate_hostname, HostnameSeparation};
pub use resolver::{DisconnectReason, HandshakeResolver, Resolution};
pub use transport::{resolve_with, HandshakeOutcome, Transport};
