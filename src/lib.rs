//! # gatepass
//!
//! Handshake-embedded identity transport and account linking for
//! gateway-translated clients.
//!
//! A secondary client population reaches a primary server ecosystem
//! through a gateway translator that has no native account there. The
//! gateway smuggles a signed or encrypted identity payload inside the
//! free-form hostname field of the primary login handshake; this crate is
//! the receiving side (and, for proxies, the encoding side) of that
//! channel.
//!
//! ## Layers
//! - [`crypto`]: key material, per-algorithm data codecs, and the
//!   versioned envelope string format
//! - [`identity`]: the structured identity record and confirmed links
//! - [`handshake`]: hostname demultiplexing and the resolution state
//!   machine
//! - [`link`]: the request/verify/expire account-linking protocol and its
//!   persistence backends
//! - [`session`]: the registry of live, resolved connections
//!
//! ## Example
//! ```no_run
//! use gatepass::crypto::{Algorithm, EnvelopeCodec};
//! use gatepass::handshake::HandshakeResolver;
//! use gatepass::link::{build_registry, Linking};
//! use gatepass::config::GatepassConfig;
//! use std::sync::Arc;
//!
//! # async fn run() -> gatepass::Result<()> {
//! let config = GatepassConfig::from_file("gatepass.toml")?;
//! config.validate_strict()?;
//!
//! let key = gatepass::crypto::KeyMaterial::load_from_dir(
//!     config.key.algorithm()?,
//!     &config.key.directory,
//! )?;
//! let registry = build_registry(&config.linking).await?;
//! let linking = Arc::new(Linking::from_config(&config.linking, registry));
//!
//! let resolver = HandshakeResolver::new(
//!     EnvelopeCodec::from_key(&key)?,
//!     linking,
//!     config.linking.require_link,
//! );
//!
//! match resolver.resolve("play.example.com\0^GatePass^...").await {
//!     gatepass::handshake::Resolution::Accepted(connection) => { /* deliver */ }
//!     gatepass::handshake::Resolution::Disconnected { reason, .. } => { /* kick */ }
//!     gatepass::handshake::Resolution::NotParticipating => { /* pass through */ }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod identity;
pub mod link;
pub mod session;
pub mod utils;

pub use error::{GatepassError, Result};
