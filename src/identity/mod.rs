//! # Identity Payload
//!
//! The structured identity record smuggled through the handshake, plus the
//! confirmed-link association type.
//!
//! ## Components
//! - **IdentityRecord**: fixed-field, NUL-delimited identity payload with a
//!   self-describing field count used as a tamper/version check
//! - **LinkedPlayer**: a confirmed association between a gateway identity
//!   and a primary-ecosystem identity
//!
//! Encoding here is purely structural; all cryptography is applied by the
//! envelope layer above it.

pub mod linked;
pub mod record;

pub use linked::{uuid_to_xuid, xuid_to_uuid, LinkedPlayer};
pub use record::{DeviceOs, IdentityRecord, InputMode, UiProfile};
