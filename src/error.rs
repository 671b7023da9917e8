//! # Error Types
//!
//! Comprehensive error handling for the handshake transport and linking core.
//!
//! This module defines all error variants that can occur while recovering an
//! embedded identity payload, from malformed key material to persistence
//! failures in the link registry.
//!
//! ## Error Categories
//! - **Recognition**: data that is not ours (`NotRecognized`) vs. data that is
//!   ours but from an unsupported protocol revision (`UnsupportedVersion`)
//! - **Cryptographic**: decryption, signature, and key-material failures
//! - **Structural**: identity-record field-count and field-format violations
//! - **Linking**: disabled feature, unavailable operations, store failures
//!
//! `NotRecognized` deserves a special note: it is how callers distinguish
//! "this connection does not use the protocol at all" (pass the hostname
//! through untouched) from "this connection tried and failed" (disconnect).
//!
//! All errors implement `std::error::Error` for interoperability.

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
/// Static strings are borrowed, avoiding heap allocations for common error cases.
pub mod constants {
    /// Key material errors
    pub const ERR_BAD_KEY_LENGTH: &str = "Key has the wrong length";
    pub const ERR_KEY_NOT_BASE64: &str = "Stored key is not valid base64";
    pub const ERR_NO_KEY_FILES: &str = "No key files found in key directory";
    pub const ERR_SYMMETRIC_NO_PUBLIC: &str = "Symmetric keys have no public half";

    /// Linking errors
    pub const ERR_GLOBAL_READ_ONLY: &str =
        "Linking writes are unavailable in global mode without a local backend";
    pub const ERR_REQUEST_NO_JAVA_HALF: &str = "Link request is missing its Java identity half";

    /// Time errors
    pub const ERR_SYSTEM_TIME: &str = "System time error: time went backwards";

    /// User-facing disconnect messages
    pub const KICK_UNSUPPORTED_VERSION: &str =
        "Your proxy speaks an unsupported revision of the gateway protocol";
    pub const KICK_INVALID_DATA: &str = "Invalid gateway handshake data";
    pub const KICK_INVALID_FIELD_COUNT: &str =
        "Gateway handshake data has an unexpected number of fields";
    pub const KICK_LINK_REQUIRED: &str =
        "You must link your account before joining this server";
}

// GatepassError is the primary error type for all core operations
#[derive(Error, Debug)]
pub enum GatepassError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not our data at all. Callers treat this as "pass
    /// through", never as a failed connection.
    #[error("data not recognized as an embedded payload")]
    NotRecognized,

    #[error("unsupported envelope version: expected {expected}, received {received}")]
    UnsupportedVersion { expected: u8, received: u8 },

    #[error("unknown algorithm id: {0}")]
    UnknownAlgorithm(u8),

    #[error("algorithm mismatch: codec handles {expected}, envelope carries {received}")]
    AlgorithmMismatch {
        expected: &'static str,
        received: &'static str,
    },

    #[error("bad key format: {0}")]
    BadKeyFormat(String),

    #[error("{algorithm} codec is missing the {half} key half")]
    KeyHalfMissing {
        algorithm: &'static str,
        half: &'static str,
    },

    #[error("encryption failed")]
    EncryptFailure,

    #[error("decryption failed")]
    DecryptFailure,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid field count: expected {expected}, got {actual}")]
    InvalidFieldCount { expected: usize, actual: usize },

    #[error("invalid identity record: {0}")]
    InvalidRecord(String),

    #[error("player linking is disabled")]
    LinkingDisabled,

    #[error("operation unavailable: {0}")]
    OperationUnavailable(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("custom error: {0}")]
    Custom(String),
}

/// Type alias for Results using GatepassError
pub type Result<T> = std::result::Result<T, GatepassError>;
