//! # Cryptographic Core
//!
//! Key material handling, per-algorithm data codecs, and the transportable
//! envelope format.
//!
//! This module turns a plaintext identity payload into a hostname-safe
//! string and back, given key material for one of three algorithms.
//!
//! ## Components
//! - **KeyMaterial**: symmetric secrets or asymmetric halves, independently storable
//! - **DataCodec**: one trait, three strategies selected by [`Algorithm`]
//! - **Envelope**: version/algorithm header + base64url-encoded codec sections
//!
//! ## Algorithms
//! ```text
//! [id 0] symmetric  XChaCha20-Poly1305 AEAD      -> [nonce || ciphertext]
//! [id 1] signature  Ed25519 sign + plaintext     -> [plaintext, signature]
//! [id 2] sealed     X25519 ECDH + XChaCha20-1305 -> [ephemeral pub, nonce || ciphertext]
//! ```
//!
//! ## Security
//! - Tampering is detected as a decode failure, never returned as garbage
//! - Secret key halves are zeroized on drop (zeroize crate)
//! - All randomness is drawn from the operating system (`OsRng`)

pub mod envelope;
pub mod key;
pub mod sealed;
pub mod signature;
pub mod symmetric;

pub use envelope::{peek_version, EnvelopeCodec, ENVELOPE_VERSION, IDENTIFIER};
pub use key::{KeyHalf, KeyMaterial};
pub use sealed::SealedCodec;
pub use signature::SignatureCodec;
pub use symmetric::SymmetricCodec;

use crate::error::{GatepassError, Result};

/// Supported envelope algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Symmetric authenticated encryption (default)
    #[default]
    Symmetric,
    /// Asymmetric signature over plaintext (authenticated, not confidential)
    Signature,
    /// Asymmetric encryption (sealed box)
    Sealed,
}

impl Algorithm {
    /// Get the algorithm identifier byte for the envelope header
    pub fn id(self) -> u8 {
        match self {
            Algorithm::Symmetric => 0x00,
            Algorithm::Signature => 0x01,
            Algorithm::Sealed => 0x02,
        }
    }

    /// Resolve an algorithm from its identifier byte
    pub fn from_id(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Algorithm::Symmetric),
            0x01 => Some(Algorithm::Signature),
            0x02 => Some(Algorithm::Sealed),
            _ => None,
        }
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Symmetric => "symmetric",
            Algorithm::Signature => "signature",
            Algorithm::Sealed => "sealed",
        }
    }

    /// Resolve an algorithm by its name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "symmetric" => Some(Algorithm::Symmetric),
            "signature" => Some(Algorithm::Signature),
            "sealed" => Some(Algorithm::Sealed),
            _ => None,
        }
    }
}

/// A data codec turns a plaintext buffer into one or more wire sections and
/// back, given key material.
///
/// Codec instances are pure and stateless once constructed: encoding and
/// decoding take `&self` and are safe for unrestricted parallel invocation.
/// The round-trip law holds for every implementation: for any byte buffer
/// `x` and a valid key (pair), `decode(encode(x)) == x`.
pub trait DataCodec: Send + Sync {
    /// The algorithm this codec implements
    fn algorithm(&self) -> Algorithm;

    /// Encode a plaintext buffer into wire sections
    fn encode(&self, plaintext: &[u8]) -> Result<Vec<Vec<u8>>>;

    /// Decode wire sections back into the plaintext buffer.
    ///
    /// # Errors
    /// `DecryptFailure` for tampered or corrupted ciphertext,
    /// `InvalidSignature` for a failed signature check: unverified bytes
    /// are never returned.
    fn decode(&self, sections: &[Vec<u8>]) -> Result<Vec<u8>>;
}

/// Build the codec for the key's algorithm (strategy dispatch by tag).
///
/// # Errors
/// Propagates construction errors: malformed key halves (`BadKeyFormat`)
/// or, for codecs that cannot operate at all without a given half, a
/// `KeyHalfMissing` error.
pub fn codec_for(key: &KeyMaterial) -> Result<Box<dyn DataCodec>> {
    match key.algorithm() {
        Algorithm::Symmetric => Ok(Box::new(SymmetricCodec::new(key)?)),
        Algorithm::Signature => Ok(Box::new(SignatureCodec::new(key)?)),
        Algorithm::Sealed => Ok(Box::new(SealedCodec::new(key)?)),
    }
}

/// Validate that a codec received the number of sections it expects.
pub(crate) fn ensure_section_count(
    expected: usize,
    name: &'static str,
    sections: &[Vec<u8>],
) -> Result<()> {
    if sections.len() != expected {
        return Err(GatepassError::InvalidRecord(format!(
            "the {name} codec expects {expected} data section(s), got {}",
            sections.len()
        )));
    }
    Ok(())
}
