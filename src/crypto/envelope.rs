//! # Envelope Format
//!
//! The transportable string wrapper around a data codec's sections.
//!
//! ## Wire Format
//! ```text
//! ^GatePass^ <version char> <algorithm char> b64url(section 0) [ '!' b64url(section N) ]*
//! ```
//!
//! Version and algorithm are carried as single printable characters offset
//! by `0x3D`, keeping the whole envelope free of characters that are
//! illegal in a hostname field (in particular, no `NUL`).
//!
//! ## Recognition vs. Failure
//! Decoding distinguishes three situations that callers must treat
//! differently:
//! - the identifier prefix is absent → [`GatepassError::NotRecognized`]:
//!   the input is somebody else's data and passes through untouched
//! - the identifier matches but the version is not the supported one →
//!   [`GatepassError::UnsupportedVersion`] carrying both versions
//! - the identifier and version match but the payload will not decode →
//!   a cryptographic or structural failure

use crate::crypto::{Algorithm, DataCodec, KeyMaterial};
use crate::error::{GatepassError, Result};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;

/// Identifier prefix claiming a segment as ours
pub const IDENTIFIER: &str = "^GatePass^";

/// Current envelope version
pub const ENVELOPE_VERSION: u8 = 1;

/// Offset that maps version/algorithm numbers into printable ASCII ('=' and up)
const HEADER_OFFSET: u8 = 0x3D;

/// Separator between base64url-encoded codec sections
const SECTION_SEPARATOR: char = '!';

/// Probe a string for the envelope header and return its version.
///
/// Returns `None` when the identifier is absent or the version character is
/// below the header offset. This is the multiplexer's recognition test: it
/// deliberately checks only the header so that a recognized-but-corrupt
/// envelope still reaches [`EnvelopeCodec::decode`] and fails loudly there.
pub fn peek_version(data: &str) -> Option<u8> {
    let bytes = data.as_bytes();
    if bytes.len() < IDENTIFIER.len() + 2 {
        return None;
    }
    if &bytes[..IDENTIFIER.len()] != IDENTIFIER.as_bytes() {
        return None;
    }
    bytes[IDENTIFIER.len()].checked_sub(HEADER_OFFSET)
}

/// Envelope encoder/decoder bound to one configured data codec.
pub struct EnvelopeCodec {
    codec: Box<dyn DataCodec>,
}

impl EnvelopeCodec {
    /// Wrap an already-constructed data codec.
    pub fn new(codec: Box<dyn DataCodec>) -> Self {
        Self { codec }
    }

    /// Build the envelope codec for the key's algorithm.
    pub fn from_key(key: &KeyMaterial) -> Result<Self> {
        Ok(Self::new(crate::crypto::codec_for(key)?))
    }

    /// The algorithm this envelope encodes and accepts.
    pub fn algorithm(&self) -> Algorithm {
        self.codec.algorithm()
    }

    /// Encode a plaintext buffer into a hostname-safe envelope string.
    pub fn encode(&self, plaintext: &[u8]) -> Result<String> {
        let sections = self.codec.encode(plaintext)?;

        let mut out = String::with_capacity(IDENTIFIER.len() + 2 + sections.len() * 32);
        out.push_str(IDENTIFIER);
        out.push((HEADER_OFFSET + ENVELOPE_VERSION) as char);
        out.push((HEADER_OFFSET + self.codec.algorithm().id()) as char);

        for (index, section) in sections.iter().enumerate() {
            if index > 0 {
                out.push(SECTION_SEPARATOR);
            }
            out.push_str(&URL_SAFE.encode(section));
        }
        Ok(out)
    }

    /// Convenience wrapper encoding a UTF-8 string payload.
    pub fn encode_str(&self, plaintext: &str) -> Result<String> {
        self.encode(plaintext.as_bytes())
    }

    /// Decode an envelope string back into the plaintext buffer.
    ///
    /// # Errors
    /// - `NotRecognized` when the identifier prefix is absent
    /// - `UnsupportedVersion` for a foreign protocol revision
    /// - `UnknownAlgorithm` / `AlgorithmMismatch` for a bad algorithm tag
    /// - `DecryptFailure` / `InvalidSignature` from the inner codec
    pub fn decode(&self, data: &str) -> Result<Vec<u8>> {
        let bytes = data.as_bytes();
        if bytes.len() < IDENTIFIER.len() + 2 || &bytes[..IDENTIFIER.len()] != IDENTIFIER.as_bytes()
        {
            return Err(GatepassError::NotRecognized);
        }

        let version = bytes[IDENTIFIER.len()]
            .checked_sub(HEADER_OFFSET)
            .ok_or(GatepassError::NotRecognized)?;
        if version != ENVELOPE_VERSION {
            return Err(GatepassError::UnsupportedVersion {
                expected: ENVELOPE_VERSION,
                received: version,
            });
        }

        let algorithm_byte = bytes[IDENTIFIER.len() + 1];
        let algorithm = algorithm_byte
            .checked_sub(HEADER_OFFSET)
            .and_then(Algorithm::from_id)
            .ok_or(GatepassError::UnknownAlgorithm(
                algorithm_byte.wrapping_sub(HEADER_OFFSET),
            ))?;
        if algorithm != self.codec.algorithm() {
            return Err(GatepassError::AlgorithmMismatch {
                expected: self.codec.algorithm().name(),
                received: algorithm.name(),
            });
        }

        let body = &data[IDENTIFIER.len() + 2..];
        let sections = body
            .split(SECTION_SEPARATOR)
            .map(|section| {
                URL_SAFE
                    .decode(section)
                    .map_err(|_| GatepassError::DecryptFailure)
            })
            .collect::<Result<Vec<_>>>()?;

        self.codec.decode(&sections)
    }

    /// Decode an envelope whose payload is a UTF-8 string.
    pub fn decode_to_string(&self, data: &str) -> Result<String> {
        let plaintext = self.decode(data)?;
        String::from_utf8(plaintext).map_err(|_| GatepassError::DecryptFailure)
    }
}
