//! Symmetric authenticated encryption codec (XChaCha20-Poly1305).
//!
//! Produces a single wire section laid out as `nonce || ciphertext`; the
//! Poly1305 tag makes any bit flip a decode failure rather than garbage
//! plaintext.

use crate::crypto::{ensure_section_count, Algorithm, DataCodec, KeyMaterial};
use crate::error::{GatepassError, Result};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand_core::{OsRng, RngCore};

/// XChaCha20 extended nonce length in bytes
const NONCE_LENGTH: usize = 24;

/// Symmetric AEAD codec
pub struct SymmetricCodec {
    cipher: XChaCha20Poly1305,
}

impl SymmetricCodec {
    /// Build the codec from symmetric key material.
    ///
    /// # Errors
    /// `AlgorithmMismatch` for foreign key material, `KeyHalfMissing` when
    /// the secret is absent.
    pub fn new(key: &KeyMaterial) -> Result<Self> {
        if key.algorithm() != Algorithm::Symmetric {
            return Err(GatepassError::AlgorithmMismatch {
                expected: Algorithm::Symmetric.name(),
                received: key.algorithm().name(),
            });
        }
        let secret = key.secret_bytes().ok_or(GatepassError::KeyHalfMissing {
            algorithm: Algorithm::Symmetric.name(),
            half: "secret",
        })?;
        Ok(Self {
            cipher: XChaCha20Poly1305::new(Key::from_slice(secret)),
        })
    }
}

impl DataCodec for SymmetricCodec {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Symmetric
    }

    fn encode(&self, plaintext: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut nonce = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| GatepassError::EncryptFailure)?;

        let mut section = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        section.extend_from_slice(&nonce);
        section.extend_from_slice(&ciphertext);
        Ok(vec![section])
    }

    fn decode(&self, sections: &[Vec<u8>]) -> Result<Vec<u8>> {
        ensure_section_count(1, "symmetric", sections)?;
        let section = &sections[0];
        if section.len() < NONCE_LENGTH {
            return Err(GatepassError::DecryptFailure);
        }

        let (nonce, ciphertext) = section.split_at(NONCE_LENGTH);
        self.cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| GatepassError::DecryptFailure)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn codec() -> SymmetricCodec {
        SymmetricCodec::new(&Algorithm::Symmetric.produce()).unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let codec = codec();
        let sections = codec.encode(b"hello world").unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(codec.decode(&sections).unwrap(), b"hello world");
    }

    #[test]
    fn test_nonces_are_fresh() {
        let codec = codec();
        let first = codec.encode(b"same input").unwrap();
        let second = codec.encode(b"same input").unwrap();
        assert_ne!(first[0], second[0]);
    }

    #[test]
    fn test_tamper_detected() {
        let codec = codec();
        let mut sections = codec.encode(b"important").unwrap();
        let last = sections[0].len() - 1;
        sections[0][last] ^= 0x01;
        assert!(matches!(
            codec.decode(&sections),
            Err(GatepassError::DecryptFailure)
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let encoder = codec();
        let decoder = codec();
        let sections = encoder.encode(b"secret").unwrap();
        assert!(decoder.decode(&sections).is_err());
    }

    #[test]
    fn test_truncated_section_fails() {
        let codec = codec();
        let sections = vec![vec![0u8; NONCE_LENGTH - 1]];
        assert!(matches!(
            codec.decode(&sections),
            Err(GatepassError::DecryptFailure)
        ));
    }
}
