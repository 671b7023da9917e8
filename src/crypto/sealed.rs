//! Asymmetric encryption codec (X25519 sealed box).
//!
//! Encoding generates an ephemeral X25519 key pair, performs a
//! Diffie-Hellman exchange against the recipient's static public key, and
//! seals the plaintext with XChaCha20-Poly1305 under a SHA-256-derived key.
//! Sections are `[ephemeral public key, nonce || ciphertext]`; anyone with
//! the public half can encode, only the holder of the static secret half
//! can decode.
//!
//! The key derivation binds both public keys with labeled inputs so a
//! transplanted ephemeral key cannot be replayed against a different
//! recipient.

use crate::crypto::key::to_array;
use crate::crypto::{ensure_section_count, Algorithm, DataCodec, KeyMaterial};
use crate::error::{GatepassError, Result};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use x25519_dalek::{EphemeralSecret, PublicKey, SharedSecret, StaticSecret};

const NONCE_LENGTH: usize = 24;

/// X25519 + XChaCha20-Poly1305 sealed-box codec
pub struct SealedCodec {
    public: PublicKey,
    secret: Option<StaticSecret>,
}

impl SealedCodec {
    /// Build the codec from sealed key material.
    ///
    /// The public half (always present: derived from the secret when not
    /// stored separately) enables encoding; the secret half enables
    /// decoding.
    pub fn new(key: &KeyMaterial) -> Result<Self> {
        if key.algorithm() != Algorithm::Sealed {
            return Err(GatepassError::AlgorithmMismatch {
                expected: Algorithm::Sealed.name(),
                received: key.algorithm().name(),
            });
        }

        let secret = key
            .secret_bytes()
            .map(|bytes| to_array(bytes).map(StaticSecret::from))
            .transpose()?;

        let public = key.public_bytes().ok_or(GatepassError::KeyHalfMissing {
            algorithm: Algorithm::Sealed.name(),
            half: "public",
        })?;
        let public = PublicKey::from(to_array(public)?);

        Ok(Self { public, secret })
    }
}

/// Derive the sealing key from a shared secret and both public keys
/// (labeled inputs for domain separation).
fn derive_sealing_key(
    shared_secret: &SharedSecret,
    ephemeral_public: &PublicKey,
    recipient_public: &PublicKey,
) -> [u8; 32] {
    let mut hasher = Sha256::new();

    hasher.update(shared_secret.as_bytes());

    hasher.update(b"ephemeral_public");
    hasher.update(ephemeral_public.as_bytes());
    hasher.update(b"recipient_public");
    hasher.update(recipient_public.as_bytes());

    hasher.finalize().into()
}

impl DataCodec for SealedCodec {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Sealed
    }

    fn encode(&self, plaintext: &[u8]) -> Result<Vec<Vec<u8>>> {
        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&self.public);

        let sealing_key = derive_sealing_key(&shared, &ephemeral_public, &self.public);
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&sealing_key));

        let mut nonce = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|_| GatepassError::EncryptFailure)?;

        let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        Ok(vec![ephemeral_public.as_bytes().to_vec(), sealed])
    }

    fn decode(&self, sections: &[Vec<u8>]) -> Result<Vec<u8>> {
        ensure_section_count(2, "sealed", sections)?;

        let secret = self.secret.as_ref().ok_or(GatepassError::KeyHalfMissing {
            algorithm: Algorithm::Sealed.name(),
            half: "secret",
        })?;

        let ephemeral_bytes: [u8; 32] = sections[0]
            .as_slice()
            .try_into()
            .map_err(|_| GatepassError::DecryptFailure)?;
        let ephemeral_public = PublicKey::from(ephemeral_bytes);

        let sealed = &sections[1];
        if sealed.len() < NONCE_LENGTH {
            return Err(GatepassError::DecryptFailure);
        }

        let shared = secret.diffie_hellman(&ephemeral_public);
        let sealing_key = derive_sealing_key(&shared, &ephemeral_public, &self.public);
        let cipher = XChaCha20Poly1305::new(Key::from_slice(&sealing_key));

        let (nonce, ciphertext) = sealed.split_at(NONCE_LENGTH);
        cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| GatepassError::DecryptFailure)
    }
}
