//! Asymmetric sign-and-plaintext codec (Ed25519).
//!
//! The data is not confidential, only authenticated: encoding emits
//! `[plaintext, signature]` and decoding verifies the signature over the
//! plaintext before releasing it. Verification failure raises
//! `InvalidSignature`: unverified bytes are never returned.

use crate::crypto::key::to_array;
use crate::crypto::{ensure_section_count, Algorithm, DataCodec, KeyMaterial};
use crate::error::{GatepassError, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// Ed25519 signature codec
pub struct SignatureCodec {
    signing: Option<SigningKey>,
    verifying: VerifyingKey,
}

impl SignatureCodec {
    /// Build the codec from signature key material.
    ///
    /// A secret half enables signing; the public half (always present -
    /// derived from the secret when not stored separately) enables
    /// verification.
    ///
    /// # Errors
    /// `AlgorithmMismatch` for foreign key material, `BadKeyFormat` for
    /// unparsable halves.
    pub fn new(key: &KeyMaterial) -> Result<Self> {
        if key.algorithm() != Algorithm::Signature {
            return Err(GatepassError::AlgorithmMismatch {
                expected: Algorithm::Signature.name(),
                received: key.algorithm().name(),
            });
        }

        let signing = key
            .secret_bytes()
            .map(|bytes| to_array(bytes).map(|seed| SigningKey::from_bytes(&seed)))
            .transpose()?;

        let public = key.public_bytes().ok_or(GatepassError::KeyHalfMissing {
            algorithm: Algorithm::Signature.name(),
            half: "public",
        })?;
        let verifying = VerifyingKey::from_bytes(&to_array(public)?)
            .map_err(|e| GatepassError::BadKeyFormat(format!("invalid verifying key: {e}")))?;

        Ok(Self { signing, verifying })
    }

    /// Build a verify-only codec, rejecting key material that carries a
    /// secret half.
    pub fn verifier(key: &KeyMaterial) -> Result<Self> {
        let codec = Self::new(key)?;
        if codec.signing.is_some() {
            return Err(GatepassError::BadKeyFormat(
                "verifier built with a secret key half".into(),
            ));
        }
        Ok(codec)
    }
}

impl DataCodec for SignatureCodec {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Signature
    }

    fn encode(&self, plaintext: &[u8]) -> Result<Vec<Vec<u8>>> {
        let signing = self
            .signing
            .as_ref()
            .ok_or(GatepassError::KeyHalfMissing {
                algorithm: Algorithm::Signature.name(),
                half: "secret",
            })?;
        let signature = signing.sign(plaintext);
        Ok(vec![plaintext.to_vec(), signature.to_bytes().to_vec()])
    }

    fn decode(&self, sections: &[Vec<u8>]) -> Result<Vec<u8>> {
        ensure_section_count(2, "signature", sections)?;
        let plaintext = &sections[0];
        let signature =
            Signature::from_slice(&sections[1]).map_err(|_| GatepassError::InvalidSignature)?;

        self.verifying
            .verify(plaintext, &signature)
            .map_err(|_| GatepassError::InvalidSignature)?;
        Ok(plaintext.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let codec = SignatureCodec::new(&Algorithm::Signature.produce()).unwrap();
        let sections = codec.encode(b"attested data").unwrap();
        assert_eq!(sections.len(), 2);
        // the first section is the plaintext itself, unencrypted
        assert_eq!(sections[0], b"attested data");
        assert_eq!(codec.decode(&sections).unwrap(), b"attested data");
    }

    #[test]
    fn test_tampered_plaintext_rejected() {
        let codec = SignatureCodec::new(&Algorithm::Signature.produce()).unwrap();
        let mut sections = codec.encode(b"attested data").unwrap();
        sections[0][0] ^= 0x01;
        assert!(matches!(
            codec.decode(&sections),
            Err(GatepassError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = SignatureCodec::new(&Algorithm::Signature.produce()).unwrap();
        let mut sections = codec.encode(b"attested data").unwrap();
        sections[1][10] ^= 0x01;
        assert!(matches!(
            codec.decode(&sections),
            Err(GatepassError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_only_cannot_sign() {
        let key = Algorithm::Signature.produce().public_only().unwrap();
        let codec = SignatureCodec::verifier(&key).unwrap();
        assert!(matches!(
            codec.encode(b"data"),
            Err(GatepassError::KeyHalfMissing { half: "secret", .. })
        ));
    }

    #[test]
    fn test_verify_only_still_verifies() {
        let key = Algorithm::Signature.produce();
        let signer = SignatureCodec::new(&key).unwrap();
        let sections = signer.encode(b"data").unwrap();

        let verifier = SignatureCodec::verifier(&key.public_only().unwrap()).unwrap();
        assert_eq!(verifier.decode(&sections).unwrap(), b"data");
    }

    #[test]
    fn test_foreign_key_rejected() {
        let result = SignatureCodec::new(&Algorithm::Symmetric.produce());
        assert!(matches!(
            result,
            Err(GatepassError::AlgorithmMismatch { .. })
        ));
    }
}
