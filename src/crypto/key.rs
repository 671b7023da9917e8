//! # Key Material
//!
//! Generation, validation, and durable storage of codec keys.
//!
//! A [`KeyMaterial`] value carries an algorithm tag plus up to two raw key
//! halves. Symmetric keys are a single secret; asymmetric keys are a
//! (public, secret) pair where either half may be absent: a verify-only
//! deployment loads just the public half, a sign-only deployment just the
//! secret half. When only the secret half of an asymmetric key is present,
//! the public half is derived from it.
//!
//! ## Storage Format
//! Each half is stored as a single-line base64 file inside the key
//! directory: `key.secret` and (asymmetric only) `key.pub`. Malformed
//! stored bytes surface as `BadKeyFormat`, never as a crash.

use crate::crypto::Algorithm;
use crate::error::{constants, GatepassError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand_core::{OsRng, RngCore};
use std::fs;
use std::path::Path;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length in bytes of a symmetric secret
pub const SYMMETRIC_KEY_LENGTH: usize = 32;
/// Length in bytes of each asymmetric key half (Ed25519 and X25519)
pub const ASYMMETRIC_KEY_LENGTH: usize = 32;

/// File name of the stored secret half
pub const SECRET_KEY_FILE: &str = "key.secret";
/// File name of the stored public half
pub const PUBLIC_KEY_FILE: &str = "key.pub";

/// Which half of a key pair a storage or codec operation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHalf {
    Public,
    Secret,
}

/// Opaque key bytes plus an algorithm tag.
///
/// The secret half is zeroized when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    #[zeroize(skip)]
    algorithm: Algorithm,
    #[zeroize(skip)]
    public: Option<Vec<u8>>,
    secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // secret bytes intentionally not printed
        f.debug_struct("KeyMaterial")
            .field("algorithm", &self.algorithm)
            .field("has_public", &self.public.is_some())
            .field("has_secret", &self.secret.is_some())
            .finish()
    }
}

impl Algorithm {
    /// Generate fresh key material for this algorithm.
    pub fn produce(self) -> KeyMaterial {
        let mut secret = vec![0u8; SYMMETRIC_KEY_LENGTH];
        OsRng.fill_bytes(&mut secret);

        match self {
            Algorithm::Symmetric => KeyMaterial {
                algorithm: self,
                public: None,
                secret: Some(secret),
            },
            Algorithm::Signature => {
                let mut seed = [0u8; ASYMMETRIC_KEY_LENGTH];
                seed.copy_from_slice(&secret);
                let signing = SigningKey::from_bytes(&seed);
                let public = signing.verifying_key().to_bytes().to_vec();
                seed.zeroize();
                KeyMaterial {
                    algorithm: self,
                    public: Some(public),
                    secret: Some(secret),
                }
            }
            Algorithm::Sealed => {
                let mut seed = [0u8; ASYMMETRIC_KEY_LENGTH];
                seed.copy_from_slice(&secret);
                let static_secret = StaticSecret::from(seed);
                let public = PublicKey::from(&static_secret).as_bytes().to_vec();
                seed.zeroize();
                KeyMaterial {
                    algorithm: self,
                    public: Some(public),
                    secret: Some(secret),
                }
            }
        }
    }
}

impl KeyMaterial {
    /// Assemble key material from raw halves, validating lengths and (for
    /// asymmetric public halves) that the bytes parse as a valid key.
    ///
    /// At least one half must be present. For asymmetric algorithms a
    /// missing public half is derived from the secret half.
    ///
    /// # Errors
    /// `BadKeyFormat` for wrong lengths, unparsable public keys, a public
    /// half on a symmetric key, or no halves at all.
    pub fn from_halves(
        algorithm: Algorithm,
        public: Option<Vec<u8>>,
        secret: Option<Vec<u8>>,
    ) -> Result<Self> {
        if public.is_none() && secret.is_none() {
            return Err(GatepassError::BadKeyFormat(
                constants::ERR_NO_KEY_FILES.into(),
            ));
        }

        if let Some(ref secret) = secret {
            let expected = match algorithm {
                Algorithm::Symmetric => SYMMETRIC_KEY_LENGTH,
                Algorithm::Signature | Algorithm::Sealed => ASYMMETRIC_KEY_LENGTH,
            };
            if secret.len() != expected {
                return Err(GatepassError::BadKeyFormat(format!(
                    "{}: expected {expected} bytes, got {}",
                    constants::ERR_BAD_KEY_LENGTH,
                    secret.len()
                )));
            }
        }

        let public = match algorithm {
            Algorithm::Symmetric => {
                if public.is_some() {
                    return Err(GatepassError::BadKeyFormat(
                        constants::ERR_SYMMETRIC_NO_PUBLIC.into(),
                    ));
                }
                None
            }
            Algorithm::Signature => {
                let public = match (public, &secret) {
                    (Some(public), _) => public,
                    (None, Some(secret)) => {
                        let signing = SigningKey::from_bytes(&to_array(secret)?);
                        signing.verifying_key().to_bytes().to_vec()
                    }
                    (None, None) => unreachable!("checked above"),
                };
                // a signature public half must be a valid curve point
                VerifyingKey::from_bytes(&to_array(&public)?).map_err(|e| {
                    GatepassError::BadKeyFormat(format!("invalid verifying key: {e}"))
                })?;
                Some(public)
            }
            Algorithm::Sealed => {
                let public = match (public, &secret) {
                    (Some(public), _) => public,
                    (None, Some(secret)) => {
                        let static_secret = StaticSecret::from(to_array(secret)?);
                        PublicKey::from(&static_secret).as_bytes().to_vec()
                    }
                    (None, None) => unreachable!("checked above"),
                };
                to_array(&public)?;
                Some(public)
            }
        };

        Ok(Self {
            algorithm,
            public,
            secret,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn has_public(&self) -> bool {
        self.public.is_some()
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub fn public_bytes(&self) -> Option<&[u8]> {
        self.public.as_deref()
    }

    pub fn secret_bytes(&self) -> Option<&[u8]> {
        self.secret.as_deref()
    }

    /// Encode one half for durable storage.
    ///
    /// # Errors
    /// `KeyHalfMissing` when the requested half is absent.
    pub fn encode(&self, half: KeyHalf) -> Result<String> {
        let bytes = match half {
            KeyHalf::Public => self.public.as_deref(),
            KeyHalf::Secret => self.secret.as_deref(),
        };
        let bytes = bytes.ok_or(GatepassError::KeyHalfMissing {
            algorithm: self.algorithm.name(),
            half: half_name(half),
        })?;
        Ok(STANDARD.encode(bytes))
    }

    /// Decode a single stored half into key material.
    ///
    /// # Errors
    /// `BadKeyFormat` for non-base64 input or invalid key bytes.
    pub fn decode(algorithm: Algorithm, stored: &str, half: KeyHalf) -> Result<Self> {
        let bytes = STANDARD.decode(stored.trim()).map_err(|e| {
            GatepassError::BadKeyFormat(format!("{}: {e}", constants::ERR_KEY_NOT_BASE64))
        })?;
        match half {
            KeyHalf::Public => Self::from_halves(algorithm, Some(bytes), None),
            KeyHalf::Secret => Self::from_halves(algorithm, None, Some(bytes)),
        }
    }

    /// Write the present halves into `dir` (`key.secret` / `key.pub`).
    pub fn save_to_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        if self.secret.is_some() {
            fs::write(dir.join(SECRET_KEY_FILE), self.encode(KeyHalf::Secret)?)?;
        }
        if self.public.is_some() {
            fs::write(dir.join(PUBLIC_KEY_FILE), self.encode(KeyHalf::Public)?)?;
        }
        Ok(())
    }

    /// Load whichever halves exist in `dir`.
    ///
    /// # Errors
    /// `BadKeyFormat` when neither key file exists or a file is malformed.
    pub fn load_from_dir(algorithm: Algorithm, dir: &Path) -> Result<Self> {
        let read_half = |name: &str| -> Result<Option<String>> {
            let path = dir.join(name);
            if path.exists() {
                Ok(Some(fs::read_to_string(path)?))
            } else {
                Ok(None)
            }
        };

        let secret = read_half(SECRET_KEY_FILE)?;
        let public = read_half(PUBLIC_KEY_FILE)?;

        let decode = |stored: Option<String>| -> Result<Option<Vec<u8>>> {
            match stored {
                Some(text) => {
                    let bytes = STANDARD.decode(text.trim()).map_err(|e| {
                        GatepassError::BadKeyFormat(format!(
                            "{}: {e}",
                            constants::ERR_KEY_NOT_BASE64
                        ))
                    })?;
                    Ok(Some(bytes))
                }
                None => Ok(None),
            }
        };

        Self::from_halves(algorithm, decode(public)?, decode(secret)?)
    }

    /// Discard the secret half, keeping a verify/encrypt-only key.
    pub fn public_only(mut self) -> Result<Self> {
        if let Some(secret) = self.secret.as_mut() {
            secret.zeroize();
        }
        self.secret = None;
        Self::from_halves(self.algorithm, self.public.clone(), None)
    }
}

pub(crate) fn half_name(half: KeyHalf) -> &'static str {
    match half {
        KeyHalf::Public => "public",
        KeyHalf::Secret => "secret",
    }
}

pub(crate) fn to_array(bytes: &[u8]) -> Result<[u8; 32]> {
    bytes.try_into().map_err(|_| {
        GatepassError::BadKeyFormat(format!(
            "{}: expected 32 bytes, got {}",
            constants::ERR_BAD_KEY_LENGTH,
            bytes.len()
        ))
    })
}
