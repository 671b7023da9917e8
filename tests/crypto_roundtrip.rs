#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Round-trip and tamper-detection properties of the data codecs
//! For every supported algorithm: decode(encode(x)) == x, and flipping any
//! bit causes a decode failure rather than altered plaintext

use gatepass::crypto::{codec_for, Algorithm, DataCodec, KeyHalf, KeyMaterial};
use gatepass::error::GatepassError;

fn algorithms() -> [Algorithm; 3] {
    [Algorithm::Symmetric, Algorithm::Signature, Algorithm::Sealed]
}

fn sample_buffers() -> Vec<Vec<u8>> {
    vec![
        vec![],
        vec![0u8],
        b"short".to_vec(),
        vec![0xFF; 1024],
        (0..=255u8).collect(),
    ]
}

// ============================================================================
// ROUND-TRIP LAW
// ============================================================================

#[test]
fn test_roundtrip_every_algorithm() {
    for algorithm in algorithms() {
        let codec = codec_for(&algorithm.produce()).unwrap();
        for buffer in sample_buffers() {
            let sections = codec.encode(&buffer).unwrap();
            let decoded = codec.decode(&sections).unwrap();
            assert_eq!(
                decoded,
                buffer,
                "round-trip broke for {}",
                algorithm.name()
            );
        }
    }
}

// ============================================================================
// TAMPER DETECTION
// ============================================================================

#[test]
fn test_single_bit_flips_always_detected() {
    for algorithm in algorithms() {
        let codec = codec_for(&algorithm.produce()).unwrap();
        let sections = codec.encode(b"tamper target payload").unwrap();

        for (section_index, section) in sections.iter().enumerate() {
            for byte_index in 0..section.len() {
                for bit in [0x01u8, 0x80u8] {
                    let mut tampered = sections.clone();
                    tampered[section_index][byte_index] ^= bit;

                    match codec.decode(&tampered) {
                        Err(
                            GatepassError::DecryptFailure | GatepassError::InvalidSignature,
                        ) => {}
                        Ok(plaintext) => panic!(
                            "{}: flipped bit {bit:#04x} at section {section_index} byte \
                             {byte_index} decoded to {plaintext:?}",
                            algorithm.name()
                        ),
                        Err(other) => panic!(
                            "{}: unexpected error class {other:?}",
                            algorithm.name()
                        ),
                    }
                }
            }
        }
    }
}

// ============================================================================
// KEY HALF ENFORCEMENT
// ============================================================================

#[test]
fn test_signing_requires_secret_half() {
    let key = Algorithm::Signature.produce().public_only().unwrap();
    let codec = codec_for(&key).unwrap();
    assert!(matches!(
        codec.encode(b"data"),
        Err(GatepassError::KeyHalfMissing { half: "secret", .. })
    ));
}

#[test]
fn test_opening_sealed_box_requires_secret_half() {
    let key = Algorithm::Sealed.produce();
    let full = codec_for(&key).unwrap();
    let sections = full.encode(b"data").unwrap();

    let encrypt_only = codec_for(&key.public_only().unwrap()).unwrap();
    assert!(matches!(
        encrypt_only.decode(&sections),
        Err(GatepassError::KeyHalfMissing { half: "secret", .. })
    ));
}

#[test]
fn test_cross_key_decode_fails() {
    for algorithm in [Algorithm::Symmetric, Algorithm::Sealed] {
        let sender = codec_for(&algorithm.produce()).unwrap();
        let stranger = codec_for(&algorithm.produce()).unwrap();
        let sections = sender.encode(b"confidential").unwrap();
        assert!(
            stranger.decode(&sections).is_err(),
            "{} decoded under a foreign key",
            algorithm.name()
        );
    }
}

// ============================================================================
// KEY CODEC
// ============================================================================

#[test]
fn test_stored_halves_roundtrip_independently() {
    for algorithm in [Algorithm::Signature, Algorithm::Sealed] {
        let key = algorithm.produce();

        let secret = key.encode(KeyHalf::Secret).unwrap();
        let public = key.encode(KeyHalf::Public).unwrap();

        let from_secret = KeyMaterial::decode(algorithm, &secret, KeyHalf::Secret).unwrap();
        let from_public = KeyMaterial::decode(algorithm, &public, KeyHalf::Public).unwrap();

        assert!(from_secret.has_secret());
        assert!(from_public.has_public());
        assert!(!from_public.has_secret());
        assert_eq!(from_secret.public_bytes(), from_public.public_bytes());
    }
}

#[test]
fn test_malformed_stored_key_is_bad_key_format() {
    for (stored, reason) in [
        ("%%%not-base64%%%", "invalid base64"),
        ("AAAA", "wrong length"),
        ("", "empty"),
    ] {
        let result = KeyMaterial::decode(Algorithm::Symmetric, stored, KeyHalf::Secret);
        assert!(
            matches!(result, Err(GatepassError::BadKeyFormat(_))),
            "expected BadKeyFormat for {reason}, got {result:?}"
        );
    }
}

#[test]
fn test_key_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let key = Algorithm::Signature.produce();
    key.save_to_dir(dir.path()).unwrap();

    // corrupting the stored secret surfaces as a format error, not a crash
    std::fs::write(dir.path().join("key.secret"), "garbage???").unwrap();
    let result = KeyMaterial::load_from_dir(Algorithm::Signature, dir.path());
    assert!(matches!(result, Err(GatepassError::BadKeyFormat(_))));

    // an empty directory is a distinguishable error too
    let empty = tempfile::tempdir().unwrap();
    let result = KeyMaterial::load_from_dir(Algorithm::Signature, empty.path());
    assert!(matches!(result, Err(GatepassError::BadKeyFormat(_))));
}
