#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Order-independence of the hostname multiplexer: the payload segment is
//! recovered from any position among proxy-appended fillers, and the
//! remaining segments are reassembled in their original relative order

use gatepass::crypto::{Algorithm, EnvelopeCodec};
use gatepass::handshake::separate_hostname;

fn payload() -> String {
    EnvelopeCodec::from_key(&Algorithm::Symmetric.produce())
        .unwrap()
        .encode_str("identity record here")
        .unwrap()
}

#[test]
fn test_payload_recovered_from_any_position() {
    let payload = payload();
    let filler_pool = [
        "play.example.com",
        "198.51.100.23",
        "b2f0c0de-1234-5678-9abc-def012345678",
    ];

    // 0 to 3 fillers, payload inserted at every possible position
    for filler_count in 0..=filler_pool.len() {
        let fillers = &filler_pool[..filler_count];
        for position in 0..=fillers.len() {
            let mut segments: Vec<&str> = fillers.to_vec();
            segments.insert(position, &payload);
            let hostname = segments.join("\0");

            let separation = separate_hostname(&hostname);
            assert_eq!(
                separation.payload(),
                Some(payload.as_str()),
                "payload lost at position {position} among {filler_count} fillers"
            );
            assert_eq!(
                separation.clean_hostname(),
                fillers.join("\0"),
                "filler order broken at position {position} among {filler_count} fillers"
            );
        }
    }
}

#[test]
fn test_unrecognized_hostname_is_returned_unchanged() {
    let hostnames = [
        "play.example.com",
        "play.example.com\0198.51.100.23\0b2f0c0de-1234-5678-9abc-def012345678",
        "",
    ];
    for hostname in hostnames {
        let separation = separate_hostname(hostname);
        assert_eq!(separation.payload(), None);
        assert_eq!(separation.clean_hostname(), hostname);
    }
}

#[test]
fn test_extraction_is_exact() {
    // the recovered payload must decode to exactly what was embedded
    let envelope = EnvelopeCodec::from_key(&Algorithm::Symmetric.produce()).unwrap();
    let embedded = envelope.encode_str("exact payload").unwrap();
    let hostname = format!("play.example.com\0{embedded}\0203.0.113.5");

    let separation = separate_hostname(&hostname);
    let recovered = separation.payload().unwrap();
    assert_eq!(envelope.decode_to_string(recovered).unwrap(), "exact payload");
}
