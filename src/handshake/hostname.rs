//! # Hostname Multiplexer
//!
//! The login hostname is a NUL-delimited sequence of segments: the virtual
//! host the client targeted, possibly several proxy-appended forwarding
//! fields (real client address, resolved UUID, profile properties), and at
//! most one segment carrying our embedded payload. The number and order of
//! proxy segments varies by which intermediate proxy, if any, is present,
//! so the scan is position-independent.
//!
//! The first segment recognized by the envelope header probe is extracted
//! as the payload; every other segment is rejoined in its original
//! relative order to reconstruct a clean hostname. When no segment is
//! recognized the whole hostname passes through unchanged and the caller
//! treats the connection as not using this protocol.

use crate::crypto::envelope;

/// Separator between multiplexed hostname segments
pub const SEGMENT_SEPARATOR: char = '\0';

/// Result of scanning a raw hostname for an embedded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameSeparation {
    payload: Option<String>,
    payload_version: Option<u8>,
    clean_hostname: String,
}

impl HostnameSeparation {
    /// The extracted payload segment, if any segment was recognized.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Envelope version reported by the header probe of the payload.
    pub fn payload_version(&self) -> Option<u8> {
        self.payload_version
    }

    /// The hostname with the payload segment removed (or the original
    /// hostname when nothing was recognized).
    pub fn clean_hostname(&self) -> &str {
        &self.clean_hostname
    }
}

/// Scan a raw hostname and separate the embedded payload from the rest.
pub fn separate_hostname(hostname: &str) -> HostnameSeparation {
    let mut payload = None;
    let mut payload_version = None;
    let mut clean = String::with_capacity(hostname.len());

    for segment in hostname.split(SEGMENT_SEPARATOR) {
        if payload.is_none() {
            if let Some(version) = envelope::peek_version(segment) {
                payload = Some(segment.to_string());
                payload_version = Some(version);
                continue;
            }
        }

        if !clean.is_empty() {
            clean.push(SEGMENT_SEPARATOR);
        }
        clean.push_str(segment);
    }

    HostnameSeparation {
        payload,
        payload_version,
        clean_hostname: clean,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::{Algorithm, EnvelopeCodec, ENVELOPE_VERSION};

    fn payload() -> String {
        EnvelopeCodec::from_key(&Algorithm::Symmetric.produce())
            .unwrap()
            .encode_str("identity data")
            .unwrap()
    }

    #[test]
    fn test_no_payload_passes_through() {
        let separation = separate_hostname("play.example.com");
        assert_eq!(separation.payload(), None);
        assert_eq!(separation.clean_hostname(), "play.example.com");
    }

    #[test]
    fn test_payload_alone() {
        let payload = payload();
        let separation = separate_hostname(&payload);
        assert_eq!(separation.payload(), Some(payload.as_str()));
        assert_eq!(separation.payload_version(), Some(ENVELOPE_VERSION));
        assert_eq!(separation.clean_hostname(), "");
    }

    #[test]
    fn test_payload_at_every_position() {
        let payload = payload();
        let fillers = ["play.example.com", "203.0.113.9", "d-u-m-m-y"];

        for position in 0..=fillers.len() {
            let mut segments: Vec<&str> = fillers.to_vec();
            segments.insert(position, &payload);
            let hostname = segments.join("\0");

            let separation = separate_hostname(&hostname);
            assert_eq!(separation.payload(), Some(payload.as_str()));
            assert_eq!(separation.clean_hostname(), fillers.join("\0"));
        }
    }

    #[test]
    fn test_only_first_recognized_segment_is_extracted() {
        let first = payload();
        let second = payload();
        let hostname = format!("play.example.com\0{first}\0{second}");

        let separation = separate_hostname(&hostname);
        assert_eq!(separation.payload(), Some(first.as_str()));
        assert_eq!(
            separation.clean_hostname(),
            format!("play.example.com\0{second}")
        );
    }
}
