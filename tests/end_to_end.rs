#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Full-path scenario: encode an identity record with a symmetric key,
//! embed it in a multiplexed hostname, and resolve it back out: plus the
//! disconnect paths a hostile or skewed payload takes

use gatepass::crypto::{Algorithm, EnvelopeCodec, KeyMaterial};
use gatepass::handshake::{
    resolve_with, DisconnectReason, HandshakeOutcome, HandshakeResolver, Resolution, Transport,
};
use gatepass::identity::{DeviceOs, IdentityRecord, InputMode, UiProfile};
use gatepass::link::{LinkRegistry, LinkVerifyOutcome, Linking, MemoryLinkRegistry};
use gatepass::session::{Connection, ConnectionRegistry};
use std::sync::Arc;
use std::time::Duration;

fn record() -> IdentityRecord {
    IdentityRecord {
        protocol_version: 486,
        username: "Steve".into(),
        xuid: 2_535_432_196_048_835,
        device_os: DeviceOs::Switch,
        language_code: "en_US".into(),
        ui_profile: UiProfile::Classic,
        input_mode: InputMode::Controller,
        ip: "203.0.113.7".into(),
        linked_player: None,
    }
}

struct Harness {
    key: KeyMaterial,
    linking: Arc<Linking>,
    resolver: HandshakeResolver,
}

fn harness(require_link: bool) -> Harness {
    let key = Algorithm::Symmetric.produce();
    let registry: Arc<dyn LinkRegistry> = Arc::new(MemoryLinkRegistry::new());
    let linking = Arc::new(Linking::new(
        registry,
        true,
        true,
        Duration::from_secs(300),
    ));
    let resolver = HandshakeResolver::new(
        EnvelopeCodec::from_key(&key).unwrap(),
        Arc::clone(&linking),
        require_link,
    );
    Harness {
        key,
        linking,
        resolver,
    }
}

fn embed(key: &KeyMaterial, record: &IdentityRecord, virtual_host: &str) -> String {
    let payload = EnvelopeCodec::from_key(key)
        .unwrap()
        .encode_str(&record.encode())
        .unwrap();
    format!("{virtual_host}\0{payload}")
}

#[tokio::test]
async fn test_spec_scenario_roundtrip() {
    let harness = harness(false);
    let record = record();
    let hostname = embed(&harness.key, &record, "play.example.com");

    match harness.resolver.resolve(&hostname).await {
        Resolution::Accepted(connection) => {
            assert_eq!(*connection.record(), record);
            assert_eq!(connection.clean_hostname(), "play.example.com");
            assert_eq!(connection.xuid(), record.xuid);
            assert_eq!(connection.java_uuid(), record.bedrock_uuid());
        }
        other => panic!("expected Accepted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolution_after_linking() {
    let harness = harness(true);
    let record = record();
    let java_id = uuid::Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap();

    // unlinked + require_link: rejected with the link-required reason
    let hostname = embed(&harness.key, &record, "play.example.com");
    match harness.resolver.resolve(&hostname).await {
        Resolution::Disconnected { reason, .. } => {
            assert_eq!(reason, DisconnectReason::LinkRequired);
            assert!(!reason.user_message().is_empty());
        }
        other => panic!("expected Disconnected, got {other:?}"),
    }

    // run the link protocol
    let code = harness
        .linking
        .create_request(java_id, "SteveJava", "Steve")
        .await
        .unwrap();
    let outcome = harness
        .linking
        .verify_request(record.bedrock_uuid(), "Steve", "SteveJava", &code)
        .await
        .unwrap();
    assert!(matches!(outcome, LinkVerifyOutcome::Completed(_)));

    // the same handshake now resolves to the linked Java identity
    match harness.resolver.resolve(&hostname).await {
        Resolution::Accepted(connection) => {
            assert!(connection.is_linked());
            assert_eq!(connection.java_uuid(), java_id);
            assert_eq!(
                connection.linked_player().unwrap().java_username,
                "SteveJava"
            );
        }
        other => panic!("expected Accepted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_field_count_skew_disconnects() {
    let harness = harness(false);

    // a record from a protocol revision with an extra field
    let skewed = {
        let encoded = record().encode();
        let (body, _count) = encoded.rsplit_once('\0').unwrap();
        format!("{body}\0futurefield\011")
    };
    let payload = EnvelopeCodec::from_key(&harness.key)
        .unwrap()
        .encode_str(&skewed)
        .unwrap();

    match harness.resolver.resolve(&payload).await {
        Resolution::Disconnected { reason, cause } => {
            assert_eq!(
                reason,
                DisconnectReason::InvalidFieldCount {
                    expected: 10,
                    actual: 11
                }
            );
            assert!(cause.is_some());
        }
        other => panic!("expected Disconnected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_registry_error_degrades_to_no_link() {
    // a resolver whose linking front is enabled but backed by a registry
    // that always fails: the handshake still succeeds, without a link
    struct BrokenRegistry;

    #[async_trait::async_trait]
    impl LinkRegistry for BrokenRegistry {
        async fn fetch_link(
            &self,
            _bedrock_id: uuid::Uuid,
        ) -> gatepass::Result<Option<gatepass::identity::LinkedPlayer>> {
            Err(gatepass::GatepassError::StoreUnavailable("db down".into()))
        }
        async fn is_linked(&self, _id: uuid::Uuid) -> gatepass::Result<bool> {
            Err(gatepass::GatepassError::StoreUnavailable("db down".into()))
        }
        async fn add_link(
            &self,
            _java_unique_id: uuid::Uuid,
            _java_username: &str,
            _bedrock_id: uuid::Uuid,
        ) -> gatepass::Result<gatepass::identity::LinkedPlayer> {
            Err(gatepass::GatepassError::StoreUnavailable("db down".into()))
        }
        async fn unlink(&self, _id: uuid::Uuid) -> gatepass::Result<()> {
            Err(gatepass::GatepassError::StoreUnavailable("db down".into()))
        }
        async fn create_request(
            &self,
            _request: gatepass::link::LinkRequest,
        ) -> gatepass::Result<()> {
            Err(gatepass::GatepassError::StoreUnavailable("db down".into()))
        }
        async fn resolve_and_consume(
            &self,
            _java_username: &str,
            _bedrock_username: &str,
        ) -> gatepass::Result<Option<gatepass::link::LinkRequest>> {
            Err(gatepass::GatepassError::StoreUnavailable("db down".into()))
        }
        async fn sweep_expired(&self, _max_age: Duration) -> gatepass::Result<u64> {
            Err(gatepass::GatepassError::StoreUnavailable("db down".into()))
        }
    }

    let key = Algorithm::Symmetric.produce();
    let linking = Arc::new(Linking::new(
        Arc::new(BrokenRegistry),
        true,
        true,
        Duration::from_secs(300),
    ));
    let resolver = HandshakeResolver::new(EnvelopeCodec::from_key(&key).unwrap(), linking, false);

    let hostname = embed(&key, &record(), "play.example.com");
    match resolver.resolve(&hostname).await {
        Resolution::Accepted(connection) => assert!(!connection.is_linked()),
        other => panic!("expected Accepted despite store failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_driver_and_session_registry() {
    struct RecordingTransport {
        hostname: String,
        delivered: Option<Connection>,
        kicked: Option<DisconnectReason>,
    }

    impl Transport for RecordingTransport {
        fn raw_hostname(&self) -> &str {
            &self.hostname
        }
        fn deliver(&mut self, connection: Connection) {
            self.delivered = Some(connection);
        }
        fn disconnect(&mut self, reason: &DisconnectReason) {
            self.kicked = Some(reason.clone());
        }
    }

    let harness = harness(false);
    let record = record();
    let mut transport = RecordingTransport {
        hostname: embed(&harness.key, &record, "play.example.com"),
        delivered: None,
        kicked: None,
    };

    let outcome = resolve_with(&harness.resolver, &mut transport).await;
    assert_eq!(outcome, HandshakeOutcome::Delivered);
    assert!(transport.kicked.is_none());

    // the delivered connection lives in the session registry until disconnect
    let sessions = ConnectionRegistry::new();
    let connection = sessions.insert(transport.delivered.unwrap()).await;
    assert_eq!(sessions.len().await, 1);
    assert_eq!(
        sessions
            .get_by_uuid(&connection.java_uuid())
            .await
            .unwrap()
            .username(),
        "Steve"
    );

    sessions.remove(record.xuid).await;
    assert!(sessions.is_empty().await);
}
