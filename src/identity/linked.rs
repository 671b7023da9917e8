//! Confirmed identity associations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A confirmed association between a gateway (Bedrock) identity and a
/// primary-ecosystem (Java) identity.
///
/// Immutable once constructed: a new link replaces rather than mutates the
/// old record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedPlayer {
    pub bedrock_id: Uuid,
    pub java_unique_id: Uuid,
    pub java_username: String,
}

impl LinkedPlayer {
    pub fn new(bedrock_id: Uuid, java_unique_id: Uuid, java_username: impl Into<String>) -> Self {
        Self {
            bedrock_id,
            java_unique_id,
            java_username: java_username.into(),
        }
    }
}

/// Derive the primary-ecosystem UUID for an unlinked gateway identity.
///
/// The stable numeric identity (xuid) occupies the low 64 bits; the high
/// bits are zero, which cannot collide with version-4 UUIDs of native
/// accounts.
pub fn xuid_to_uuid(xuid: u64) -> Uuid {
    Uuid::from_u64_pair(0, xuid)
}

/// Recover the numeric identity from a derived UUID.
pub fn uuid_to_xuid(uuid: &Uuid) -> u64 {
    uuid.as_u64_pair().1
}
