//! # Identity Record Codec
//!
//! Fixed-field, NUL-delimited serialization of the identity payload.
//!
//! ## Wire Format
//! ```text
//! version \0 username \0 xuid \0 device-os \0 language \0 ui-profile \0
//! input-mode \0 ip \0 has-link [\0 java-username \0 java-uuid] \0 field-count
//! ```
//!
//! The trailing field count declares how many fields the sender wrote,
//! including itself: 10 for an unlinked record, 12 for one that embeds an
//! upstream-resolved link. Decoding validates the declared count against
//! both the actual field count and the expected constant: any mismatch is
//! a hard `InvalidFieldCount` failure, never a partial fill. That makes the
//! count double as a cheap tamper and version-skew check underneath the
//! cryptographic layer.

use crate::error::{GatepassError, Result};
use crate::identity::linked::{xuid_to_uuid, LinkedPlayer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field separator inside an encoded record
pub const FIELD_SEPARATOR: char = '\0';

/// Field count of a record without an embedded link
pub const BASE_FIELD_COUNT: usize = 10;
/// Field count of a record with an embedded link
pub const LINKED_FIELD_COUNT: usize = 12;

/// Operating system family reported by the gateway client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceOs {
    Unknown,
    Android,
    Ios,
    Macos,
    FireOs,
    GearVr,
    Hololens,
    Windows,
    Win32,
    Dedicated,
    Tv,
    PlayStation,
    Switch,
    Xbox,
}

impl DeviceOs {
    pub fn ordinal(self) -> u8 {
        match self {
            DeviceOs::Unknown => 0,
            DeviceOs::Android => 1,
            DeviceOs::Ios => 2,
            DeviceOs::Macos => 3,
            DeviceOs::FireOs => 4,
            DeviceOs::GearVr => 5,
            DeviceOs::Hololens => 6,
            DeviceOs::Windows => 7,
            DeviceOs::Win32 => 8,
            DeviceOs::Dedicated => 9,
            DeviceOs::Tv => 10,
            DeviceOs::PlayStation => 11,
            DeviceOs::Switch => 12,
            DeviceOs::Xbox => 13,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(DeviceOs::Unknown),
            1 => Some(DeviceOs::Android),
            2 => Some(DeviceOs::Ios),
            3 => Some(DeviceOs::Macos),
            4 => Some(DeviceOs::FireOs),
            5 => Some(DeviceOs::GearVr),
            6 => Some(DeviceOs::Hololens),
            7 => Some(DeviceOs::Windows),
            8 => Some(DeviceOs::Win32),
            9 => Some(DeviceOs::Dedicated),
            10 => Some(DeviceOs::Tv),
            11 => Some(DeviceOs::PlayStation),
            12 => Some(DeviceOs::Switch),
            13 => Some(DeviceOs::Xbox),
            _ => None,
        }
    }
}

/// UI layout the client plays with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiProfile {
    Classic,
    Pocket,
}

impl UiProfile {
    pub fn ordinal(self) -> u8 {
        match self {
            UiProfile::Classic => 0,
            UiProfile::Pocket => 1,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(UiProfile::Classic),
            1 => Some(UiProfile::Pocket),
            _ => None,
        }
    }
}

/// Primary input device of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    Unknown,
    Mouse,
    Touch,
    Controller,
    VirtualReality,
}

impl InputMode {
    pub fn ordinal(self) -> u8 {
        match self {
            InputMode::Unknown => 0,
            InputMode::Mouse => 1,
            InputMode::Touch => 2,
            InputMode::Controller => 3,
            InputMode::VirtualReality => 4,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(InputMode::Unknown),
            1 => Some(InputMode::Mouse),
            2 => Some(InputMode::Touch),
            3 => Some(InputMode::Controller),
            4 => Some(InputMode::VirtualReality),
            _ => None,
        }
    }
}

/// The structured identity payload carried inside the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    /// Gateway protocol revision the client connected with
    pub protocol_version: i32,
    pub username: String,
    /// Stable numeric identity
    pub xuid: u64,
    pub device_os: DeviceOs,
    pub language_code: String,
    pub ui_profile: UiProfile,
    pub input_mode: InputMode,
    /// Client's real source address, as seen by the gateway
    pub ip: String,
    /// Present when an upstream proxy already resolved the account link
    pub linked_player: Option<LinkedPlayer>,
}

impl IdentityRecord {
    /// Expected total field count for a record with or without a link.
    pub fn expected_field_count(linked: bool) -> usize {
        if linked {
            LINKED_FIELD_COUNT
        } else {
            BASE_FIELD_COUNT
        }
    }

    /// The primary-ecosystem UUID this record resolves to.
    pub fn java_uuid(&self) -> Uuid {
        match &self.linked_player {
            Some(linked) => linked.java_unique_id,
            None => xuid_to_uuid(self.xuid),
        }
    }

    /// The derived gateway-side UUID (always xuid-based).
    pub fn bedrock_uuid(&self) -> Uuid {
        xuid_to_uuid(self.xuid)
    }

    /// Serialize into the NUL-delimited wire form.
    pub fn encode(&self) -> String {
        let mut fields: Vec<String> = vec![
            self.protocol_version.to_string(),
            self.username.clone(),
            self.xuid.to_string(),
            self.device_os.ordinal().to_string(),
            self.language_code.clone(),
            self.ui_profile.ordinal().to_string(),
            self.input_mode.ordinal().to_string(),
            self.ip.clone(),
        ];

        match &self.linked_player {
            Some(linked) => {
                fields.push("1".into());
                fields.push(linked.java_username.clone());
                fields.push(linked.java_unique_id.to_string());
            }
            None => fields.push("0".into()),
        }

        // the count includes itself
        fields.push((fields.len() + 1).to_string());

        fields.join(&FIELD_SEPARATOR.to_string())
    }

    /// Deserialize from the NUL-delimited wire form.
    ///
    /// # Errors
    /// `InvalidFieldCount` when the actual or declared field count differs
    /// from the expected constant; `InvalidRecord` for unparsable fields.
    pub fn decode(raw: &str) -> Result<Self> {
        let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();

        let has_link = fields.get(8).copied() == Some("1");
        let expected = Self::expected_field_count(has_link);

        if fields.len() != expected {
            return Err(GatepassError::InvalidFieldCount {
                expected,
                actual: fields.len(),
            });
        }

        let declared: usize = fields[expected - 1]
            .parse()
            .map_err(|_| GatepassError::InvalidRecord("field count is not numeric".into()))?;
        if declared != expected {
            return Err(GatepassError::InvalidFieldCount {
                expected,
                actual: declared,
            });
        }

        let protocol_version: i32 = fields[0]
            .parse()
            .map_err(|_| GatepassError::InvalidRecord("protocol version is not numeric".into()))?;
        let xuid: u64 = fields[2]
            .parse()
            .map_err(|_| GatepassError::InvalidRecord("xuid is not numeric".into()))?;

        let device_os = parse_ordinal(fields[3], "device os", DeviceOs::from_ordinal)?;
        let ui_profile = parse_ordinal(fields[5], "ui profile", UiProfile::from_ordinal)?;
        let input_mode = parse_ordinal(fields[6], "input mode", InputMode::from_ordinal)?;

        let linked_player = if has_link {
            let java_unique_id = Uuid::parse_str(fields[10]).map_err(|_| {
                GatepassError::InvalidRecord("linked java unique id is not a uuid".into())
            })?;
            Some(LinkedPlayer::new(
                xuid_to_uuid(xuid),
                java_unique_id,
                fields[9],
            ))
        } else {
            None
        };

        Ok(Self {
            protocol_version,
            username: fields[1].to_string(),
            xuid,
            device_os,
            language_code: fields[4].to_string(),
            ui_profile,
            input_mode,
            ip: fields[7].to_string(),
            linked_player,
        })
    }
}

fn parse_ordinal<T>(
    field: &str,
    name: &'static str,
    from_ordinal: impl Fn(u8) -> Option<T>,
) -> Result<T> {
    field
        .parse::<u8>()
        .ok()
        .and_then(from_ordinal)
        .ok_or_else(|| GatepassError::InvalidRecord(format!("unknown {name} ordinal: {field}")))
}
