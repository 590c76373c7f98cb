//! Device: one controllable outlet or relay channel.
//!
//! Devices are built once by the [`topology`](crate::topology) loader and
//! never change afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::id::{DeviceId, GroupId};

/// A string did not name any variant of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} {value:?}")]
pub struct UnknownVariant {
    pub what: &'static str,
    pub value: String,
}

/// How the outlet is presented to the accessory layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Switch,
    Light,
}

impl DeviceKind {
    /// Capitalised label used for accessory display names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Switch => "Switch",
            Self::Light => "Light",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch => f.write_str("switch"),
            Self::Light => f.write_str("light"),
        }
    }
}

impl FromStr for DeviceKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "switch" => Ok(Self::Switch),
            "light" => Ok(Self::Light),
            _ => Err(UnknownVariant {
                what: "device kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Which transport drives the outlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    /// Tasmota plug reached over HTTP/JSON.
    Http,
    /// Relay on the locally attached USB-serial board.
    Serial,
    /// Relay on a board exposed by a remote relay CGI endpoint.
    RemoteRelay,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Serial => f.write_str("serial"),
            Self::RemoteRelay => f.write_str("remote_relay"),
        }
    }
}

impl FromStr for AdapterKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "serial" => Ok(Self::Serial),
            "remote_relay" => Ok(Self::RemoteRelay),
            _ => Err(UnknownVariant {
                what: "adapter",
                value: s.to_string(),
            }),
        }
    }
}

/// Relay channel on a two-relay board, numbered 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RelayIndex(u8);

impl RelayIndex {
    /// Number of relays on the board.
    pub const COUNT: usize = 2;

    /// The relay numbered `number`, if it exists on the board.
    #[must_use]
    pub fn new(number: u8) -> Option<Self> {
        (1..=2).contains(&number).then_some(Self(number))
    }

    /// 1-based relay number as printed on the board.
    #[must_use]
    pub fn number(self) -> u8 {
        self.0
    }

    /// 0-based slot in the board's status frame.
    #[must_use]
    pub fn slot(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Every relay on the board, in order.
    #[must_use]
    pub fn all() -> [Self; Self::COUNT] {
        [Self(1), Self(2)]
    }
}

impl TryFrom<u8> for RelayIndex {
    type Error = String;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Self::new(number).ok_or_else(|| format!("relay {number} does not exist"))
    }
}

impl From<RelayIndex> for u8 {
    fn from(relay: RelayIndex) -> Self {
        relay.0
    }
}

impl fmt::Display for RelayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Adapter-specific address of an outlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "adapter", rename_all = "snake_case")]
pub enum Addressing {
    Http { host: String, power_label: String },
    Serial { relay: RelayIndex },
    RemoteRelay { host: String, relay: RelayIndex },
}

impl Addressing {
    #[must_use]
    pub fn kind(&self) -> AdapterKind {
        match self {
            Self::Http { .. } => AdapterKind::Http,
            Self::Serial { .. } => AdapterKind::Serial,
            Self::RemoteRelay { .. } => AdapterKind::RemoteRelay,
        }
    }
}

/// Where a device sits inside its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPlacement {
    pub group_id: GroupId,
    /// 0-based position within the group.
    pub position: usize,
    /// Number of devices in the group.
    pub size: usize,
}

/// One controllable outlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub group: GroupPlacement,
    pub kind: DeviceKind,
    /// Display name override from the configuration.
    pub name: Option<String>,
    pub addressing: Addressing,
}

impl Device {
    #[must_use]
    pub fn group_id(&self) -> GroupId {
        self.group.group_id
    }

    #[must_use]
    pub fn adapter_kind(&self) -> AdapterKind {
        self.addressing.kind()
    }

    /// Name shown to the accessory layer: the configured name, or the
    /// kind label followed by the device id (`Switch3`, `Light4`).
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.kind.label(), self.id))
    }

    /// Whether this device opens its group (and so names the accessory).
    #[must_use]
    pub fn is_group_leader(&self) -> bool {
        self.group.position == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: Option<&str>) -> Device {
        Device {
            id: DeviceId::new(3),
            group: GroupPlacement {
                group_id: GroupId::new(2),
                position: 1,
                size: 2,
            },
            kind: DeviceKind::Light,
            name: name.map(str::to_string),
            addressing: Addressing::Http {
                host: "192.168.111.118".to_string(),
                power_label: "POWER2".to_string(),
            },
        }
    }

    #[test]
    fn should_parse_known_kinds() {
        assert_eq!("switch".parse::<DeviceKind>(), Ok(DeviceKind::Switch));
        assert_eq!("light".parse::<DeviceKind>(), Ok(DeviceKind::Light));
        let err = "fan".parse::<DeviceKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown device kind \"fan\"");
    }

    #[test]
    fn should_parse_known_adapter_kinds() {
        assert_eq!("serial".parse::<AdapterKind>(), Ok(AdapterKind::Serial));
        assert_eq!(
            "remote_relay".parse::<AdapterKind>(),
            Ok(AdapterKind::RemoteRelay)
        );
        assert!("zigbee".parse::<AdapterKind>().is_err());
    }

    #[test]
    fn should_only_accept_relays_one_and_two() {
        assert!(RelayIndex::new(0).is_none());
        assert_eq!(RelayIndex::new(1).map(RelayIndex::slot), Some(0));
        assert_eq!(RelayIndex::new(2).map(RelayIndex::slot), Some(1));
        assert!(RelayIndex::new(3).is_none());
    }

    #[test]
    fn should_reject_out_of_range_relay_when_deserializing() {
        assert!(serde_json::from_str::<RelayIndex>("3").is_err());
        assert_eq!(
            serde_json::from_str::<RelayIndex>("2").unwrap().number(),
            2
        );
    }

    #[test]
    fn should_derive_display_name_from_kind_and_id() {
        assert_eq!(device(None).display_name(), "Light3");
        assert_eq!(device(Some("Desk lamp")).display_name(), "Desk lamp");
    }

    #[test]
    fn should_report_adapter_kind_from_addressing() {
        assert_eq!(device(None).adapter_kind(), AdapterKind::Http);
        assert!(!device(None).is_group_leader());
    }

    #[test]
    fn should_tag_addressing_with_adapter_name() {
        let json = serde_json::to_value(Addressing::Serial {
            relay: RelayIndex::new(1).unwrap(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"adapter": "serial", "relay": 1}));
    }
}
