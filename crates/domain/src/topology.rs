//! Topology loader: turns the declarative outlet document into devices.
//!
//! The document is a JSON object whose `tasmotaswitchs` array lists outlet
//! descriptors. A descriptor directly in the array is an accessory of its
//! own; a nested array of descriptors is one accessory exposing several
//! outlets (a multi-socket plug, both relays of a board, …).
//!
//! ```json
//! {
//!   "server": { "pin": 12391235, "port": 22339, "db": "/var/lib/homekit-tasmota-gw" },
//!   "tasmotaswitchs": [
//!     { "host": "192.168.111.111", "powerlabel": "POWER", "kind": "switch" },
//!     [
//!       { "host": "192.168.111.118", "powerlabel": "POWER1", "kind": "switch" },
//!       { "host": "192.168.111.118", "powerlabel": "POWER2", "kind": "light" }
//!     ],
//!     [
//!       { "adapter": "serial", "relay": 1, "kind": "switch" },
//!       { "adapter": "serial", "relay": 2, "kind": "switch" }
//!     ]
//!   ]
//! }
//! ```
//!
//! Loading is all-or-nothing: the first validation failure aborts with a
//! [`TopologyError`] naming the offending element.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::device::{AdapterKind, Addressing, Device, DeviceKind, GroupPlacement, RelayIndex};
use crate::error::{OutletPosition, TopologyError};
use crate::id::{DeviceId, GroupId};

/// Key of the outlet array in the topology document.
pub const OUTLET_LIST_KEY: &str = "tasmotaswitchs";

/// Settings for the accessory server sitting on top of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerPolicy {
    /// Numeric pairing code.
    pub pin: u64,
    /// Listen port.
    pub port: u16,
    /// Where the accessory server keeps its pairing data.
    pub storage_path: String,
}

impl Default for ServerPolicy {
    fn default() -> Self {
        Self {
            pin: 12_391_235,
            port: 22_339,
            storage_path: "/var/lib/homekit-tasmota-gw".to_string(),
        }
    }
}

/// The loaded, immutable set of devices plus server settings.
#[derive(Debug, Clone)]
pub struct Topology {
    devices: Vec<Device>,
    server: ServerPolicy,
}

/// One physical accessory: a maximal run of devices sharing a group.
#[derive(Debug, Clone, Copy)]
pub struct Accessory<'a> {
    pub group_id: GroupId,
    pub members: &'a [Device],
}

impl Accessory<'_> {
    /// Display name: the leader's configured name, else `Switch<n>` /
    /// `Light<n>` after the leader's kind and the group number.
    #[must_use]
    pub fn name(&self) -> String {
        let leader = &self.members[0];
        leader
            .name
            .clone()
            .unwrap_or_else(|| format!("{}{}", leader.kind.label(), self.group_id))
    }

    /// Stable serial number derived from the group number.
    #[must_use]
    pub fn serial_number(&self) -> String {
        format!("850010C7-51BB-46D2-B033-50CE{:08X}", self.group_id.get())
    }
}

impl Topology {
    /// Parse and validate a topology document.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Parse`] for malformed JSON, or the first
    /// validation failure encountered.
    pub fn from_json_str(document: &str) -> Result<Self, TopologyError> {
        let value: Value = serde_json::from_str(document).map_err(TopologyError::Parse)?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed topology document.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure encountered; no partial
    /// topology is ever produced.
    pub fn from_value(root: &Value) -> Result<Self, TopologyError> {
        let root = root.as_object().ok_or(TopologyError::RootNotObject)?;

        let server = match root.get("server") {
            Some(section) => parse_server(section)?,
            None => ServerPolicy::default(),
        };

        let outlets = root
            .get(OUTLET_LIST_KEY)
            .ok_or(TopologyError::MissingOutletList {
                key: OUTLET_LIST_KEY,
            })?
            .as_array()
            .ok_or(TopologyError::OutletListNotArray {
                key: OUTLET_LIST_KEY,
            })?;
        if outlets.is_empty() {
            return Err(TopologyError::EmptyOutletList {
                key: OUTLET_LIST_KEY,
            });
        }

        let mut drafts = Vec::new();
        let mut last_id = DeviceId::new(0);
        let mut last_group = GroupId::new(0);

        for (index, element) in outlets.iter().enumerate() {
            let element_position = OutletPosition {
                element: index + 1,
                member: None,
            };
            match element {
                Value::Object(descriptor) => {
                    last_group = last_group.next();
                    last_id = last_id.next();
                    drafts.push(Draft::parse(
                        descriptor,
                        element_position,
                        last_id,
                        last_group,
                    )?);
                }
                Value::Array(members) => {
                    if members.is_empty() {
                        return Err(TopologyError::EmptyGroup {
                            position: element_position,
                        });
                    }
                    last_group = last_group.next();
                    for (member_index, member) in members.iter().enumerate() {
                        let position = OutletPosition {
                            element: index + 1,
                            member: Some(member_index + 1),
                        };
                        let descriptor = member
                            .as_object()
                            .ok_or(TopologyError::NotAnObject { position })?;
                        last_id = last_id.next();
                        drafts.push(Draft::parse(descriptor, position, last_id, last_group)?);
                    }
                }
                _ => {
                    return Err(TopologyError::NotAnObject {
                        position: element_position,
                    });
                }
            }
        }

        Ok(Self {
            devices: place_in_groups(drafts),
            server,
        })
    }

    /// All devices, ordered by id.
    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Look a device up by id.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.devices.get(index)
    }

    /// Server settings, defaulted when the document has none.
    #[must_use]
    pub fn server(&self) -> &ServerPolicy {
        &self.server
    }

    /// Accessories in group order.
    pub fn accessories(&self) -> impl Iterator<Item = Accessory<'_>> {
        self.devices
            .chunk_by(|a, b| a.group_id() == b.group_id())
            .map(|members| Accessory {
                group_id: members[0].group_id(),
                members,
            })
    }

    /// Give up the devices, keeping the server settings.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Device>, ServerPolicy) {
        (self.devices, self.server)
    }
}

/// A validated descriptor whose group geometry is not known yet.
struct Draft {
    id: DeviceId,
    group_id: GroupId,
    kind: DeviceKind,
    name: Option<String>,
    addressing: Addressing,
}

impl Draft {
    fn parse(
        descriptor: &Map<String, Value>,
        position: OutletPosition,
        id: DeviceId,
        group_id: GroupId,
    ) -> Result<Self, TopologyError> {
        let adapter = match optional_string(descriptor, "adapter", position)? {
            Some(text) => text
                .parse::<AdapterKind>()
                .map_err(|_| TopologyError::InvalidField {
                    position,
                    field: "adapter",
                    value: text.to_string(),
                })?,
            None => AdapterKind::Http,
        };

        let addressing = match adapter {
            AdapterKind::Http => Addressing::Http {
                host: required_string(descriptor, "host", position)?,
                power_label: required_string(descriptor, "powerlabel", position)?,
            },
            AdapterKind::Serial => Addressing::Serial {
                relay: required_relay(descriptor, position)?,
            },
            AdapterKind::RemoteRelay => Addressing::RemoteRelay {
                host: required_string(descriptor, "host", position)?,
                relay: required_relay(descriptor, position)?,
            },
        };

        let kind_text = required_string(descriptor, "kind", position)?;
        let kind = kind_text
            .parse::<DeviceKind>()
            .map_err(|_| TopologyError::InvalidField {
                position,
                field: "kind",
                value: kind_text.clone(),
            })?;

        let name = optional_string(descriptor, "name", position)?.map(str::to_string);

        Ok(Self {
            id,
            group_id,
            kind,
            name,
            addressing,
        })
    }

    fn place(self, position: usize, size: usize) -> Device {
        Device {
            id: self.id,
            group: GroupPlacement {
                group_id: self.group_id,
                position,
                size,
            },
            kind: self.kind,
            name: self.name,
            addressing: self.addressing,
        }
    }
}

/// Second pass: derive position and size from each maximal run of equal
/// group ids. Group boundaries are only final once the whole list has been
/// walked, trailing groups included.
fn place_in_groups(drafts: Vec<Draft>) -> Vec<Device> {
    let geometry: Vec<(usize, usize)> = drafts
        .chunk_by(|a, b| a.group_id == b.group_id)
        .flat_map(|run| (0..run.len()).map(move |position| (position, run.len())))
        .collect();

    drafts
        .into_iter()
        .zip(geometry)
        .map(|(draft, (position, size))| draft.place(position, size))
        .collect()
}

fn required_string(
    descriptor: &Map<String, Value>,
    field: &'static str,
    position: OutletPosition,
) -> Result<String, TopologyError> {
    let text = optional_string(descriptor, field, position)?
        .ok_or(TopologyError::MissingField { position, field })?;
    if text.trim().is_empty() {
        return Err(TopologyError::InvalidField {
            position,
            field,
            value: text.to_string(),
        });
    }
    Ok(text.to_string())
}

fn optional_string<'a>(
    descriptor: &'a Map<String, Value>,
    field: &'static str,
    position: OutletPosition,
) -> Result<Option<&'a str>, TopologyError> {
    match descriptor.get(field) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(_) => Err(TopologyError::WrongFieldType {
            position,
            field,
            expected: "string",
        }),
    }
}

fn required_relay(
    descriptor: &Map<String, Value>,
    position: OutletPosition,
) -> Result<RelayIndex, TopologyError> {
    let field = "relay";
    let value = descriptor
        .get(field)
        .ok_or(TopologyError::MissingField { position, field })?;
    let number = value.as_u64().ok_or(TopologyError::WrongFieldType {
        position,
        field,
        expected: "number",
    })?;
    u8::try_from(number)
        .ok()
        .and_then(RelayIndex::new)
        .ok_or_else(|| TopologyError::InvalidField {
            position,
            field,
            value: number.to_string(),
        })
}

fn parse_server(section: &Value) -> Result<ServerPolicy, TopologyError> {
    let section = section.as_object().ok_or(TopologyError::ServerNotObject)?;
    let mut policy = ServerPolicy::default();

    if let Some(pin) = section.get("pin") {
        policy.pin = pin.as_u64().ok_or(TopologyError::ServerFieldType {
            field: "pin",
            expected: "non-negative integer",
        })?;
    }
    if let Some(port) = section.get("port") {
        policy.port = port
            .as_u64()
            .and_then(|port| u16::try_from(port).ok())
            .ok_or(TopologyError::ServerFieldType {
                field: "port",
                expected: "port number",
            })?;
    }
    if let Some(db) = section.get("db") {
        policy.storage_path = db
            .as_str()
            .ok_or(TopologyError::ServerFieldType {
                field: "db",
                expected: "string",
            })?
            .to_string();
    }

    Ok(policy)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn load(document: &str) -> Topology {
        Topology::from_json_str(document).unwrap()
    }

    fn load_err(document: &str) -> TopologyError {
        Topology::from_json_str(document).unwrap_err()
    }

    fn plug(host: &str, label: &str, kind: &str) -> String {
        format!(r#"{{"host":"{host}","powerlabel":"{label}","kind":"{kind}"}}"#)
    }

    fn assert_geometry_invariants(topology: &Topology) {
        let devices = topology.devices();
        for (index, device) in devices.iter().enumerate() {
            assert_eq!(device.id.get() as usize, index + 1, "ids must be contiguous");
        }

        let mut groups: BTreeMap<GroupId, Vec<&Device>> = BTreeMap::new();
        for device in devices {
            groups.entry(device.group_id()).or_default().push(device);
        }
        for (expected, (group_id, members)) in (1u32..).zip(&groups) {
            assert_eq!(group_id.get(), expected, "group ids must be contiguous");
            let positions: Vec<usize> = members.iter().map(|d| d.group.position).collect();
            assert_eq!(positions, (0..members.len()).collect::<Vec<_>>());
            assert!(members.iter().all(|d| d.group.size == members.len()));
        }
    }

    #[test]
    fn should_load_mixed_direct_and_grouped_outlets() {
        let topology = load(
            r#"{"tasmotaswitchs":[{"host":"h1","powerlabel":"POWER","kind":"switch"},[{"host":"h2","powerlabel":"POWER1","kind":"switch"},{"host":"h2","powerlabel":"POWER2","kind":"light"}]]}"#,
        );
        let devices = topology.devices();
        assert_eq!(devices.len(), 3);

        assert_eq!(devices[0].id, DeviceId::new(1));
        assert_eq!(devices[0].group_id(), GroupId::new(1));
        assert_eq!(devices[0].group.size, 1);
        assert_eq!(devices[0].group.position, 0);

        assert_eq!(devices[1].group_id(), GroupId::new(2));
        assert_eq!(devices[1].group.size, 2);
        assert_eq!(devices[1].group.position, 0);
        assert_eq!(devices[1].kind, DeviceKind::Switch);

        assert_eq!(devices[2].group_id(), GroupId::new(2));
        assert_eq!(devices[2].group.size, 2);
        assert_eq!(devices[2].group.position, 1);
        assert_eq!(devices[2].kind, DeviceKind::Light);
        assert_eq!(
            devices[2].addressing,
            Addressing::Http {
                host: "h2".to_string(),
                power_label: "POWER2".to_string(),
            }
        );
    }

    #[test]
    fn should_handle_leading_group_followed_by_singletons() {
        let topology = load(&format!(
            r#"{{"tasmotaswitchs":[[{},{}],{},{}]}}"#,
            plug("a", "POWER1", "switch"),
            plug("a", "POWER2", "switch"),
            plug("b", "POWER", "light"),
            plug("c", "POWER", "switch"),
        ));
        let devices = topology.devices();
        assert_eq!(devices.len(), 4);
        assert_eq!((devices[0].group.position, devices[0].group.size), (0, 2));
        assert_eq!((devices[1].group.position, devices[1].group.size), (1, 2));
        assert_eq!((devices[2].group.position, devices[2].group.size), (0, 1));
        assert_eq!((devices[3].group.position, devices[3].group.size), (0, 1));
        assert_eq!(devices[3].group_id(), GroupId::new(3));
        assert_geometry_invariants(&topology);
    }

    #[test]
    fn should_handle_trailing_group() {
        let topology = load(&format!(
            r#"{{"tasmotaswitchs":[{},[{},{},{}]]}}"#,
            plug("a", "POWER", "switch"),
            plug("b", "POWER1", "switch"),
            plug("b", "POWER2", "switch"),
            plug("b", "POWER3", "light"),
        ));
        let last = &topology.devices()[3];
        assert_eq!(last.group.position, 2);
        assert_eq!(last.group.size, 3);
        assert_geometry_invariants(&topology);
    }

    #[test]
    fn should_keep_adjacent_groups_separate() {
        let topology = load(&format!(
            r#"{{"tasmotaswitchs":[[{}],[{},{}],{}]}}"#,
            plug("a", "POWER", "switch"),
            plug("b", "POWER1", "switch"),
            plug("b", "POWER2", "switch"),
            plug("c", "POWER", "switch"),
        ));
        let groups: Vec<u32> = topology
            .devices()
            .iter()
            .map(|d| d.group_id().get())
            .collect();
        assert_eq!(groups, vec![1, 2, 2, 3]);
        assert_geometry_invariants(&topology);
    }

    #[test]
    fn should_satisfy_geometry_invariants_for_many_shapes() {
        let shapes: &[&[usize]] = &[&[0], &[3], &[0, 0, 0], &[2, 0, 2], &[1, 4, 0, 1, 2]];
        for shape in shapes {
            let elements: Vec<String> = shape
                .iter()
                .enumerate()
                .map(|(index, &size)| {
                    let host = format!("host{index}");
                    if size == 0 {
                        plug(&host, "POWER", "switch")
                    } else {
                        let members: Vec<String> = (1..=size)
                            .map(|n| plug(&host, &format!("POWER{n}"), "light"))
                            .collect();
                        format!("[{}]", members.join(","))
                    }
                })
                .collect();
            let document = format!(r#"{{"tasmotaswitchs":[{}]}}"#, elements.join(","));
            let topology = load(&document);
            let expected: usize = shape.iter().map(|&size| size.max(1)).sum();
            assert_eq!(topology.devices().len(), expected);
            assert_geometry_invariants(&topology);
        }
    }

    #[test]
    fn should_load_serial_and_remote_relay_outlets() {
        let topology = load(
            r#"{"tasmotaswitchs":[
                [{"adapter":"serial","relay":1,"kind":"switch"},{"adapter":"serial","relay":2,"kind":"light","name":"Lamp"}],
                {"adapter":"remote_relay","host":"192.168.111.111","relay":2,"kind":"switch"}
            ]}"#,
        );
        let devices = topology.devices();
        assert_eq!(
            devices[0].addressing,
            Addressing::Serial {
                relay: RelayIndex::new(1).unwrap()
            }
        );
        assert_eq!(devices[1].name.as_deref(), Some("Lamp"));
        assert_eq!(devices[2].adapter_kind(), AdapterKind::RemoteRelay);
    }

    #[test]
    fn should_default_server_policy_when_section_absent() {
        let topology = load(&format!(
            r#"{{"tasmotaswitchs":[{}]}}"#,
            plug("a", "POWER", "switch")
        ));
        assert_eq!(topology.server(), &ServerPolicy::default());
        assert_eq!(topology.server().port, 22_339);
    }

    #[test]
    fn should_read_server_policy_fields() {
        let topology = load(&format!(
            r#"{{"server":{{"pin":11122333,"port":12345,"db":"./db"}},"tasmotaswitchs":[{}]}}"#,
            plug("a", "POWER", "switch")
        ));
        let server = topology.server();
        assert_eq!(server.pin, 11_122_333);
        assert_eq!(server.port, 12_345);
        assert_eq!(server.storage_path, "./db");
    }

    #[test]
    fn should_reject_server_port_of_wrong_type() {
        let err = load_err(&format!(
            r#"{{"server":{{"port":"80"}},"tasmotaswitchs":[{}]}}"#,
            plug("a", "POWER", "switch")
        ));
        assert!(matches!(
            err,
            TopologyError::ServerFieldType { field: "port", .. }
        ));
    }

    #[test]
    fn should_reject_server_that_is_not_an_object() {
        let err = load_err(r#"{"server":[],"tasmotaswitchs":[]}"#);
        assert!(matches!(err, TopologyError::ServerNotObject));
    }

    #[test]
    fn should_reject_invalid_json() {
        assert!(matches!(load_err("{nope"), TopologyError::Parse(_)));
    }

    #[test]
    fn should_reject_non_object_root() {
        assert!(matches!(load_err("[]"), TopologyError::RootNotObject));
    }

    #[test]
    fn should_reject_missing_outlet_list() {
        assert!(matches!(
            load_err(r#"{"switches":[]}"#),
            TopologyError::MissingOutletList { .. }
        ));
    }

    #[test]
    fn should_reject_outlet_list_that_is_not_an_array() {
        assert!(matches!(
            load_err(r#"{"tasmotaswitchs":{}}"#),
            TopologyError::OutletListNotArray { .. }
        ));
    }

    #[test]
    fn should_reject_empty_outlet_list() {
        assert!(matches!(
            load_err(r#"{"tasmotaswitchs":[]}"#),
            TopologyError::EmptyOutletList { .. }
        ));
    }

    #[test]
    fn should_reject_scalar_element_with_its_position() {
        let err = load_err(&format!(
            r#"{{"tasmotaswitchs":[{},42]}}"#,
            plug("a", "POWER", "switch")
        ));
        assert_eq!(err.to_string(), "element 2 of the outlet list is not an object");
    }

    #[test]
    fn should_reject_nested_array_inside_group() {
        let err = load_err(&format!(
            r#"{{"tasmotaswitchs":[[{},[]]]}}"#,
            plug("a", "POWER", "switch")
        ));
        assert!(matches!(
            err,
            TopologyError::NotAnObject {
                position: OutletPosition {
                    element: 1,
                    member: Some(2)
                }
            }
        ));
    }

    #[test]
    fn should_reject_empty_group() {
        assert!(matches!(
            load_err(r#"{"tasmotaswitchs":[[]]}"#),
            TopologyError::EmptyGroup { .. }
        ));
    }

    #[test]
    fn should_reject_missing_host_with_position() {
        let err = load_err(r#"{"tasmotaswitchs":[{"powerlabel":"POWER","kind":"switch"}]}"#);
        assert_eq!(err.to_string(), "no key host in element 1");
    }

    #[test]
    fn should_reject_missing_kind_in_group_member() {
        let err = load_err(&format!(
            r#"{{"tasmotaswitchs":[{},[{},{{"host":"b","powerlabel":"POWER2"}}]]}}"#,
            plug("a", "POWER", "switch"),
            plug("b", "POWER1", "switch"),
        ));
        assert_eq!(err.to_string(), "no key kind in element 2, member 2");
    }

    #[test]
    fn should_reject_non_string_powerlabel() {
        let err = load_err(r#"{"tasmotaswitchs":[{"host":"a","powerlabel":1,"kind":"switch"}]}"#);
        assert!(matches!(
            err,
            TopologyError::WrongFieldType {
                field: "powerlabel",
                expected: "string",
                ..
            }
        ));
    }

    #[test]
    fn should_reject_blank_host() {
        let err = load_err(r#"{"tasmotaswitchs":[{"host":" ","powerlabel":"POWER","kind":"switch"}]}"#);
        assert!(matches!(
            err,
            TopologyError::InvalidField { field: "host", .. }
        ));
    }

    #[test]
    fn should_reject_unknown_kind() {
        let err = load_err(r#"{"tasmotaswitchs":[{"host":"a","powerlabel":"POWER","kind":"fan"}]}"#);
        assert_eq!(
            err.to_string(),
            "invalid value \"fan\" for kind in element 1"
        );
    }

    #[test]
    fn should_reject_unknown_adapter() {
        let err = load_err(r#"{"tasmotaswitchs":[{"adapter":"zigbee","kind":"switch"}]}"#);
        assert!(matches!(
            err,
            TopologyError::InvalidField { field: "adapter", .. }
        ));
    }

    #[test]
    fn should_reject_relay_outside_board() {
        let err = load_err(r#"{"tasmotaswitchs":[{"adapter":"serial","relay":3,"kind":"switch"}]}"#);
        assert!(matches!(
            err,
            TopologyError::InvalidField { field: "relay", .. }
        ));
    }

    #[test]
    fn should_reject_relay_of_wrong_type() {
        let err = load_err(r#"{"tasmotaswitchs":[{"adapter":"serial","relay":"1","kind":"switch"}]}"#);
        assert!(matches!(
            err,
            TopologyError::WrongFieldType { field: "relay", .. }
        ));
    }

    #[test]
    fn should_look_devices_up_by_id() {
        let topology = load(&format!(
            r#"{{"tasmotaswitchs":[{},{}]}}"#,
            plug("a", "POWER", "switch"),
            plug("b", "POWER", "light"),
        ));
        assert_eq!(
            topology.device(DeviceId::new(2)).map(|d| d.kind),
            Some(DeviceKind::Light)
        );
        assert!(topology.device(DeviceId::new(0)).is_none());
        assert!(topology.device(DeviceId::new(3)).is_none());
    }

    #[test]
    fn should_name_accessories_after_group_leader() {
        let topology = load(&format!(
            r#"{{"tasmotaswitchs":[{},[{},{}]]}}"#,
            plug("a", "POWER", "light"),
            plug("b", "POWER1", "switch"),
            plug("b", "POWER2", "light"),
        ));
        let accessories: Vec<Accessory<'_>> = topology.accessories().collect();
        assert_eq!(accessories.len(), 2);
        assert_eq!(accessories[0].name(), "Light1");
        assert_eq!(accessories[1].name(), "Switch2");
        assert_eq!(accessories[1].members.len(), 2);
        assert_eq!(
            accessories[1].serial_number(),
            "850010C7-51BB-46D2-B033-50CE00000002"
        );
    }
}
