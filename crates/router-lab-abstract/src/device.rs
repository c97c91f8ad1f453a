use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Administrative / operational state of an interface, as `show ip interface brief` prints it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkState {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "administratively down")]
    AdministrativelyDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_version: String,
    pub uptime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceState {
    pub name: String,
    pub status: LinkState,
    pub protocol: LinkState,
    /// IPv4 address, or `unassigned`.
    pub ip: String,
    pub speed: String,
    pub duplex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList {
    pub name: String,
    pub entries: Vec<String>,
}

/// Effective view of one device. Base snapshots come from the fixture catalog;
/// scenario overlays always produce a fresh copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    pub address: String,
    pub info: DeviceInfo,
    pub interfaces: BTreeMap<String, InterfaceState>,
    pub acls: Vec<AccessList>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_state_wire_names() {
        let json = serde_json::to_string(&LinkState::AdministrativelyDown).unwrap();
        assert_eq!(json, "\"administratively down\"");
        let parsed: LinkState = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(parsed, LinkState::Down);
        assert!(serde_json::from_str::<LinkState>("\"flapping\"").is_err());
    }
}
