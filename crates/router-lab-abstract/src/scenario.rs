use crate::device::{AccessList, InterfaceState, LinkState};
use crate::results::{DiagnosticResult, Hop, PingResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named set of deltas laid over a device's base snapshot.
/// Every part is optional; a missing part means "use the default" at query time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub interfaces: BTreeMap<String, InterfaceOverride>,
    /// Replaces the device ACLs wholesale when present.
    #[serde(default)]
    pub acls: Option<Vec<AccessList>>,
    #[serde(default)]
    pub ping_results: BTreeMap<String, PingResult>,
    #[serde(default)]
    pub traceroute_results: BTreeMap<String, Vec<Hop>>,
    #[serde(default)]
    pub diagnostic_result: Option<DiagnosticResult>,
}

/// Partial interface fields. The interface name is the map key and can't be overridden.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InterfaceOverride {
    pub status: Option<LinkState>,
    pub protocol: Option<LinkState>,
    pub ip: Option<String>,
    pub speed: Option<String>,
    pub duplex: Option<String>,
}

impl InterfaceOverride {
    pub fn apply_to(&self, iface: &mut InterfaceState) {
        if let Some(v) = self.status {
            iface.status = v;
        }
        if let Some(v) = self.protocol {
            iface.protocol = v;
        }
        if let Some(v) = &self.ip {
            iface.ip = v.clone();
        }
        if let Some(v) = &self.speed {
            iface.speed = v.clone();
        }
        if let Some(v) = &self.duplex {
            iface.duplex = v.clone();
        }
    }
}
