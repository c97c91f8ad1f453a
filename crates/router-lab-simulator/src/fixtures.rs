use crate::error::{DiagError, FixtureError};
use router_lab_abstract::{
    AccessList, DeviceInfo, DeviceSnapshot, DiagnosticResult, Hop, InterfaceState, PingResult,
    Scenario,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("../fixtures/catalog.toml");

/// Fallbacks used when the active scenario has nothing for a query.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDefaults {
    pub ping: PingResult,
    /// Hops preceding the target on a synthesized traceroute.
    pub trace_path: Vec<Hop>,
    pub final_hop_rtt: f64,
    pub diagnostic: DiagnosticResult,
}

impl FixtureDefaults {
    /// The default path with `target` appended as the last hop.
    pub fn traceroute(&self, target: &str) -> Vec<Hop> {
        let mut hops = self.trace_path.clone();
        let next = hops.len() as u32 + 1;
        hops.push(Hop::reply(next, target, self.final_hop_rtt));
        hops
    }
}

/// Canned CLI output, picked when `pattern` occurs in the executed command.
#[derive(Debug, Clone, Deserialize)]
pub struct CannedCommand {
    pub pattern: String,
    pub output: String,
}

#[derive(Deserialize)]
struct Catalog {
    defaults: FixtureDefaults,
    #[serde(default)]
    devices: Vec<DeviceFixture>,
    #[serde(default)]
    scenarios: Vec<Scenario>,
}

#[derive(Deserialize)]
struct DeviceFixture {
    address: String,
    info: DeviceInfo,
    #[serde(default)]
    interfaces: Vec<InterfaceState>,
    #[serde(default)]
    acls: Vec<AccessList>,
    #[serde(default)]
    commands: Vec<CannedCommand>,
}

struct DeviceRecord {
    snapshot: DeviceSnapshot,
    commands: Vec<CannedCommand>,
}

/// Immutable catalog of base device snapshots and scenario overlays.
pub struct FixtureStore {
    defaults: FixtureDefaults,
    devices: HashMap<String, DeviceRecord>,
    scenarios: Vec<Scenario>,
}

impl FixtureStore {
    /// The catalog compiled into the crate.
    pub fn builtin() -> Result<Self, FixtureError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let content = fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, FixtureError> {
        let catalog: Catalog = toml::from_str(content)?;
        Self::from_catalog(catalog)
    }

    fn from_catalog(catalog: Catalog) -> Result<Self, FixtureError> {
        validate_hops("defaults", "*", &catalog.defaults.trace_path)?;
        validate_ping("defaults", "*", &catalog.defaults.ping)?;

        let mut devices = HashMap::new();
        for fixture in catalog.devices {
            let mut interfaces = BTreeMap::new();
            for iface in fixture.interfaces {
                if interfaces.contains_key(&iface.name) {
                    return Err(FixtureError::DuplicateInterface {
                        device: fixture.address,
                        interface: iface.name,
                    });
                }
                interfaces.insert(iface.name.clone(), iface);
            }
            let record = DeviceRecord {
                snapshot: DeviceSnapshot {
                    address: fixture.address.clone(),
                    info: fixture.info,
                    interfaces,
                    acls: fixture.acls,
                },
                commands: fixture.commands,
            };
            if devices.insert(fixture.address.clone(), record).is_some() {
                return Err(FixtureError::DuplicateDevice(fixture.address));
            }
        }

        let mut seen = HashSet::new();
        for scenario in &catalog.scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(FixtureError::DuplicateScenario(scenario.name.clone()));
            }
            for (target, ping) in &scenario.ping_results {
                validate_ping(&scenario.name, target, ping)?;
            }
            for (target, hops) in &scenario.traceroute_results {
                validate_hops(&scenario.name, target, hops)?;
            }
        }

        debug!(
            "Loaded fixture catalog: {} devices, {} scenarios",
            devices.len(),
            catalog.scenarios.len()
        );

        Ok(Self {
            defaults: catalog.defaults,
            devices,
            scenarios: catalog.scenarios,
        })
    }

    pub fn snapshot(&self, device: &str) -> Result<&DeviceSnapshot, DiagError> {
        self.devices
            .get(device)
            .map(|record| &record.snapshot)
            .ok_or_else(|| DiagError::DeviceNotFound(device.to_string()))
    }

    pub fn scenario(&self, name: &str) -> Result<&Scenario, DiagError> {
        self.scenarios
            .iter()
            .find(|scenario| scenario.name == name)
            .ok_or_else(|| DiagError::ScenarioNotFound(name.to_string()))
    }

    pub fn has_scenario(&self, name: &str) -> bool {
        self.scenarios.iter().any(|scenario| scenario.name == name)
    }

    /// Scenario names in catalog order.
    pub fn scenario_names(&self) -> Vec<String> {
        self.scenarios.iter().map(|s| s.name.clone()).collect()
    }

    pub fn device_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.devices.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    pub fn defaults(&self) -> &FixtureDefaults {
        &self.defaults
    }

    /// Ping result for `target` under `scenario`, or the default reply.
    pub fn ping_result(&self, scenario: &str, target: &str) -> PingResult {
        self.scenario(scenario)
            .ok()
            .and_then(|s| s.ping_results.get(target))
            .cloned()
            .unwrap_or_else(|| self.defaults.ping.clone())
    }

    /// Canned hops for `target` under `scenario`; `None` when the scenario has none.
    pub fn traceroute_hops(&self, scenario: &str, target: &str) -> Option<Vec<Hop>> {
        self.scenario(scenario)
            .ok()
            .and_then(|s| s.traceroute_results.get(target))
            .cloned()
    }

    pub fn diagnostic(&self, scenario: &str) -> DiagnosticResult {
        self.scenario(scenario)
            .ok()
            .and_then(|s| s.diagnostic_result.clone())
            .unwrap_or_else(|| self.defaults.diagnostic.clone())
    }

    /// Output of a simulated CLI command on `device`.
    pub fn command_output(&self, device: &str, command: &str) -> Result<String, DiagError> {
        let record = self
            .devices
            .get(device)
            .ok_or_else(|| DiagError::DeviceNotFound(device.to_string()))?;
        Ok(record
            .commands
            .iter()
            .find(|canned| command.contains(&canned.pattern))
            .map(|canned| canned.output.clone())
            .unwrap_or_else(|| format!("Command executed: {command}")))
    }
}

fn validate_hops(owner: &str, target: &str, hops: &[Hop]) -> Result<(), FixtureError> {
    for (idx, hop) in hops.iter().enumerate() {
        if hop.hop as usize != idx + 1 {
            return Err(FixtureError::HopNumbering {
                owner: owner.to_string(),
                target: target.to_string(),
            });
        }
        let rtt_ok = match hop.rtt {
            Some(rtt) => !hop.is_timeout() && rtt >= 0.0,
            None => hop.is_timeout(),
        };
        if !rtt_ok {
            return Err(FixtureError::HopReply {
                owner: owner.to_string(),
                target: target.to_string(),
                hop: hop.hop,
            });
        }
    }
    Ok(())
}

fn validate_ping(owner: &str, target: &str, ping: &PingResult) -> Result<(), FixtureError> {
    let loss_ok = (0.0..=100.0).contains(&ping.packet_loss);
    let rtt_ok = [ping.rtt_min, ping.rtt_avg, ping.rtt_max]
        .iter()
        .all(|rtt| *rtt >= 0.0);
    if loss_ok && rtt_ok {
        Ok(())
    } else {
        Err(FixtureError::PingOutOfRange {
            owner: owner.to_string(),
            target: target.to_string(),
        })
    }
}
