use router_lab_abstract::MalformedInput;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the query surface and the streaming engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiagError {
    #[error("Router {0} not found")]
    DeviceNotFound(String),
    #[error("Scenario {0} not found")]
    ScenarioNotFound(String),
    #[error("Invalid JSON: {0}")]
    MalformedInput(String),
    #[error("Invalid scenario: {0}")]
    InvalidSelection(String),
    #[error("channel for client {client} failed: {reason}")]
    TransportFailure { client: String, reason: String },
}

impl DiagError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DiagError::DeviceNotFound(_) | DiagError::ScenarioNotFound(_)
        )
    }

    pub(crate) fn transport(client: &str, reason: impl Into<String>) -> Self {
        DiagError::TransportFailure {
            client: client.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<MalformedInput> for DiagError {
    fn from(input: MalformedInput) -> Self {
        DiagError::MalformedInput(input.raw)
    }
}

/// Problems found while loading a fixture catalog.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture catalog")]
    Parse(#[from] toml::de::Error),
    #[error("device {0} is defined more than once")]
    DuplicateDevice(String),
    #[error("interface {interface} is defined more than once on device {device}")]
    DuplicateInterface { device: String, interface: String },
    #[error("scenario {0} is defined more than once")]
    DuplicateScenario(String),
    #[error("{owner}: traceroute to {target} must number its hops 1..n")]
    HopNumbering { owner: String, target: String },
    #[error("{owner}: hop {hop} towards {target} must carry an rtt exactly when it answered")]
    HopReply {
        owner: String,
        target: String,
        hop: u32,
    },
    #[error("{owner}: ping result for {target} is out of range")]
    PingOutOfRange { owner: String, target: String },
    #[error("baseline scenario {0} is not in the catalog")]
    MissingBaseline(String),
}
