use serde::{Deserialize, Serialize};

/// Simulated device latency, in milliseconds.
///
/// The `*_step_ms` values space out streamed progress events; the rest delay
/// request/response operations before they answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    pub ping_step_ms: u64,
    pub traceroute_step_ms: u64,
    pub connect_ms: u64,
    pub query_ms: u64,
    pub ping_ms: u64,
    pub traceroute_ms: u64,
    pub diagnostics_ms: u64,
    pub execute_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            ping_step_ms: 300,
            traceroute_step_ms: 500,
            connect_ms: 1000,
            query_ms: 500,
            ping_ms: 1500,
            traceroute_ms: 2000,
            diagnostics_ms: 3000,
            execute_ms: 1000,
        }
    }
}

impl PacingConfig {
    /// No delays at all; event order and count are unchanged.
    pub fn immediate() -> Self {
        Self {
            ping_step_ms: 0,
            traceroute_step_ms: 0,
            connect_ms: 0,
            query_ms: 0,
            ping_ms: 0,
            traceroute_ms: 0,
            diagnostics_ms: 0,
            execute_ms: 0,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PacingOverride {
    pub ping_step_ms: Option<u64>,
    pub traceroute_step_ms: Option<u64>,
    pub connect_ms: Option<u64>,
    pub query_ms: Option<u64>,
    pub ping_ms: Option<u64>,
    pub traceroute_ms: Option<u64>,
    pub diagnostics_ms: Option<u64>,
    pub execute_ms: Option<u64>,
}

impl PacingOverride {
    pub fn apply_to(&self, config: &mut PacingConfig) {
        if let Some(v) = self.ping_step_ms {
            config.ping_step_ms = v;
        }
        if let Some(v) = self.traceroute_step_ms {
            config.traceroute_step_ms = v;
        }
        if let Some(v) = self.connect_ms {
            config.connect_ms = v;
        }
        if let Some(v) = self.query_ms {
            config.query_ms = v;
        }
        if let Some(v) = self.ping_ms {
            config.ping_ms = v;
        }
        if let Some(v) = self.traceroute_ms {
            config.traceroute_ms = v;
        }
        if let Some(v) = self.diagnostics_ms {
            config.diagnostics_ms = v;
        }
        if let Some(v) = self.execute_ms {
            config.execute_ms = v;
        }
    }
}
