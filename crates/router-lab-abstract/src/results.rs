use serde::{Deserialize, Serialize};

/// Address shown for a hop that did not answer.
pub const NO_RESPONSE: &str = "*";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResult {
    pub success: bool,
    /// Percentage, 0..=100
    pub packet_loss: f64,
    pub rtt_min: f64,
    pub rtt_avg: f64,
    pub rtt_max: f64,
}

impl PingResult {
    /// Total loss; round-trip times are zero by convention.
    pub fn unreachable() -> Self {
        Self {
            success: false,
            packet_loss: 100.0,
            rtt_min: 0.0,
            rtt_avg: 0.0,
            rtt_max: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hop {
    /// 1-based position in the path
    pub hop: u32,
    pub ip: String,
    #[serde(default)]
    pub rtt: Option<f64>,
}

impl Hop {
    pub fn reply(hop: u32, ip: impl Into<String>, rtt: f64) -> Self {
        Self {
            hop,
            ip: ip.into(),
            rtt: Some(rtt),
        }
    }

    pub fn timeout(hop: u32) -> Self {
        Self {
            hop,
            ip: NO_RESPONSE.to_string(),
            rtt: None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.ip == NO_RESPONSE
    }
}

/// Declared low to high so that `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub status: HealthStatus,
    pub summary: String,
    #[serde(default)]
    pub issues: Vec<DiagnosticIssue>,
}

impl DiagnosticResult {
    /// Highest severity among the reported issues.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|issue| issue.severity).max()
    }
}
