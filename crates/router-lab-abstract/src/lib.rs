pub mod config;
pub mod device;
pub mod protocol;
pub mod results;
pub mod scenario;

pub use config::{PacingConfig, PacingOverride};
pub use device::{AccessList, DeviceInfo, DeviceSnapshot, InterfaceState, LinkState};
pub use protocol::{ClientCommand, CommandOutput, DEFAULT_TARGET, MalformedInput, ServerEvent};
pub use results::{
    DiagnosticIssue, DiagnosticResult, HealthStatus, Hop, NO_RESPONSE, PingResult, Severity,
};
pub use scenario::{InterfaceOverride, Scenario};
