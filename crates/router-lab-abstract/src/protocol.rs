//! Messages exchanged over a streaming channel.
//!
//! Inbound frames are JSON objects carrying a `command` tag; outbound frames are
//! JSON objects carrying a `type` tag.

use crate::results::{Hop, PingResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Target used by `ping` / `traceroute` when the client omits one.
pub const DEFAULT_TARGET: &str = "10.0.0.2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Ping { target: String },
    Traceroute { target: String },
    SetScenario { scenario: Option<String> },
    /// Any other tag, or no tag at all. Acknowledged and otherwise ignored.
    Unrecognized { tag: Option<String> },
}

/// A frame that is not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedInput {
    pub raw: String,
}

impl fmt::Display for MalformedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid JSON: {}", self.raw)
    }
}

impl std::error::Error for MalformedInput {}

impl ClientCommand {
    pub fn parse(text: &str) -> Result<Self, MalformedInput> {
        let malformed = || MalformedInput {
            raw: text.to_string(),
        };
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => Ok(Self::from_fields(&fields)),
            _ => Err(malformed()),
        }
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
        let target = || text("target").unwrap_or_else(|| DEFAULT_TARGET.to_string());

        match fields.get("command") {
            Some(Value::String(tag)) => match tag.as_str() {
                "ping" => ClientCommand::Ping { target: target() },
                "traceroute" => ClientCommand::Traceroute { target: target() },
                "set_scenario" => ClientCommand::SetScenario {
                    scenario: text("scenario"),
                },
                other => ClientCommand::Unrecognized {
                    tag: Some(other.to_string()),
                },
            },
            None | Some(Value::Null) => ClientCommand::Unrecognized { tag: None },
            Some(other) => ClientCommand::Unrecognized {
                tag: Some(other.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Ping(PingResult),
    Traceroute(Vec<Hop>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    CommandStart { command: String },
    PingProgress { sequence: u32, success: bool },
    TracerouteProgress { hop: Hop },
    CommandResult { command: String, result: CommandOutput },
    ScenarioChanged { scenario: String },
    Error { message: String },
    Message { content: String },
}

impl ServerEvent {
    pub fn malformed(input: &MalformedInput) -> Self {
        ServerEvent::Error {
            message: input.to_string(),
        }
    }

    pub fn invalid_scenario(name: Option<&str>) -> Self {
        ServerEvent::Error {
            message: format!("Invalid scenario: {}", name.unwrap_or("null")),
        }
    }

    pub fn acknowledge(tag: Option<&str>) -> Self {
        ServerEvent::Message {
            content: format!("Received command: {}", tag.unwrap_or("null")),
        }
    }

    /// Wire tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::CommandStart { .. } => "command_start",
            ServerEvent::PingProgress { .. } => "ping_progress",
            ServerEvent::TracerouteProgress { .. } => "traceroute_progress",
            ServerEvent::CommandResult { .. } => "command_result",
            ServerEvent::ScenarioChanged { .. } => "scenario_changed",
            ServerEvent::Error { .. } => "error",
            ServerEvent::Message { .. } => "message",
        }
    }
}
