use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

const SESSION_ID_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    #[default]
    Ssh,
    Telnet,
    Snmp,
}

/// Credentials are accepted and never checked.
#[derive(Clone, Deserialize)]
pub struct ConnectRequest {
    pub ip: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub enable_password: Option<String>,
    #[serde(default)]
    pub connection_type: ConnectionType,
}

impl ConnectRequest {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            username: None,
            password: None,
            enable_password: None,
            connection_type: ConnectionType::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub device: String,
    pub connection_type: ConnectionType,
    pub connected_at_ms: u64,
    /// Scenario that was active when the session opened.
    pub scenario: String,
}

#[derive(Default)]
pub struct SessionTable {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, request: &ConnectRequest, scenario: &str) -> Session {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rng = rand::rng();
        let id = unused_id(&sessions, || session_id(&mut rng));

        let session = Session {
            id: id.clone(),
            device: request.ip.clone(),
            connection_type: request.connection_type,
            connected_at_ms: unix_millis(),
            scenario: scenario.to_string(),
        };
        info!(
            "Opened {} over {:?} to {}",
            session.id, session.connection_type, session.device
        );
        sessions.insert(id, session.clone());
        session
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Draws ids until one is free. After `SESSION_ID_ATTEMPTS` collisions the
/// last draw gets the first free numeric suffix.
fn unused_id(sessions: &HashMap<String, Session>, mut draw: impl FnMut() -> String) -> String {
    let mut id = draw();
    for _ in 1..SESSION_ID_ATTEMPTS {
        if !sessions.contains_key(&id) {
            return id;
        }
        id = draw();
    }
    if !sessions.contains_key(&id) {
        return id;
    }

    warn!("{} session id draws collided; suffixing {}", SESSION_ID_ATTEMPTS, id);
    let suffixed = (1..)
        .map(|n| format!("{id}-{n}"))
        .find(|candidate| !sessions.contains_key(candidate));
    suffixed.unwrap_or(id)
}

fn session_id(rng: &mut impl Rng) -> String {
    format!("session-{}", rng.random_range(1000..=9999))
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
