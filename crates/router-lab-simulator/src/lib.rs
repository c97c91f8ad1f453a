pub mod compose;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod pacing;
pub mod query;
pub mod registry;
pub mod session;
pub mod state;

pub use compose::compose;
pub use engine::{ChannelState, PING_PROBES, Step, StreamingEngine};
pub use error::{DiagError, FixtureError};
pub use fixtures::{CannedCommand, FixtureDefaults, FixtureStore};
pub use pacing::{Latency, Pacing};
pub use query::QueryService;
pub use registry::{ChannelClosed, ClientSink, ConnectionRegistry, Delivery, Generation};
pub use session::{ConnectRequest, ConnectionType, Session, SessionTable};
pub use state::ScenarioState;
