use crate::error::DiagError;
use crate::fixtures::FixtureStore;
use crate::pacing::{Latency, Pacing, pause};
use crate::registry::{ConnectionRegistry, Delivery};
use crate::state::ScenarioState;
use router_lab_abstract::{ClientCommand, CommandOutput, ServerEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Number of `ping_progress` events emitted by a streamed ping.
pub const PING_PROBES: u32 = 5;

/// Lifecycle of one streaming channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    AwaitingMessage,
    Dispatch,
    Emitting,
    Closed,
}

/// An outbound event and the pause that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub event: ServerEvent,
    pub pause_after: Duration,
}

impl Step {
    fn now(event: ServerEvent) -> Self {
        Self {
            event,
            pause_after: Duration::ZERO,
        }
    }

    fn paced(event: ServerEvent, pause_after: Duration) -> Self {
        Self { event, pause_after }
    }
}

/// Interprets streamed commands and answers on the originating channel.
#[derive(Clone)]
pub struct StreamingEngine {
    state: Arc<ScenarioState>,
    registry: ConnectionRegistry,
    pacing: Pacing,
}

impl StreamingEngine {
    pub fn new(state: Arc<ScenarioState>, registry: ConnectionRegistry, pacing: Pacing) -> Self {
        Self {
            state,
            registry,
            pacing,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    fn fixtures(&self) -> &FixtureStore {
        self.state.fixtures()
    }

    /// Resolves `command` against the active scenario and returns the events
    /// to emit, in order.
    ///
    /// Results are captured here, once; a scenario change while the steps are
    /// being emitted does not alter them. `set_scenario` performs its
    /// selection as part of planning.
    pub fn plan(&self, command: ClientCommand) -> Vec<Step> {
        match command {
            ClientCommand::Ping { target } => {
                let scenario = self.state.current();
                let result = self.fixtures().ping_result(&scenario, &target);
                let gap = self.pacing.delay(Latency::PingStep);

                let mut steps = vec![Step::now(ServerEvent::CommandStart {
                    command: format!("ping {target}"),
                })];
                steps.extend((1..=PING_PROBES).map(|sequence| {
                    Step::paced(
                        ServerEvent::PingProgress {
                            sequence,
                            success: result.success,
                        },
                        gap,
                    )
                }));
                steps.push(Step::now(ServerEvent::CommandResult {
                    command: "ping".into(),
                    result: CommandOutput::Ping(result),
                }));
                steps
            }
            ClientCommand::Traceroute { target } => {
                let scenario = self.state.current();
                // No synthesized path here, unlike the request/response traceroute.
                let hops = self
                    .fixtures()
                    .traceroute_hops(&scenario, &target)
                    .unwrap_or_default();
                let gap = self.pacing.delay(Latency::TracerouteStep);

                let mut steps = vec![Step::now(ServerEvent::CommandStart {
                    command: format!("traceroute {target}"),
                })];
                steps.extend(hops.iter().map(|hop| {
                    Step::paced(ServerEvent::TracerouteProgress { hop: hop.clone() }, gap)
                }));
                steps.push(Step::now(ServerEvent::CommandResult {
                    command: "traceroute".into(),
                    result: CommandOutput::Traceroute(hops),
                }));
                steps
            }
            ClientCommand::SetScenario { scenario } => {
                let Some(name) = scenario else {
                    warn!("set_scenario without a scenario name");
                    return vec![Step::now(ServerEvent::invalid_scenario(None))];
                };
                match self.state.select(&name) {
                    Ok(()) => vec![Step::now(ServerEvent::ScenarioChanged { scenario: name })],
                    Err(_) => {
                        warn!("{}", DiagError::InvalidSelection(name.clone()));
                        vec![Step::now(ServerEvent::invalid_scenario(Some(&name)))]
                    }
                }
            }
            ClientCommand::Unrecognized { tag } => {
                vec![Step::now(ServerEvent::acknowledge(tag.as_deref()))]
            }
        }
    }

    /// Handles one inbound frame from `client`.
    ///
    /// Malformed frames are answered with a notice. An `Err` means the
    /// channel went away while the answer was being emitted.
    pub async fn handle_text(&self, client: &str, text: &str) -> Result<(), DiagError> {
        let steps = match ClientCommand::parse(text) {
            Ok(command) => {
                debug!("[{}] command {:?}", client, command);
                self.plan(command)
            }
            Err(bad) => {
                warn!("[{}] {}", client, DiagError::from(bad.clone()));
                vec![Step::now(ServerEvent::malformed(&bad))]
            }
        };
        self.emit(client, steps).await
    }

    async fn emit(&self, client: &str, steps: Vec<Step>) -> Result<(), DiagError> {
        for step in steps {
            if self.registry.send_to(client, &step.event) == Delivery::NoSuchClient {
                return Err(DiagError::transport(client, "channel closed mid-sequence"));
            }
            pause(step.pause_after).await;
        }
        Ok(())
    }

    /// Processes frames from `inbound` one at a time until the channel closes.
    ///
    /// Each command's events, including their pauses, are emitted in full
    /// before the next frame is read.
    pub async fn serve(&self, client: &str, mut inbound: mpsc::UnboundedReceiver<String>) {
        let mut channel = ChannelState::Idle;
        transition(client, &mut channel, ChannelState::AwaitingMessage);

        while let Some(text) = inbound.recv().await {
            transition(client, &mut channel, ChannelState::Dispatch);
            transition(client, &mut channel, ChannelState::Emitting);
            if let Err(err) = self.handle_text(client, &text).await {
                warn!("{}", err);
                break;
            }
            transition(client, &mut channel, ChannelState::AwaitingMessage);
        }

        transition(client, &mut channel, ChannelState::Closed);
    }
}

fn transition(client: &str, current: &mut ChannelState, next: ChannelState) {
    debug!("[{}] {:?} -> {:?}", client, current, next);
    *current = next;
}
