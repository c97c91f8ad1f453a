use router_lab_abstract::{CommandOutput, Hop, PacingConfig, ServerEvent};
use router_lab_simulator::{
    ConnectionRegistry, FixtureStore, Pacing, QueryService, ScenarioState, StreamingEngine,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct Harness {
    engine: StreamingEngine,
    state: Arc<ScenarioState>,
    registry: ConnectionRegistry,
}

fn harness(pacing: Pacing) -> Harness {
    let fixtures = Arc::new(FixtureStore::builtin().unwrap());
    let state = Arc::new(ScenarioState::new(fixtures, "healthy").unwrap());
    let registry = ConnectionRegistry::new();
    let engine = StreamingEngine::new(state.clone(), registry.clone(), pacing);
    Harness {
        engine,
        state,
        registry,
    }
}

fn connect(h: &Harness, client: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    h.registry.register(client, tx);
    rx
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_streamed_ping_emits_start_five_probes_result() {
    let h = harness(Pacing::immediate());
    let mut rx = connect(&h, "c1");

    for target in ["10.0.0.2", "192.0.2.44"] {
        let frame = json!({"command": "ping", "target": target}).to_string();
        h.engine.handle_text("c1", &frame).await.unwrap();
        let events = drain(&mut rx);

        assert_eq!(events.len(), 7);
        assert_eq!(
            events[0],
            ServerEvent::CommandStart {
                command: format!("ping {target}")
            }
        );
        for (idx, event) in events[1..6].iter().enumerate() {
            assert_eq!(
                event,
                &ServerEvent::PingProgress {
                    sequence: idx as u32 + 1,
                    success: true
                }
            );
        }
        assert!(matches!(
            &events[6],
            ServerEvent::CommandResult { command, result: CommandOutput::Ping(r) }
                if command == "ping" && r.success
        ));
    }
}

#[tokio::test]
async fn test_streamed_traceroute_follows_hop_order() {
    let h = harness(Pacing::immediate());
    let mut rx = connect(&h, "c1");
    h.state.select("interface_down").unwrap();

    h.engine
        .handle_text("c1", r#"{"command":"traceroute","target":"10.0.0.2"}"#)
        .await
        .unwrap();
    let events = drain(&mut rx);

    let expected = vec![
        Hop::reply(1, "192.168.1.1", 0.5),
        Hop::timeout(2),
        Hop::timeout(3),
    ];
    assert_eq!(events.len(), expected.len() + 2);
    for (event, hop) in events[1..4].iter().zip(&expected) {
        assert_eq!(event, &ServerEvent::TracerouteProgress { hop: hop.clone() });
    }
    assert_eq!(
        events[4],
        ServerEvent::CommandResult {
            command: "traceroute".into(),
            result: CommandOutput::Traceroute(expected),
        }
    );
}

#[tokio::test]
async fn test_streamed_traceroute_unknown_target_is_empty() {
    let h = harness(Pacing::immediate());
    let mut rx = connect(&h, "c1");
    h.engine
        .handle_text("c1", r#"{"command":"traceroute","target":"8.8.8.8"}"#)
        .await
        .unwrap();
    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1],
        ServerEvent::CommandResult {
            command: "traceroute".into(),
            result: CommandOutput::Traceroute(vec![]),
        }
    );

    // The request/response path synthesizes a path for the same target.
    let svc = QueryService::new(h.state.clone(), Pacing::immediate());
    assert_eq!(svc.traceroute("192.168.1.1", "8.8.8.8").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_malformed_and_unknown_frames_keep_channel_open() {
    let h = harness(Pacing::immediate());
    let mut rx = connect(&h, "c1");

    h.engine.handle_text("c1", "not json").await.unwrap();
    h.engine
        .handle_text("c1", r#"{"command":"reboot"}"#)
        .await
        .unwrap();
    h.engine
        .handle_text("c1", r#"{"command":"set_scenario","scenario":"nope"}"#)
        .await
        .unwrap();
    h.engine
        .handle_text("c1", r#"{"command":"set_scenario","scenario":"ip_misconfigured"}"#)
        .await
        .unwrap();

    assert_eq!(
        drain(&mut rx),
        vec![
            ServerEvent::Error {
                message: "Invalid JSON: not json".into()
            },
            ServerEvent::Message {
                content: "Received command: reboot".into()
            },
            ServerEvent::Error {
                message: "Invalid scenario: nope".into()
            },
            ServerEvent::ScenarioChanged {
                scenario: "ip_misconfigured".into()
            },
        ]
    );
    assert!(h.registry.contains("c1"));
    assert_eq!(h.state.current(), "ip_misconfigured");
}

#[tokio::test]
async fn test_events_go_only_to_originating_client() {
    let h = harness(Pacing::immediate());
    let mut mine = connect(&h, "mine");
    let mut other = connect(&h, "other");

    h.engine
        .handle_text("mine", r#"{"command":"ping"}"#)
        .await
        .unwrap();
    assert_eq!(drain(&mut mine).len(), 7);
    assert!(drain(&mut other).is_empty());
}

#[tokio::test]
async fn test_serve_processes_frames_in_order_until_close() {
    let h = harness(Pacing::immediate());
    let mut rx = connect(&h, "c1");
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    inbound_tx
        .send(r#"{"command":"ping"}"#.to_string())
        .unwrap();
    inbound_tx
        .send(r#"{"command":"traceroute"}"#.to_string())
        .unwrap();
    drop(inbound_tx);

    h.engine.serve("c1", inbound_rx).await;
    let kinds: Vec<&str> = drain(&mut rx).iter().map(ServerEvent::kind).collect();
    assert_eq!(kinds.len(), 7 + 5);
    assert_eq!(kinds[6], "command_result");
    assert_eq!(kinds[7], "command_start");
    assert_eq!(kinds.last(), Some(&"command_result"));
}

#[tokio::test]
async fn test_disconnect_mid_sequence_stops_emission() {
    let pacing = Pacing::new(PacingConfig {
        ping_step_ms: 20,
        ..PacingConfig::immediate()
    });
    let h = harness(pacing);
    let mut rx = connect(&h, "leaver");

    let engine = h.engine.clone();
    let task = tokio::spawn(async move {
        engine
            .handle_text("leaver", r#"{"command":"ping"}"#)
            .await
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    h.registry.deregister("leaver");
    let outcome = task.await.unwrap();

    assert!(outcome.is_err());
    let events = drain(&mut rx);
    assert!(events.len() < 7);
    assert!(!events.iter().any(|e| e.kind() == "command_result"));
}

#[tokio::test]
async fn test_slow_channel_does_not_block_another() {
    let pacing = Pacing::new(PacingConfig {
        traceroute_step_ms: 200,
        ..PacingConfig::immediate()
    });
    let h = harness(pacing);
    let _slow_rx = connect(&h, "slow");
    let mut fast_rx = connect(&h, "fast");

    let engine = h.engine.clone();
    let slow = tokio::spawn(async move {
        engine
            .handle_text("slow", r#"{"command":"traceroute"}"#)
            .await
    });

    tokio::time::timeout(
        Duration::from_millis(150),
        h.engine
            .handle_text("fast", r#"{"command":"set_scenario","scenario":"healthy"}"#),
    )
    .await
    .expect("fast channel should not wait on the slow one")
    .unwrap();
    assert_eq!(drain(&mut fast_rx).len(), 1);

    slow.await.unwrap().unwrap();
}
