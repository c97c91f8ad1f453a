//! HTTP surface of the simulator.
//!
//! Maps paths onto the query service and upgrades `/ws/{client_id}` into a
//! streaming channel.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State, ws::WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use router_lab_abstract::{
    AccessList, DEFAULT_TARGET, DeviceInfo, DiagnosticResult, Hop, InterfaceState, PingResult,
    ServerEvent,
};
use router_lab_simulator::{
    ConnectRequest, ConnectionRegistry, DiagError, FixtureStore, Pacing, QueryService,
    ScenarioState, StreamingEngine,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::websocket;

const BANNER: &str = "Router Lab Network Diagnostics API";

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub queries: QueryService,
    pub engine: StreamingEngine,
    pub registry: ConnectionRegistry,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let fixtures = match &config.fixtures {
            Some(path) => FixtureStore::load(path)
                .with_context(|| format!("Failed to load fixtures from {}", path.display()))?,
            None => FixtureStore::builtin().context("Built-in fixture catalog is invalid")?,
        };
        let pacing = Pacing::new(config.pacing.clone());
        Self::new(Arc::new(fixtures), &config.baseline_scenario, pacing)
    }

    pub fn new(fixtures: Arc<FixtureStore>, baseline: &str, pacing: Pacing) -> Result<Self> {
        let state = Arc::new(
            ScenarioState::new(fixtures, baseline).context("Invalid startup scenario")?,
        );
        let registry = ConnectionRegistry::new();
        Ok(Self {
            queries: QueryService::new(state.clone(), pacing.clone()),
            engine: StreamingEngine::new(state, registry.clone(), pacing),
            registry,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/connect", post(connect))
        .route("/scenarios", get(list_scenarios))
        .route("/scenario/:name", post(select_scenario))
        .route("/router/:ip/info", get(device_info))
        .route("/router/:ip/interfaces", get(interfaces))
        .route("/router/:ip/acls", get(acls))
        .route("/router/:ip/ping", get(ping))
        .route("/router/:ip/traceroute", get(traceroute))
        .route("/router/:ip/diagnostics", get(diagnostics))
        .route("/router/:ip/execute", post(execute))
        .route("/ws/:client_id", get(open_channel))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address {bind}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);
    axum::serve(listener, router(state))
        .await
        .context("HTTP server terminated")
}

/// Declined request; rendered as `{"detail": ...}`.
pub struct ApiError(DiagError);

impl From<DiagError> for ApiError {
    fn from(err: DiagError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::BAD_REQUEST
        };
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
struct ConnectResponse {
    success: bool,
    message: String,
    session_id: Option<String>,
}

#[derive(Serialize)]
struct ScenarioList {
    scenarios: Vec<String>,
}

#[derive(Deserialize)]
struct TargetQuery {
    target: Option<String>,
}

impl TargetQuery {
    fn target(&self) -> &str {
        self.target.as_deref().unwrap_or(DEFAULT_TARGET)
    }
}

#[derive(Deserialize)]
struct CommandRequest {
    command: String,
}

async fn root() -> Json<Value> {
    Json(json!({ "message": BANNER }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connected_clients": state.registry.len(),
        "scenario": state.queries.current_scenario(),
        "devices": state.queries.devices(),
    }))
}

async fn connect(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> Json<ConnectResponse> {
    let session = state.queries.connect(&request).await;
    Json(ConnectResponse {
        success: true,
        message: format!("Successfully connected to {}", request.ip),
        session_id: Some(session.id),
    })
}

async fn list_scenarios(State(state): State<AppState>) -> Json<ScenarioList> {
    Json(ScenarioList {
        scenarios: state.queries.scenarios(),
    })
}

async fn select_scenario(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.queries.select_scenario(&name)?;
    let notified = state.registry.broadcast(&ServerEvent::ScenarioChanged {
        scenario: name.clone(),
    });
    info!("Scenario set to {} ({} channels notified)", name, notified);
    Ok(Json(json!({ "message": format!("Scenario set to {name}") })))
}

async fn device_info(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<DeviceInfo>, ApiError> {
    Ok(Json(state.queries.device_info(&ip).await?))
}

async fn interfaces(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<BTreeMap<String, InterfaceState>>, ApiError> {
    Ok(Json(state.queries.interfaces(&ip).await?))
}

async fn acls(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<Vec<AccessList>>, ApiError> {
    Ok(Json(state.queries.acls(&ip).await?))
}

async fn ping(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Query(query): Query<TargetQuery>,
) -> Result<Json<PingResult>, ApiError> {
    Ok(Json(state.queries.ping(&ip, query.target()).await?))
}

async fn traceroute(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Query(query): Query<TargetQuery>,
) -> Result<Json<Vec<Hop>>, ApiError> {
    Ok(Json(state.queries.traceroute(&ip, query.target()).await?))
}

async fn diagnostics(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<DiagnosticResult>, ApiError> {
    Ok(Json(state.queries.diagnostics(&ip).await?))
}

async fn execute(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<Value>, ApiError> {
    let output = state.queries.execute(&ip, &request.command).await?;
    Ok(Json(json!({ "output": output })))
}

async fn open_channel(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| websocket::handle_socket(socket, client_id, state.engine))
}
