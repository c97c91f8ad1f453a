//! Request/response operations over the shared scenario state.

use crate::compose::compose;
use crate::error::DiagError;
use crate::fixtures::FixtureStore;
use crate::pacing::{Latency, Pacing};
use crate::session::{ConnectRequest, Session, SessionTable};
use crate::state::ScenarioState;
use router_lab_abstract::{
    AccessList, DeviceInfo, DeviceSnapshot, DiagnosticResult, Hop, InterfaceState, PingResult,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct QueryService {
    state: Arc<ScenarioState>,
    sessions: Arc<SessionTable>,
    pacing: Pacing,
}

impl QueryService {
    pub fn new(state: Arc<ScenarioState>, pacing: Pacing) -> Self {
        Self {
            state,
            sessions: Arc::new(SessionTable::new()),
            pacing,
        }
    }

    fn fixtures(&self) -> &FixtureStore {
        self.state.fixtures()
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn current_scenario(&self) -> String {
        self.state.current()
    }

    /// Device view under the active scenario.
    fn composed(&self, device: &str) -> Result<DeviceSnapshot, DiagError> {
        compose(self.fixtures(), device, &self.state.current())
    }

    pub async fn device_info(&self, device: &str) -> Result<DeviceInfo, DiagError> {
        let info = self.fixtures().snapshot(device)?.info.clone();
        self.pacing.wait(Latency::Query).await;
        Ok(info)
    }

    pub async fn interfaces(
        &self,
        device: &str,
    ) -> Result<BTreeMap<String, InterfaceState>, DiagError> {
        let view = self.composed(device)?;
        self.pacing.wait(Latency::Query).await;
        Ok(view.interfaces)
    }

    pub async fn acls(&self, device: &str) -> Result<Vec<AccessList>, DiagError> {
        let view = self.composed(device)?;
        self.pacing.wait(Latency::Query).await;
        Ok(view.acls)
    }

    pub async fn ping(&self, device: &str, target: &str) -> Result<PingResult, DiagError> {
        self.fixtures().snapshot(device)?;
        self.pacing.wait(Latency::Ping).await;
        let scenario = self.state.current();
        debug!("ping {} from {} under {}", target, device, scenario);
        Ok(self.fixtures().ping_result(&scenario, target))
    }

    /// Falls back to the synthesized default path when the scenario has no
    /// canned hops for `target`.
    pub async fn traceroute(&self, device: &str, target: &str) -> Result<Vec<Hop>, DiagError> {
        self.fixtures().snapshot(device)?;
        self.pacing.wait(Latency::Traceroute).await;
        let scenario = self.state.current();
        debug!("traceroute {} from {} under {}", target, device, scenario);
        Ok(self
            .fixtures()
            .traceroute_hops(&scenario, target)
            .unwrap_or_else(|| self.fixtures().defaults().traceroute(target)))
    }

    pub async fn diagnostics(&self, device: &str) -> Result<DiagnosticResult, DiagError> {
        self.fixtures().snapshot(device)?;
        self.pacing.wait(Latency::Diagnostics).await;
        let result = self.fixtures().diagnostic(&self.state.current());
        debug!(
            "Diagnostics for {}: {:?}, {} issue(s), worst {:?}",
            device,
            result.status,
            result.issues.len(),
            result.worst_severity()
        );
        Ok(result)
    }

    /// Addresses of every simulated device, sorted.
    pub fn devices(&self) -> Vec<String> {
        self.fixtures().device_addresses()
    }

    pub fn scenarios(&self) -> Vec<String> {
        self.fixtures().scenario_names()
    }

    pub fn select_scenario(&self, name: &str) -> Result<(), DiagError> {
        self.state.select(name)
    }

    /// Always succeeds; the device is not contacted.
    pub async fn connect(&self, request: &ConnectRequest) -> Session {
        let session = self.sessions.open(request, &self.state.current());
        self.pacing.wait(Latency::Connect).await;
        session
    }

    pub async fn execute(&self, device: &str, command: &str) -> Result<String, DiagError> {
        let output = self.fixtures().command_output(device, command)?;
        self.pacing.wait(Latency::Execute).await;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_lab_abstract::{HealthStatus, LinkState, NO_RESPONSE};

    const ROUTER: &str = "192.168.1.1";

    fn service() -> QueryService {
        let fixtures = Arc::new(FixtureStore::builtin().unwrap());
        let state = Arc::new(ScenarioState::new(fixtures, "healthy").unwrap());
        QueryService::new(state, Pacing::immediate())
    }

    #[tokio::test]
    async fn test_unknown_device_is_not_found_everywhere() {
        let svc = service();
        let ghost = "10.10.10.10";
        let expected = DiagError::DeviceNotFound(ghost.into());
        assert_eq!(svc.device_info(ghost).await.unwrap_err(), expected);
        assert_eq!(svc.interfaces(ghost).await.unwrap_err(), expected);
        assert_eq!(svc.acls(ghost).await.unwrap_err(), expected);
        assert_eq!(svc.ping(ghost, "10.0.0.2").await.unwrap_err(), expected);
        assert_eq!(svc.traceroute(ghost, "10.0.0.2").await.unwrap_err(), expected);
        assert_eq!(svc.diagnostics(ghost).await.unwrap_err(), expected);
        assert_eq!(svc.execute(ghost, "show run").await.unwrap_err(), expected);
    }

    #[tokio::test]
    async fn test_interfaces_follow_selected_scenario() {
        let svc = service();
        svc.select_scenario("interface_down").unwrap();
        let ifaces = svc.interfaces(ROUTER).await.unwrap();
        assert_eq!(ifaces["GigabitEthernet1"].status, LinkState::Down);
        assert_eq!(ifaces["GigabitEthernet1"].protocol, LinkState::Down);
        assert_eq!(ifaces["GigabitEthernet0"].status, LinkState::Up);
        assert_eq!(ifaces["GigabitEthernet0"].protocol, LinkState::Up);
    }

    #[tokio::test]
    async fn test_acls_follow_selected_scenario() {
        let svc = service();
        svc.select_scenario("acl_misconfigured").unwrap();
        let names: Vec<String> = svc
            .acls(ROUTER)
            .await
            .unwrap()
            .into_iter()
            .map(|acl| acl.name)
            .collect();
        assert_eq!(names, vec!["ALLOW_WEB", "BLOCK_ALL"]);
    }

    #[tokio::test]
    async fn test_traceroute_synthesizes_unknown_targets() {
        let svc = service();
        let hops = svc.traceroute(ROUTER, "8.8.4.4").await.unwrap();
        assert_eq!(hops.len(), 3);
        assert_eq!(hops[0], Hop::reply(1, "192.168.1.1", 0.5));
        assert_eq!(hops[2].ip, "8.8.4.4");

        svc.select_scenario("ip_misconfigured").unwrap();
        let hops = svc.traceroute(ROUTER, "10.0.0.2").await.unwrap();
        assert_eq!(hops[1].ip, "10.0.0.254");
        assert_eq!(hops[2].ip, NO_RESPONSE);
        assert!(hops[2].rtt.is_none());
    }

    #[tokio::test]
    async fn test_ping_and_diagnostics() {
        let svc = service();
        let ok = svc.ping(ROUTER, "10.0.0.2").await.unwrap();
        assert_eq!(ok.rtt_max, 3.7);
        assert_eq!(
            svc.diagnostics(ROUTER).await.unwrap().status,
            HealthStatus::Healthy
        );

        svc.select_scenario("acl_misconfigured").unwrap();
        assert!(!svc.ping(ROUTER, "10.0.0.2").await.unwrap().success);
        let verdict = svc.diagnostics(ROUTER).await.unwrap();
        assert_eq!(verdict.status, HealthStatus::Warning);
        assert_eq!(verdict.issues[0].kind, "acl_too_restrictive");
    }

    #[tokio::test]
    async fn test_select_unknown_scenario() {
        let svc = service();
        assert_eq!(
            svc.select_scenario("does-not-exist").unwrap_err(),
            DiagError::ScenarioNotFound("does-not-exist".into())
        );
        assert_eq!(svc.current_scenario(), "healthy");
    }

    #[tokio::test]
    async fn test_connect_never_fails() {
        let svc = service();
        let session = svc.connect(&ConnectRequest::new("172.31.0.1")).await;
        assert!(session.id.starts_with("session-"));
        assert_eq!(svc.sessions().get(&session.id).unwrap().device, "172.31.0.1");
    }
}
