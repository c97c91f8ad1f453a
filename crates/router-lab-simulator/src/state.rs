use crate::error::{DiagError, FixtureError};
use crate::fixtures::FixtureStore;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Process-wide selector of the active scenario.
///
/// Shared by handle between the query surface and every streaming channel.
/// The name is swapped as a whole under the write lock, so a reader sees
/// either the previous or the new name.
pub struct ScenarioState {
    fixtures: Arc<FixtureStore>,
    current: RwLock<String>,
}

impl ScenarioState {
    /// Starts on `baseline`, which must exist in the catalog.
    pub fn new(fixtures: Arc<FixtureStore>, baseline: &str) -> Result<Self, FixtureError> {
        if !fixtures.has_scenario(baseline) {
            return Err(FixtureError::MissingBaseline(baseline.to_string()));
        }
        Ok(Self {
            fixtures,
            current: RwLock::new(baseline.to_string()),
        })
    }

    pub fn current(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn select(&self, name: &str) -> Result<(), DiagError> {
        if !self.fixtures.has_scenario(name) {
            return Err(DiagError::ScenarioNotFound(name.to_string()));
        }
        let previous = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, name.to_string())
        };
        info!("Scenario changed: {} -> {}", previous, name);
        Ok(())
    }

    pub fn fixtures(&self) -> &Arc<FixtureStore> {
        &self.fixtures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ScenarioState {
        let fixtures = Arc::new(FixtureStore::builtin().unwrap());
        ScenarioState::new(fixtures, "healthy").unwrap()
    }

    #[test]
    fn test_select_then_current() {
        let state = state();
        assert_eq!(state.current(), "healthy");
        for name in state.fixtures().scenario_names() {
            state.select(&name).unwrap();
            assert_eq!(state.current(), name);
        }
    }

    #[test]
    fn test_unknown_selection_keeps_current() {
        let state = state();
        state.select("interface_down").unwrap();
        let err = state.select("does-not-exist").unwrap_err();
        assert_eq!(err, DiagError::ScenarioNotFound("does-not-exist".into()));
        assert_eq!(state.current(), "interface_down");
    }

    #[test]
    fn test_unknown_baseline_is_rejected() {
        let fixtures = Arc::new(FixtureStore::builtin().unwrap());
        let err = ScenarioState::new(fixtures, "chaos").err().unwrap();
        assert!(matches!(err, FixtureError::MissingBaseline(ref name) if name == "chaos"));
        assert_eq!(err.to_string(), "baseline scenario chaos is not in the catalog");
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_names() {
        let state = Arc::new(state());
        let names = state.fixtures().scenario_names();
        let writer = {
            let state = state.clone();
            let names = names.clone();
            std::thread::spawn(move || {
                for round in 0..200 {
                    state.select(&names[round % names.len()]).unwrap();
                }
            })
        };
        for _ in 0..200 {
            let seen = state.current();
            assert!(names.contains(&seen), "observed {seen}");
        }
        writer.join().unwrap();
    }
}
