use anyhow::{Context, Result};
use router_lab_abstract::{PacingConfig, PacingOverride};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Scenario active at startup.
    pub baseline_scenario: String,
    /// External fixture catalog; the built-in one is used when unset.
    pub fixtures: Option<PathBuf>,
    pub pacing: PacingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            baseline_scenario: "healthy".to_string(),
            fixtures: None,
            pacing: PacingConfig::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfigOverride {
    pub bind: Option<String>,
    pub baseline_scenario: Option<String>,
    pub fixtures: Option<PathBuf>,
    #[serde(default)]
    pub pacing: PacingOverride,
}

impl ServerConfigOverride {
    pub fn apply_to(&self, config: &mut ServerConfig) {
        if let Some(v) = &self.bind {
            config.bind = v.clone();
        }
        if let Some(v) = &self.baseline_scenario {
            config.baseline_scenario = v.clone();
        }
        if let Some(v) = &self.fixtures {
            config.fixtures = Some(v.clone());
        }
        self.pacing.apply_to(&mut config.pacing);
    }
}

pub fn load_override(path: &Path) -> Result<ServerConfigOverride> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}
