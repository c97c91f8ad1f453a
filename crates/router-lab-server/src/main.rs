mod config;
mod server;
mod websocket;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{ServerConfig, load_override};
use router_lab_abstract::PacingConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scenario-driven router diagnostics simulator")]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8000.
    #[arg(long)]
    bind: Option<String>,

    /// Fixture catalog to load instead of the built-in one.
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Scenario active at startup.
    #[arg(long)]
    baseline: Option<String>,

    /// Answer immediately instead of imitating device latency.
    #[arg(long, default_value_t = false)]
    no_delay: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    info!("router-lab-server starting…");

    let config = args.resolve_config()?;
    info!(
        "Baseline scenario {}, fixtures {}",
        config.baseline_scenario,
        config
            .fixtures
            .as_ref()
            .map_or_else(|| "built-in".to_string(), |p| p.display().to_string())
    );

    let state = server::AppState::from_config(&config)?;
    server::serve(&config.bind, state).await
}

impl Args {
    /// Defaults, then the config file, then command-line flags.
    fn resolve_config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::default();
        if let Some(path) = &self.config {
            load_override(path)?.apply_to(&mut config);
        }
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(path) = &self.fixtures {
            config.fixtures = Some(path.clone());
        }
        if let Some(name) = &self.baseline {
            config.baseline_scenario = name.clone();
        }
        if self.no_delay {
            config.pacing = PacingConfig::immediate();
        }
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
