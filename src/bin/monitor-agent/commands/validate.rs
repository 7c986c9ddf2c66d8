use crate::server::AppState;
use anyhow::Result;
use clap::Parser;
use monitor_agent::config::load_config;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Clone)]
pub struct Arguments {
    /// Path of the monitor-agent configuration file.
    #[clap(
        short,
        long,
        env = "MONITOR_AGENT_CONFIG",
        default_value = "/etc/monitor-agent/config.yml"
    )]
    config: PathBuf,
}

pub async fn handle_command(args: Arguments) -> Result<()> {
    let config = load_config(&args.config)?;
    let state = AppState::load(&config)?;

    let scrape_jobs = state.scrape_configs.read(|configs| configs.len()).await;
    let modules = state.modules.read(|modules| modules.len()).await;

    info!(
        scrape_jobs,
        modules,
        prometheus = ?config.prometheus_agent.config_path,
        blackbox = ?config.blackbox_agent.config_path,
        "Configuration is valid"
    );
    Ok(())
}
