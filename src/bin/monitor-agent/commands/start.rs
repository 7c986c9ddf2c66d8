use crate::server::{start_web_server, AppState};
use anyhow::{bail, Result};
use clap::Parser;
use monitor_agent::config::load_config;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::select;
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

    /// The listen address for the HTTP API.
    #[clap(short, long, env, default_value = "0.0.0.0:8080")]
    listen_address: SocketAddr,
}

pub async fn handle_command(args: Arguments) -> Result<()> {
    let config = load_config(&args.config)?;
    let state = AppState::load(&config)?;

    let listen_address = args.listen_address;
    let web_server_task = async move { start_web_server(&listen_address, state).await };

    select! {
        biased;

        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT signal received, exiting...");
            Ok(())
        }

        Err(err) = web_server_task => {
            bail!("Web server exited with an error: {err:?}");
        }

        else => {
            Ok(())
        }
    }
}
