use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod start;
pub mod validate;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Application {
    #[command(subcommand)]
    pub command: SubCommands,
}

#[derive(Subcommand)]
pub enum SubCommands {
    /// Start the HTTP API that manages the Prometheus scrape jobs and the
    /// blackbox exporter modules.
    Start(start::Arguments),

    /// Load the configuration and both agent documents, then exit.
    Validate(validate::Arguments),
}

pub async fn handle_command(app: Application) -> Result<()> {
    match app.command {
        SubCommands::Start(args) => start::handle_command(args).await,
        SubCommands::Validate(args) => validate::handle_command(args).await,
    }
}
