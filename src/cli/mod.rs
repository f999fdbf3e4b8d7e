pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AppConfig, StorageBackend};
use crate::database::DatabaseManager;
use crate::services::Services;

#[derive(Parser)]
#[command(name = "homeserve")]
#[command(about = "HomeServe CLI - operate directly on the configured booking storage")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Install the service catalogue and demo workers")]
    Seed(commands::seed::SeedArgs),

    #[command(about = "Administrator account management")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },

    #[command(about = "Inspect registered accounts")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "Inspect service requests")]
    Requests {
        #[command(subcommand)]
        cmd: commands::requests::RequestCommands,
    },

    #[command(about = "Platform totals: accounts, bookings, revenue")]
    Stats,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Services wired to the storage named by the environment.
pub async fn connect(config: &AppConfig) -> anyhow::Result<Services> {
    config.validate()?;
    if config.storage.backend == StorageBackend::Memory {
        tracing::warn!("STORAGE_BACKEND=memory: changes made by this command are discarded on exit");
    }
    let repo = DatabaseManager::connect(config).await?;
    Ok(Services::new(repo, config))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = Arc::new(AppConfig::from_env());
    let services = connect(&config).await?;

    match cli.command {
        Commands::Seed(args) => commands::seed::handle(args, &services, output_format).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd, &services, output_format).await,
        Commands::Users { cmd } => commands::users::handle(cmd, &services, output_format).await,
        Commands::Requests { cmd } => commands::requests::handle(cmd, &services, output_format).await,
        Commands::Stats => commands::stats::handle(&services, output_format).await,
    }
}
