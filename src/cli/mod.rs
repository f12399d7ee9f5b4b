pub mod commands;

use clap::{Parser, Subcommand};

use crate::config;

#[derive(Parser)]
#[command(name = "dscatalog")]
#[command(about = "DSCatalog - product catalog backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve {
        #[arg(long, help = "Listen port (overrides API_PORT)")]
        port: Option<u16>,

        #[arg(long, help = "Use the in-memory store instead of PostgreSQL")]
        in_memory: bool,

        #[arg(long, help = "Insert demo catalog and accounts before serving")]
        seed: bool,
    },

    #[command(about = "Apply database migrations")]
    Migrate,

    #[command(about = "Apply migrations and insert demo data")]
    Seed,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::config().clone();
    config.validate().map_err(anyhow::Error::msg)?;
    tracing::info!("Starting DSCatalog in {:?} mode", config.environment);

    let command = cli.command.unwrap_or(Commands::Serve {
        port: None,
        in_memory: false,
        seed: false,
    });

    match command {
        Commands::Serve { port, in_memory, seed } => {
            commands::serve::handle(config, port, in_memory, seed).await
        }
        Commands::Migrate => commands::database::migrate(&config).await,
        Commands::Seed => commands::database::seed(&config).await,
    }
}
