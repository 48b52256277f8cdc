//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(
    name = "dealintel",
    version,
    about = "Sales meeting intelligence and deal enablement service"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value_t = 8787, env = "PORT")]
        port: u16,
    },
    /// Create the database schema
    InitDb,
}

/// Peek at verbosity before clap runs; logging is initialized first.
pub fn is_verbose() -> bool {
    std::env::args().any(|a| a == "-v" || a == "--verbose")
}

/// Parse arguments and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            settings.ensure_data_dir()?;
            crate::server::serve(&settings, &host, port).await
        }
        Commands::InitDb => {
            settings.ensure_data_dir()?;
            let ctx = settings.create_db_context();
            ctx.init_schema().await?;
            println!("Database initialized at {}", settings.database_url());
            Ok(())
        }
    }
}
