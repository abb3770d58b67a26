//! # repolink Main Entry Point
//!
//! This is the main entry point for the repolink service.

use std::path::PathBuf;

use clap::Parser;
use migration::MigratorTrait;
use repolink::{config::ConfigLoader, server::run_server, telemetry};

/// Git repository connector registry and clone service
#[derive(Debug, Parser)]
#[command(name = "repolink", version)]
struct Args {
    /// Directory containing layered .env files (defaults to the working directory)
    #[arg(long)]
    env_dir: Option<PathBuf>,

    /// Run database migrations and exit without serving
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = match args.env_dir {
        Some(dir) => ConfigLoader::with_base_dir(dir),
        None => ConfigLoader::new(),
    };
    let config = loader.load()?;

    telemetry::init_tracing(&config)?;
    tracing::info!("Loaded configuration for profile: {}", config.profile);
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!("Configuration: {}", redacted_json);
    }

    if args.migrate_only {
        let db = repolink::db::init_pool(&config).await?;
        migration::Migrator::up(&db, None).await?;
        tracing::info!("Migrations applied, exiting");
        return Ok(());
    }

    run_server(config).await
}
