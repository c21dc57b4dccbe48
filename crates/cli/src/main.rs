use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::{Environment, Settings};

/// Shelf book catalogue service
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    /// Directory holding base.toml and the per-environment overlays
    /// [default: $SHELF_CONFIG_DIR or ./config]
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load [default: $SHELF_ENV or local]
    #[arg(long, global = true, value_parser = parse_environment)]
    env: Option<Environment>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve the HTTP API
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

fn parse_environment(value: &str) -> Result<Environment, String> {
    Environment::parse(value).map_err(|err| err.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_with(cli.config_dir, cli.env)
        .with_context(|| "failed to load Shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => shelf_app::app::serve(settings).await,
        Command::Migrate => {
            let applied = shelf_app::app::migrate(settings).await?;
            tracing::info!(applied, "migrations applied");
            Ok(())
        }
    }
}
