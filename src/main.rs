use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;

use tablesync::cli::commands::{self, export::ExportArgs};
use tablesync::cli::{Cli, Commands};
use tablesync::config::Settings;
use tablesync::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Init works before any settings file exists
    if let Commands::Init { force } = cli.command {
        logging::init();
        let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        return commands::init::run_init(&dir, force);
    }

    let settings = load_settings(cli.config.as_deref())?;
    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Watch { data_dir } => commands::watch::run(&settings, data_dir).await,
        Commands::Sync { file, table } => commands::sync::run_sync(&settings, &file, table).await,
        Commands::Clear { table } => commands::sync::run_clear(&settings, &table).await,
        Commands::Export {
            table,
            format,
            out,
            stdout,
        } => {
            let args = ExportArgs {
                table,
                format,
                out,
                stdout,
            };
            commands::export::run(&settings, args).await
        }
    }
}

fn load_settings(path: Option<&std::path::Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => {
            if !path.is_file() {
                return Err(anyhow!("config file not found: {}", path.display()));
            }
            Settings::load_from(path)
                .map_err(|e| anyhow!("{e}"))
                .with_context(|| format!("failed to load {}", path.display()))
        }
        None => Settings::load()
            .map_err(|e| anyhow!("{e}"))
            .context("failed to load settings"),
    }
}
