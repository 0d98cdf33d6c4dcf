use std::io;
use std::path::PathBuf;

use clap::Parser;
use tinytable::{Shell, ShellConfig, Table};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Interactive shell for a single-file B+tree table.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Table file to open; created if it does not exist.
    db_path: PathBuf,
}

fn main() {
    // Shell output owns stdout, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tinytable=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let config = match ShellConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let table = match Table::open_with_limits(&args.db_path, config.limits) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("Unable to open {}: {e}", args.db_path.display());
            std::process::exit(1);
        }
    };

    let mut shell = Shell::new(io::stdin().lock(), io::stdout().lock(), config);
    if let Err(e) = shell.run(table) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
