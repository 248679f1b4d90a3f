//! Tally console
//!
//! Signs in against the configured backend and runs the expense tracker page
//! in the terminal.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use tally::auth::LocalAuthenticator;
use tally::backend::MemoryBackend;
use tally::bootstrap::{self, AuthMode};
use tally::config::{generate_default_config, Config};
use tally::console;
use tally::logging;
use tally::view::ExpenseApp;

#[derive(Parser)]
#[command(name = "tally")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Login-gated expense tracker")]
struct Cli {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend outputs document (overrides the config file)
    #[arg(short, long)]
    outputs: Option<PathBuf>,

    /// Use the in-memory backend instead of the hosted one
    #[arg(long)]
    offline: bool,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let (mut config, report) = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(outputs) = cli.outputs {
        config.backend.outputs_path = outputs;
    }

    logging::init(&config.logging).context("initializing logging")?;
    tracing::info!("Tally v{}", env!("CARGO_PKG_VERSION"));
    report.log();

    let tally = if cli.offline {
        bootstrap::offline(MemoryBackend::new(), LocalAuthenticator::accept_any())
    } else {
        bootstrap::configure_from_path(
            &config.backend.outputs_path,
            AuthMode::UserPool,
            &config.backend,
        )
        .with_context(|| {
            format!(
                "configuring backend from {}",
                config.backend.outputs_path.display()
            )
        })?
    };

    let app = ExpenseApp::new(&tally);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    console::run(&app, stdin, tokio::io::stdout()).await?;

    app.sign_out().await;
    tracing::info!("Tally shutdown complete");
    Ok(())
}
