mod api;
mod auth;
mod config;
mod dates;
mod error;
mod export;
mod metrics;
mod models;
mod parser;
mod schedule;
mod store;
mod ui;

use anyhow::{Context, Result};
use config::{Config, Overrides};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use ui::App;

#[cfg(feature = "cli")]
mod cli {
    use crate::config::Overrides;
    use clap::Parser;
    use std::path::PathBuf;

    /// Terminal client for a tutor's class roster.
    #[derive(Parser, Debug)]
    #[command(version, about)]
    pub struct Args {
        /// YAML file with the login accounts
        #[arg(long)]
        pub users: Option<PathBuf>,

        /// Where to write the log
        #[arg(long)]
        pub log_file: Option<PathBuf>,

        /// Directory for CSV exports
        #[arg(long)]
        pub export_dir: Option<PathBuf>,
    }

    pub fn overrides() -> Overrides {
        let args = Args::parse();
        Overrides {
            users_file: args.users,
            log_file: args.log_file,
            export_dir: args.export_dir,
        }
    }
}

#[cfg(feature = "cli")]
fn overrides() -> Overrides {
    cli::overrides()
}

#[cfg(not(feature = "cli"))]
fn overrides() -> Overrides {
    Overrides::default()
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load(overrides()).context("Failed to load configuration")?;
    init_logging(&config.log_file)?;

    info!(
        "Starting with {} account(s), exports to {}",
        config.users.len(),
        config.export_dir.display()
    );

    // Initialize API clients
    let sheets = api::SheetsApi::new(config.students_url, config.schedules_url)?;
    let reports = match config.gemini_api_key {
        Some(key) => Some(api::ReportClient::new(key, config.gemini_model)?),
        None => {
            info!("GEMINI_API_KEY not set, report generation disabled");
            None
        }
    };

    // Start TUI application
    let mut app = App::new(Box::new(sheets), reports, config.users, config.export_dir);
    app.run().await?;

    Ok(())
}
