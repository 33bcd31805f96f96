mod api;
mod commands;
mod config;
mod error;
mod events;
mod session;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::HttpChatBackend;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "nephro-connect")]
#[command(version)]
#[command(about = "Chat with the post-discharge nephrology assistant", long_about = None)]
struct Cli {
    /// Backend address, overrides config and environment
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send one message and print the reply
    Ask {
        message: String,
        /// Continue an existing session instead of starting a new one
        #[arg(long)]
        session: Option<String>,
    },
    /// Print the interaction log of a session
    Logs { session: String },
    /// Check that the backend is reachable
    Health,
    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        write: bool,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    Config::resolve(
        cli.config.as_deref(),
        Config::env_base_url(),
        cli.base_url.as_deref(),
    )
}

fn env_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env().add_directive("nephro_connect=info".parse()?))
}

/// The terminal belongs to the UI, so the interactive client logs to a file.
fn init_file_logging(config: &Config) -> Result<()> {
    let path = config.log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn init_stderr_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Chat) => {
            init_file_logging(&config)?;
            config.log_summary();
            let backend = HttpChatBackend::new(&config).context("Failed to create HTTP client")?;
            ui::app::run(&config, Arc::new(backend)).await
        }
        Some(Commands::Ask { message, session }) => {
            init_stderr_logging()?;
            config.log_summary();
            commands::ask(&config, &message, session).await
        }
        Some(Commands::Logs { session }) => {
            init_stderr_logging()?;
            config.log_summary();
            commands::show_logs(&config, &session).await
        }
        Some(Commands::Health) => {
            init_stderr_logging()?;
            config.log_summary();
            commands::health(&config).await
        }
        Some(Commands::Config { write }) => commands::show_config(&config, write),
    }
}
