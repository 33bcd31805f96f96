use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::{ChatBackend, HttpChatBackend, LogsReply};
use crate::config::Config;
use crate::session::SessionId;
use crate::ui::conversation::ConversationController;
use crate::ui::conversation::logs::{LogLine, LOGS_ERROR, NO_LOGS};

fn backend(config: &Config) -> Result<HttpChatBackend> {
    HttpChatBackend::new(config).context("Failed to create HTTP client")
}

/// Run a single send cycle and print what the chat window would show
pub async fn ask(config: &Config, message: &str, session: Option<String>) -> Result<()> {
    let backend: Arc<dyn ChatBackend> = Arc::new(backend(config)?);
    let (tx, mut rx) = mpsc::channel(4);

    let mut controller = match session.and_then(SessionId::from_existing) {
        Some(session_id) => ConversationController::with_session(session_id, backend, tx, &config.ui),
        None => ConversationController::new(backend, tx, &config.ui),
    };

    controller.set_input(message);
    controller.send_message();
    if controller.history().is_empty() {
        println!("Nothing to send.");
        return Ok(());
    }

    while controller.is_loading() {
        let event = rx
            .recv()
            .await
            .context("Chat request ended without a result")?;
        controller.handle_event(event);
    }

    println!("🆔 Session: {}", controller.session_id());
    println!("{}", "=".repeat(50));
    for entry in controller.history().messages() {
        println!("[{}] {}", entry.display_time(), entry.display_line());
    }

    if let Some(summary) = controller.patient().summary() {
        println!();
        println!("👤 {}", summary.name_line());
        println!("   {}", summary.discharge_line());
    }

    Ok(())
}

/// Print the interaction log of a session
pub async fn show_logs(config: &Config, session: &str) -> Result<()> {
    let session_id = SessionId::from_existing(session).context("Session id must not be empty")?;
    let backend = backend(config)?;

    println!("📜 Interaction log for {}", session_id);
    println!("{}", "=".repeat(50));

    match backend.fetch_logs(&session_id).await {
        Ok(LogsReply::Found(records)) if records.is_empty() => {
            println!("(no entries)");
        }
        Ok(LogsReply::Found(records)) => {
            for line in records.iter().map(LogLine::from_record) {
                println!("• {}", line.headline);
                println!("  {}", line.detail_line());
            }
        }
        Ok(LogsReply::Unavailable { .. }) => println!("{}", NO_LOGS),
        Err(err) => {
            tracing::warn!(error = %err, "failed to load interaction log");
            println!("{}", LOGS_ERROR);
        }
    }

    Ok(())
}

/// Ask the backend whether it is up
pub async fn health(config: &Config) -> Result<()> {
    let backend = backend(config)?;

    match backend.health().await {
        Ok((_, Some(status))) => {
            println!("✅ {} is {}", backend.base_url(), status.status);
            if let Some(timestamp) = status.timestamp {
                println!("   Server time: {}", timestamp);
            }
        }
        Ok((code, None)) => {
            println!("❌ {} answered {}", backend.base_url(), code);
        }
        Err(err) => {
            println!("❌ {} is unreachable: {}", backend.base_url(), err);
        }
    }

    Ok(())
}

/// Print the effective configuration, optionally persisting it
pub fn show_config(config: &Config, write: bool) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", rendered.trim_end());

    if write {
        let path = config.save()?;
        println!();
        println!("💾 Saved to {}", path.display());
    }

    Ok(())
}
