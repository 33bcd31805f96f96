//! Terminal lifecycle and the event loop around the conversation controller.

use crate::api::ChatBackend;
use crate::config::Config;
use crate::events::AppEvent;
use crate::ui::conversation::{ControllerAction, ConversationController};
use anyhow::{anyhow, Result};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyEventKind, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

const MOUSE_SCROLL_LINES: i16 = 3;

/// Run the interactive chat until the user leaves.
pub async fn run(config: &Config, backend: Arc<dyn ChatBackend>) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(256);
    let mut controller = ConversationController::new(backend, tx.clone(), &config.ui);
    info!(session = %controller.session_id(), base_url = %config.base_url, "interactive chat starting");

    let mut terminal = setup_terminal()?;
    spawn_input_handler(tx);

    let result = event_loop(&mut terminal, &mut controller, &mut rx).await;

    restore_terminal(&mut terminal)?;
    info!(session = %controller.session_id(), "interactive chat closed");
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    controller: &mut ConversationController,
    rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            let area = frame.size();
            controller.render(area, frame.buffer_mut());
        })?;

        let event = rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("event channel closed unexpectedly"))?;
        if controller.handle_event(event) == ControllerAction::Exit {
            return Ok(());
        }
    }
}

/// Forward terminal input onto the app channel
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        loop {
            let ready = tokio::task::spawn_blocking(|| {
                match crossterm::event::poll(Duration::from_millis(50)) {
                    Ok(true) => crossterm::event::read().ok(),
                    _ => None,
                }
            })
            .await;

            let event = match ready {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(_) => break,
            };

            let app_event = match event {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                CrosstermEvent::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => AppEvent::Scroll(-MOUSE_SCROLL_LINES),
                    MouseEventKind::ScrollDown => AppEvent::Scroll(MOUSE_SCROLL_LINES),
                    _ => continue,
                },
                CrosstermEvent::Resize(width, height) => AppEvent::Resize(width, height),
                _ => continue,
            };

            if sender.send(app_event).await.is_err() {
                debug!("input handler stopping, receiver dropped");
                break;
            }
        }
    });
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
