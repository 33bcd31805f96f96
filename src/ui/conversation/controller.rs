use crate::api::{ChatBackend, ChatReply, ChatRequest, ChatResponse, LogsReply};
use crate::config::UiConfig;
use crate::error::ClientError;
use crate::events::{AppEvent, Sender};
use crate::session::SessionId;
use crate::ui::conversation::composer::{ComposerResult, ConversationComposer};
use crate::ui::conversation::history::ConversationHistory;
use crate::ui::conversation::logs::{LogsPanel, LOGS_ERROR, NO_LOGS};
use crate::ui::conversation::patient::PatientPanel;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Shown when the backend could not be reached or answered with garbage
pub const SEND_FAILED: &str = "Sorry, I encountered an error. Please try again.";
/// Shown when the backend rejected the message without saying why
pub const SEND_REJECTED: &str = "Sorry, something went wrong.";

const PAGE_LINES: u16 = 5;
const HINT: &str = "Enter to send · F1 for keys";
const HELP_TEXT: &str =
    "Enter/Ctrl+S send · Ctrl+L interaction log · PgUp/PgDn scroll · Esc/Ctrl+C quit";

/// Actions the controller asks of the surrounding app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerAction {
    None,
    Exit,
}

/// Owns the session and drives every display surface of the chat.
///
/// Requests run on spawned tasks and report back as [`AppEvent`]s on the
/// channel handed to [`ConversationController::new`]; the owner feeds those
/// events back through [`ConversationController::handle_event`].
pub struct ConversationController {
    session_id: SessionId,
    backend: Arc<dyn ChatBackend>,
    events: mpsc::Sender<AppEvent>,
    history: ConversationHistory,
    composer: ConversationComposer,
    patient: PatientPanel,
    logs: LogsPanel,
    started_at: Option<DateTime<Local>>,
    is_loading: bool,
    logs_generation: u64,
    status: Option<String>,
}

impl ConversationController {
    /// Start a conversation under a freshly generated session id
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        events: mpsc::Sender<AppEvent>,
        ui: &UiConfig,
    ) -> Self {
        Self::with_session(SessionId::generate(), backend, events, ui)
    }

    /// Continue a conversation the backend already knows about
    pub fn with_session(
        session_id: SessionId,
        backend: Arc<dyn ChatBackend>,
        events: mpsc::Sender<AppEvent>,
        ui: &UiConfig,
    ) -> Self {
        info!(session = %session_id, "conversation started");

        Self {
            session_id,
            backend,
            events,
            history: ConversationHistory::new(),
            composer: ConversationComposer::new("Type your message here..."),
            patient: PatientPanel::default(),
            logs: LogsPanel::default(),
            started_at: ui.show_clock.then(Local::now),
            is_loading: false,
            logs_generation: 0,
            status: None,
        }
    }

    /// Send whatever is in the message field
    pub fn send_message(&mut self) {
        if self.is_loading {
            return;
        }

        let message = self.composer.content().trim().to_string();
        if message.is_empty() {
            return;
        }

        self.add_message(message.clone(), Sender::User);
        self.composer.clear();
        self.set_loading(true);

        let request = ChatRequest {
            message,
            session_id: self.session_id.clone(),
        };
        info!(session = %self.session_id, "sending chat message");

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = backend.send_message(request).await;
            if events.send(AppEvent::ChatFinished(outcome)).await.is_err() {
                debug!("chat result dropped, UI already gone");
            }
        });
    }

    /// Append one transcript entry and reveal it
    pub fn add_message(&mut self, content: String, sender: Sender) {
        self.history.push(sender, content);
    }

    /// Show patient details carried by a chat response, if any
    pub fn update_patient_info(&mut self, data: &ChatResponse) {
        if self.patient.update(data) {
            debug!(has_report = ?data.has_discharge_report, "patient panel updated");
        }
    }

    /// Show or hide the interaction log. Showing always refetches.
    pub fn toggle_logs(&mut self) {
        if self.logs.is_visible() {
            self.logs.set_visible(false);
        } else {
            self.load_logs();
            self.logs.set_visible(true);
        }
    }

    /// Fetch the interaction log for this session. Only the most recent
    /// fetch may write the panel.
    pub fn load_logs(&mut self) {
        self.logs_generation += 1;
        let generation = self.logs_generation;
        self.logs.mark_loading();

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let session_id = self.session_id.clone();
        debug!(session = %session_id, generation, "fetching interaction log");

        tokio::spawn(async move {
            let outcome = backend.fetch_logs(&session_id).await;
            if events
                .send(AppEvent::LogsFinished { generation, outcome })
                .await
                .is_err()
            {
                debug!("log result dropped, UI already gone");
            }
        });
    }

    pub fn set_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
        self.composer.set_loading(is_loading);
        if !is_loading {
            self.composer.focus();
        }
    }

    /// Apply one event to the conversation
    pub fn handle_event(&mut self, event: AppEvent) -> ControllerAction {
        match event {
            AppEvent::Key(key) => return self.handle_key(key),
            AppEvent::Scroll(delta) if delta < 0 => self.history.scroll_up(delta.unsigned_abs()),
            AppEvent::Scroll(delta) => self.history.scroll_down(delta as u16),
            AppEvent::Resize(..) => {}
            AppEvent::ChatFinished(outcome) => self.finish_chat(outcome),
            AppEvent::LogsFinished { generation, outcome } => self.finish_logs(generation, outcome),
        }
        ControllerAction::None
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ControllerAction {
        if key.kind != KeyEventKind::Press {
            return ControllerAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return ControllerAction::Exit,
            KeyCode::Char('c') if ctrl => return ControllerAction::Exit,
            KeyCode::Char('l') if ctrl => self.toggle_logs(),
            KeyCode::F(1) => self.status = Some(HELP_TEXT.to_string()),
            KeyCode::PageUp => self.history.scroll_up(PAGE_LINES),
            KeyCode::PageDown => self.history.scroll_down(PAGE_LINES),
            _ => {
                if self.composer.handle_key(key) == ComposerResult::Send {
                    self.send_message();
                }
            }
        }
        ControllerAction::None
    }

    fn finish_chat(&mut self, outcome: Result<ChatReply, ClientError>) {
        match outcome {
            Ok(ChatReply::Answered(data)) => {
                info!(session = %self.session_id, "chat response received");
                self.add_message(data.response.clone(), Sender::Assistant);
                self.update_patient_info(&data);
            }
            Ok(ChatReply::Rejected { status, error }) => {
                warn!(status, error = ?error, "chat request rejected");
                let text = error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| SEND_REJECTED.to_string());
                self.add_message(text, Sender::Assistant);
            }
            Err(err) => {
                warn!(error = %err, timeout = err.is_timeout(), "chat request failed");
                self.add_message(SEND_FAILED.to_string(), Sender::Assistant);
            }
        }
        self.set_loading(false);
    }

    fn finish_logs(&mut self, generation: u64, outcome: Result<LogsReply, ClientError>) {
        if generation != self.logs_generation {
            debug!(generation, latest = self.logs_generation, "ignoring stale log result");
            return;
        }

        match outcome {
            Ok(LogsReply::Found(records)) => {
                debug!(count = records.len(), "interaction log loaded");
                self.logs.show_records(&records);
            }
            Ok(LogsReply::Unavailable { status }) => {
                warn!(status, "interaction log unavailable");
                self.logs.show_notice(NO_LOGS);
            }
            Err(err) => {
                warn!(error = %err, "failed to load interaction log");
                self.logs.show_notice(LOGS_ERROR);
            }
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    /// Put text into the message field, as if typed
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.composer.set_content(text);
    }

    pub fn patient(&self) -> &PatientPanel {
        &self.patient
    }

    pub fn logs(&self) -> &LogsPanel {
        &self.logs
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Draw every surface into the buffer
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(6),    // Transcript and side panels
                Constraint::Length(3), // Composer
                Constraint::Length(1), // Status
            ])
            .split(area);

        self.render_header(rows[0], buf);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(44)])
            .split(rows[1]);
        self.history.render(columns[0], buf);

        let patient_height = if self.patient.is_visible() { 4 } else { 0 };
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(patient_height),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(columns[1]);
        self.patient.render(side[0], buf);

        let toggle = Line::from(vec![
            Span::styled(
                format!(" {} ", self.logs.toggle_label()),
                Style::default().fg(Color::Black).bg(Color::Yellow),
            ),
            Span::styled(" Ctrl+L", Style::default().fg(Color::DarkGray)),
        ]);
        buf.set_line(side[1].x, side[1].y, &toggle, side[1].width);
        self.logs.render(side[2], buf);

        self.composer.render(rows[2], buf);

        let status = self
            .status
            .clone()
            .unwrap_or_else(|| HINT.to_string());
        buf.set_line(
            rows[3].x,
            rows[3].y,
            &Line::from(Span::styled(status, Style::default().fg(Color::DarkGray))),
            rows[3].width,
        );
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![
            Span::styled(
                "🏥 Post-Discharge Assistant",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", self.session_id),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if let Some(started_at) = self.started_at {
            spans.push(Span::styled(
                format!("  {}", started_at.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
