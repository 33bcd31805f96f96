//! Interaction log toggle control and panel

use crate::api::LogRecord;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

pub const SHOW_LABEL: &str = "View Interaction Log";
pub const HIDE_LABEL: &str = "Hide Logs";
pub const NO_LOGS: &str = "No logs available";
pub const LOGS_ERROR: &str = "Error loading logs";
const LOADING: &str = "Loading logs...";
const INVALID_DATE: &str = "Invalid Date";

/// One rendered log record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub headline: String,
    pub timestamp: String,
    /// Patient the agent acted for, when the backend names one
    pub patient: Option<String>,
}

impl LogLine {
    pub fn from_record(record: &LogRecord) -> Self {
        let detail = [record.action.as_deref(), record.query.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or("N/A");

        Self {
            headline: format!("{}: {}", record.agent, detail),
            timestamp: localize_timestamp(&record.timestamp),
            patient: record.patient.clone().filter(|p| !p.is_empty()),
        }
    }

    /// Second line of the entry: time, then the patient if known
    pub fn detail_line(&self) -> String {
        match &self.patient {
            Some(patient) => format!("{} · patient: {}", self.timestamp, patient),
            None => self.timestamp.clone(),
        }
    }
}

/// Render a backend timestamp in local time. Date-times without an offset
/// are taken as local already; bare dates mean midnight UTC.
pub fn localize_timestamp(raw: &str) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Local).format(FORMAT).to_string();
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        if let Some(local) = Local.from_local_datetime(&naive).earliest() {
            return local.format(FORMAT).to_string();
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| {
            Utc.from_utc_datetime(&midnight)
                .with_timezone(&Local)
                .format(FORMAT)
                .to_string()
        })
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogsContent {
    Empty,
    Loading,
    Entries(Vec<LogLine>),
    Notice(&'static str),
}

#[derive(Debug, Clone)]
pub struct LogsPanel {
    visible: bool,
    content: LogsContent,
}

impl Default for LogsPanel {
    fn default() -> Self {
        Self {
            visible: false,
            content: LogsContent::Empty,
        }
    }
}

impl LogsPanel {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Label of the toggle control for the current state
    pub fn toggle_label(&self) -> &'static str {
        if self.visible { HIDE_LABEL } else { SHOW_LABEL }
    }

    pub fn content(&self) -> &LogsContent {
        &self.content
    }

    pub fn mark_loading(&mut self) {
        self.content = LogsContent::Loading;
    }

    /// Replace everything shown with these records
    pub fn show_records(&mut self, records: &[LogRecord]) {
        self.content = LogsContent::Entries(records.iter().map(LogLine::from_record).collect());
    }

    pub fn show_notice(&mut self, notice: &'static str) {
        self.content = LogsContent::Notice(notice);
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        if !self.visible {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Interaction Log");
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = match &self.content {
            LogsContent::Empty => Vec::new(),
            LogsContent::Loading => vec![Line::from(Span::styled(
                LOADING,
                Style::default().fg(Color::DarkGray),
            ))],
            LogsContent::Notice(text) => vec![Line::from(*text)],
            LogsContent::Entries(entries) => entries
                .iter()
                .flat_map(|entry| {
                    [
                        Line::from(Span::styled(
                            entry.headline.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        )),
                        Line::from(Span::styled(
                            entry.detail_line(),
                            Style::default().fg(Color::DarkGray),
                        )),
                    ]
                })
                .collect(),
        };

        // Newest records are at the end
        let height = inner.height as usize;
        let start = lines.len().saturating_sub(height);
        for (i, line) in lines[start..].iter().enumerate() {
            buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(agent: &str, action: Option<&str>, query: Option<&str>) -> LogRecord {
        LogRecord {
            agent: agent.to_string(),
            action: action.map(str::to_string),
            query: query.map(str::to_string),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            patient: None,
        }
    }

    #[test]
    fn headline_prefers_action_then_query() {
        assert_eq!(
            LogLine::from_record(&record("Retriever", Some("search"), Some("q"))).headline,
            "Retriever: search"
        );
        assert_eq!(
            LogLine::from_record(&record("Clinical", Some(""), Some("Is swelling normal?"))).headline,
            "Clinical: Is swelling normal?"
        );
        assert_eq!(
            LogLine::from_record(&record("Clinical", None, None)).headline,
            "Clinical: N/A"
        );
    }

    #[test]
    fn timestamps_are_localized() {
        let utc = localize_timestamp("2024-01-01T00:00:00Z");
        let expected = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(utc, expected);

        assert_eq!(
            localize_timestamp("2024-03-05T14:07:09.123456"),
            "2024-03-05 14:07:09"
        );
        assert_eq!(localize_timestamp("yesterday"), "Invalid Date");
    }

    #[test]
    fn bare_date_is_midnight_utc() {
        let expected = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        assert_eq!(localize_timestamp("2024-01-01"), expected);
        assert_eq!(localize_timestamp("2024-13-01"), "Invalid Date");
    }

    #[test]
    fn patient_is_shown_beside_the_time() {
        let mut with_patient = record("Receptionist", Some("Retrieved discharge report"), None);
        with_patient.patient = Some("Jane Doe".to_string());
        let line = LogLine::from_record(&with_patient);
        assert_eq!(line.detail_line(), format!("{} · patient: Jane Doe", line.timestamp));

        let mut blank_patient = record("Clinical", None, Some("q"));
        blank_patient.patient = Some(String::new());
        let line = LogLine::from_record(&blank_patient);
        assert_eq!(line.patient, None);
        assert_eq!(line.detail_line(), line.timestamp);
    }

    #[test]
    fn records_replace_previous_contents() {
        let mut panel = LogsPanel::default();
        panel.show_records(&[record("Retriever", Some("search"), None)]);
        panel.show_records(&[]);

        assert_eq!(panel.content(), &LogsContent::Entries(Vec::new()));
    }

    #[test]
    fn toggle_label_follows_visibility() {
        let mut panel = LogsPanel::default();
        assert_eq!(panel.toggle_label(), SHOW_LABEL);
        panel.set_visible(true);
        assert_eq!(panel.toggle_label(), HIDE_LABEL);
    }
}
