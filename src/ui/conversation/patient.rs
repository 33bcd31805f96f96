use crate::api::ChatResponse;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

pub const DISCHARGE_FOUND: &str = "✅ Discharge report found";
pub const DISCHARGE_MISSING: &str = "❌ No discharge report";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientSummary {
    pub name: String,
    pub has_discharge_report: bool,
}

impl PatientSummary {
    pub fn name_line(&self) -> String {
        format!("Patient: {}", self.name)
    }

    pub fn discharge_line(&self) -> &'static str {
        if self.has_discharge_report {
            DISCHARGE_FOUND
        } else {
            DISCHARGE_MISSING
        }
    }
}

/// Hidden until the first response that names a patient
#[derive(Debug, Clone, Default)]
pub struct PatientPanel {
    summary: Option<PatientSummary>,
}

impl PatientPanel {
    /// Show the patient carried by a chat response. Responses without a
    /// non-empty `patient_name` leave the panel as it was.
    pub fn update(&mut self, data: &ChatResponse) -> bool {
        let Some(name) = data.patient_name.as_deref().filter(|n| !n.is_empty()) else {
            return false;
        };

        self.summary = Some(PatientSummary {
            name: name.to_string(),
            has_discharge_report: data.has_discharge_report.unwrap_or(false),
        });
        true
    }

    pub fn summary(&self) -> Option<&PatientSummary> {
        self.summary.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.summary.is_some()
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let Some(summary) = &self.summary else {
            return;
        };

        let block = Block::default().borders(Borders::ALL).title("Patient");
        let inner = block.inner(area);
        block.render(area, buf);

        let discharge_color = if summary.has_discharge_report {
            Color::Green
        } else {
            Color::Red
        };
        let lines = [
            Line::from(Span::styled(
                summary.name_line(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                summary.discharge_line(),
                Style::default().fg(discharge_color),
            )),
        ];

        for (i, line) in lines.iter().enumerate() {
            if i < inner.height as usize {
                buf.set_line(inner.x, inner.y + i as u16, line, inner.width);
            }
        }
    }
}
