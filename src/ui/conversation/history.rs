//! Conversation transcript display component

use crate::events::Sender;
use chrono::{DateTime, Local};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// A single message in the transcript
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    /// `"<label>: <content>"`, the way the entry reads on screen
    pub fn display_line(&self) -> String {
        format!("{}: {}", self.sender.label(), self.content)
    }

    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Append-only transcript with a scroll offset counted from the bottom
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    scroll_from_bottom: u16,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and reveal it
    pub fn push(&mut self, sender: Sender, content: String) {
        self.messages.push(ChatMessage {
            sender,
            content,
            timestamp: Local::now(),
        });
        self.scroll_to_bottom();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }

    pub fn scroll_offset(&self) -> u16 {
        self.scroll_from_bottom
    }
}

impl ConversationHistory {
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() {
            let welcome_lines = vec![
                Line::from(vec![Span::styled(
                    "Hello! I'm your post-discharge assistant.",
                    Style::default().fg(Color::Green),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Tell me your name to get started.",
                    Style::default().fg(Color::Gray),
                )]),
            ];

            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for message in &self.messages {
            all_lines.extend(render_message(message, inner_area.width));
            all_lines.push(Line::from(""));
        }

        // Window anchored to the bottom, shifted up by the scroll offset
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_offset = total.saturating_sub(height);
        let offset = (self.scroll_from_bottom as usize).min(max_offset);
        let end = total - offset;
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

fn render_message(message: &ChatMessage, width: u16) -> Vec<Line<'static>> {
    let label_style = match message.sender {
        Sender::User => Style::default().fg(Color::Blue),
        Sender::Assistant => Style::default().fg(Color::Green),
    }
    .add_modifier(Modifier::BOLD);

    let prefix = format!("{}: ", message.sender.label());
    let body_width = (width as usize).saturating_sub(prefix.chars().count()).max(1);

    let mut lines = Vec::new();
    for (i, chunk) in wrap_text(&message.content, body_width).into_iter().enumerate() {
        let lead = if i == 0 {
            Span::styled(prefix.clone(), label_style)
        } else {
            Span::raw(" ".repeat(prefix.chars().count()))
        };
        lines.push(Line::from(vec![lead, Span::raw(chunk)]));
    }

    lines.push(Line::from(vec![Span::styled(
        message.display_time(),
        Style::default().fg(Color::DarkGray),
    )]));
    lines
}

/// Word-wrap text to the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();

        for word in paragraph.split_whitespace() {
            let needed = if current_line.is_empty() {
                word.chars().count()
            } else {
                current_line.chars().count() + 1 + word.chars().count()
            };

            if needed <= width || current_line.is_empty() {
                if !current_line.is_empty() {
                    current_line.push(' ');
                }
                current_line.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line.push_str(word);
            }
        }

        lines.push(current_line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_appends_in_order_and_resets_scroll() {
        let mut history = ConversationHistory::new();
        history.push(Sender::User, "Hello".to_string());
        history.scroll_up(5);
        history.push(Sender::Assistant, "Hi there".to_string());

        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].display_line(), "You: Hello");
        assert_eq!(history.messages()[1].display_line(), "Assistant: Hi there");
        assert_eq!(history.scroll_offset(), 0);
    }

    #[test]
    fn wrap_respects_width_and_newlines() {
        let wrapped = wrap_text("one two three\nfour", 7);
        assert_eq!(wrapped, vec!["one two", "three", "four"]);
    }

    #[test]
    fn markup_is_kept_as_literal_text() {
        let mut history = ConversationHistory::new();
        history.push(Sender::Assistant, "<b>bold</b>".to_string());

        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        history.render(area, &mut buf);

        let row: String = (0..area.width)
            .map(|x| buf.get(x, 1).symbol().to_string())
            .collect();
        assert!(row.contains("Assistant: <b>bold</b>"));
    }
}
