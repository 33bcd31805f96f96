use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

pub const SEND_LABEL: &str = "Send";
pub const SENDING_LABEL: &str = "Sending...";

/// What a key press in the composer asks for
#[derive(Debug, PartialEq, Eq)]
pub enum ComposerResult {
    /// Enter in the message field or activation of the send control
    Send,
    None,
}

/// State for the text field within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Cursor position in characters
    pub cursor_position: usize,
}

impl TextAreaState {
    fn byte_index(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Message field plus send control
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    state: TextAreaState,
    placeholder: String,
    has_focus: bool,
    input_enabled: bool,
    send_enabled: bool,
    send_label: &'static str,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder: placeholder.into(),
            has_focus: true,
            input_enabled: true,
            send_enabled: true,
            send_label: SEND_LABEL,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter if self.input_enabled => return ComposerResult::Send,
            KeyCode::Char('s') if ctrl && self.send_enabled => return ComposerResult::Send,
            _ if !self.input_enabled || ctrl => {}
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => {
                self.state.cursor_position = self.state.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.state.cursor_position < self.state.char_len() {
                    self.state.cursor_position += 1;
                }
            }
            KeyCode::Home => self.state.cursor_position = 0,
            KeyCode::End => self.state.cursor_position = self.state.char_len(),
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert a character at the cursor position
    fn insert_char(&mut self, c: char) {
        let index = self.state.byte_index();
        self.state.content.insert(index, c);
        self.state.cursor_position += 1;
    }

    /// Delete character before cursor
    fn backspace(&mut self) {
        if self.state.cursor_position > 0 {
            self.state.cursor_position -= 1;
            let index = self.state.byte_index();
            self.state.content.remove(index);
        }
    }

    /// Delete character at cursor
    fn delete(&mut self) {
        if self.state.cursor_position < self.state.char_len() {
            let index = self.state.byte_index();
            self.state.content.remove(index);
        }
    }

    pub fn content(&self) -> &str {
        &self.state.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.state.content = content.into();
        self.state.cursor_position = self.state.char_len();
    }

    pub fn clear(&mut self) {
        self.state = TextAreaState::default();
    }

    /// Toggle the in-flight state of the field and send control
    pub fn set_loading(&mut self, is_loading: bool) {
        self.input_enabled = !is_loading;
        self.send_enabled = !is_loading;
        self.send_label = if is_loading { SENDING_LABEL } else { SEND_LABEL };
        if is_loading {
            // A disabled field cannot hold focus
            self.has_focus = false;
        }
    }

    pub fn focus(&mut self) {
        self.has_focus = true;
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn is_send_enabled(&self) -> bool {
        self.send_enabled
    }

    pub fn send_label(&self) -> &'static str {
        self.send_label
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(14)])
            .split(area);

        let field_style = if !self.input_enabled {
            Style::default().fg(Color::DarkGray)
        } else if self.has_focus {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Message")
            .style(field_style);
        let inner_area = block.inner(chunks[0]);
        block.render(chunks[0], buf);

        if self.state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.state.content.clone();
            if self.has_focus && self.input_enabled {
                content.insert(self.state.byte_index(), '▌');
            }

            // Keep the cursor end of long input visible
            let width = inner_area.width as usize;
            let chars: Vec<char> = content.chars().collect();
            let start = chars.len().saturating_sub(width);
            let visible: String = chars[start..].iter().collect();
            buf.set_line(inner_area.x, inner_area.y, &Line::from(visible), inner_area.width);
        }

        let button_style = if self.send_enabled {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let button = Block::default().borders(Borders::ALL).style(button_style);
        let button_inner = button.inner(chunks[1]);
        button.render(chunks[1], buf);
        buf.set_line(
            button_inner.x,
            button_inner.y,
            &Line::from(Span::styled(self.send_label, button_style)),
            button_inner.width,
        );
    }
}
