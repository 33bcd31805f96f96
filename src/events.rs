use crate::api::{ChatReply, LogsReply};
use crate::error::ClientError;
use strum::IntoStaticStr;

/// Events delivered to the UI task, from the terminal or from requests
/// running in the background.
#[derive(Debug)]
pub enum AppEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Scroll the transcript by this many lines (negative is up)
    Scroll(i16),

    /// Terminal resize
    Resize(u16, u16),

    /// A `/chat` exchange finished
    ChatFinished(Result<ChatReply, ClientError>),

    /// A `/logs` fetch finished; `generation` identifies which fetch
    LogsFinished {
        generation: u64,
        outcome: Result<LogsReply, ClientError>,
    },
}

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum Sender {
    #[strum(serialize = "You")]
    User,
    Assistant,
}

impl Sender {
    /// Attribution label shown before the message text
    pub fn label(self) -> &'static str {
        self.into()
    }
}
