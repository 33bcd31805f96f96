//! Conversation UI components for the chat interface

pub mod composer;
pub mod controller;
pub mod history;
pub mod logs;
pub mod patient;

pub use controller::{ControllerAction, ConversationController};
