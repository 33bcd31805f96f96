pub mod app;
pub mod conversation;
