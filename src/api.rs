//! Wire types and HTTP plumbing for the chat backend.

use crate::config::Config;
use crate::error::ClientError;
use crate::session::SessionId;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: SessionId,
}

/// Successful `POST /chat` body
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub has_discharge_report: Option<bool>,
}

/// Outcome of a chat exchange that produced a JSON body
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    /// HTTP ok
    Answered(ChatResponse),
    /// Non-ok status; `error` is the body's `error` string when it has one
    Rejected { status: u16, error: Option<String> },
}

/// One record of `GET /logs/{session_id}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub patient: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    logs: Vec<LogRecord>,
}

/// Outcome of a log fetch that produced a JSON body
#[derive(Debug, Clone, PartialEq)]
pub enum LogsReply {
    Found(Vec<LogRecord>),
    Unavailable { status: u16 },
}

/// `GET /health` body
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// The two calls the conversation controller makes.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(&self, request: ChatRequest) -> Result<ChatReply, ClientError>;

    async fn fetch_logs(&self, session_id: &SessionId) -> Result<LogsReply, ClientError>;
}

/// reqwest-backed client for the chat service
#[derive(Clone)]
pub struct HttpChatBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChatBackend {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ClientError::ClientBuild)?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the backend is up
    pub async fn health(&self) -> Result<(StatusCode, Option<HealthStatus>), ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok((status, Some(serde_json::from_str(&body)?)))
        } else {
            Ok((status, None))
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send_message(&self, request: ChatRequest) -> Result<ChatReply, ClientError> {
        let url = format!("{}/chat", self.base_url);
        debug!(%url, session = %request.session_id, "posting chat message");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_chat_body(status, &body)
    }

    async fn fetch_logs(&self, session_id: &SessionId) -> Result<LogsReply, ClientError> {
        let url = format!("{}/logs/{}", self.base_url, session_id);
        debug!(%url, "fetching interaction log");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        parse_logs_body(status, &body)
    }
}

/// Interpret a `/chat` response. Any body that is not JSON is a decode
/// failure, whatever the status.
pub fn parse_chat_body(status: StatusCode, body: &str) -> Result<ChatReply, ClientError> {
    let value: Value = serde_json::from_str(body)?;

    if status.is_success() {
        Ok(ChatReply::Answered(serde_json::from_value(value)?))
    } else {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(ChatReply::Rejected {
            status: status.as_u16(),
            error,
        })
    }
}

/// Interpret a `/logs/{id}` response.
pub fn parse_logs_body(status: StatusCode, body: &str) -> Result<LogsReply, ClientError> {
    let value: Value = serde_json::from_str(body)?;

    if status.is_success() {
        let parsed: LogsResponse = serde_json::from_value(value)?;
        Ok(LogsReply::Found(parsed.logs))
    } else {
        Ok(LogsReply::Unavailable {
            status: status.as_u16(),
        })
    }
}
