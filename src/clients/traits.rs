use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::personas::Persona;

/// One event emitted by a model runtime while answering a single user turn.
///
/// The wire shape matches the newline-delimited JSON emitted by `gemini
/// --output-format stream-json`; the HTTP runtime synthesizes the same events.
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelEvent {
    Init {
        session_id: String,
        model: String,
    },
    ToolUse {
        tool_name: String,
        parameters: serde_json::Value,
    },
    ToolResult {
        status: String,
        output: Option<String>,
    },
    Content {
        text: String,
    },
    Message {
        role: String,
        content: String,
        #[serde(default)]
        delta: bool,
    },
    Result {
        status: String,
        #[serde(default)]
        stats: serde_json::Value,
    },
    Error {
        message: String,
    },
    End {
        session_id: String,
    },
}

impl ModelEvent {
    pub fn assistant(content: impl Into<String>) -> Self {
        ModelEvent::Message {
            role: "assistant".to_string(),
            content: content.into(),
            delta: false,
        }
    }

    pub fn success() -> Self {
        ModelEvent::Result {
            status: "success".to_string(),
            stats: serde_json::Value::Null,
        }
    }
}

/// Bounded stream of events for one turn; ends after the terminal event.
pub type EventStream = BoxStream<'static, Result<ModelEvent, AgentError>>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("cli error: {0}")]
    CliError(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("model error: {0}")]
    Model(String),
    #[error("malformed event stream: {0}")]
    Stream(String),
    #[error("session error: {0}")]
    Session(String),
    #[error("cli executable not found")]
    NotFound,
}

/// Language-model execution service.
///
/// Sessions are cheap and disposable: the invoker opens one per call and always
/// closes it, so implementations must tolerate hundreds of open/close cycles.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    fn name(&self) -> &str;

    async fn open_session(
        &self,
        persona: &Persona,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), AgentError>;

    /// Send one user turn and return the event stream for the reply.
    async fn run(
        &self,
        persona: &Persona,
        session_id: &str,
        prompt: &str,
    ) -> Result<EventStream, AgentError>;

    /// Release everything held for `session_id`. Unknown ids are ignored.
    async fn close_session(&self, session_id: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let ev: ModelEvent =
            serde_json::from_str(r#"{"type":"message","role":"user","content":"echo"}"#).unwrap();
        assert_eq!(
            ev,
            ModelEvent::Message {
                role: "user".into(),
                content: "echo".into(),
                delta: false
            }
        );
    }
}
