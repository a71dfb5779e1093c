//! Single-turn agent invocation inside an ephemeral, always-released session.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use uuid::Uuid;

use crate::clients::{AgentError, ModelEvent, ModelRuntime};
use crate::personas::Persona;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Closes its session when dropped unless `close` already ran. Covers the paths
/// where the invoking future is cancelled mid-stream.
struct SessionGuard {
    runtime: Arc<dyn ModelRuntime>,
    session_id: String,
    closed: bool,
}

impl SessionGuard {
    fn new(runtime: Arc<dyn ModelRuntime>, session_id: String) -> Self {
        Self {
            runtime,
            session_id,
            closed: false,
        }
    }

    async fn close(mut self) {
        self.closed = true;
        self.runtime.close_session(&self.session_id).await;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let runtime = Arc::clone(&self.runtime);
        let session_id = std::mem::take(&mut self.session_id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!("releasing abandoned session {}", session_id);
                handle.spawn(async move { runtime.close_session(&session_id).await });
            }
            Err(_) => tracing::warn!("session {} dropped outside a runtime", session_id),
        }
    }
}

/// Runs one prompt against one persona and returns the assistant's final text.
#[derive(Clone)]
pub struct AgentInvoker {
    runtime: Arc<dyn ModelRuntime>,
    timeout: Duration,
}

impl AgentInvoker {
    pub fn new(runtime: Arc<dyn ModelRuntime>) -> Self {
        Self {
            runtime,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn runtime_name(&self) -> &str {
        self.runtime.name()
    }

    /// Open a fresh `{session_label}-{uuid}` session, send exactly one user turn,
    /// read events until the terminal one, then close the session. No retries.
    pub async fn invoke(
        &self,
        persona: &Persona,
        prompt: &str,
        session_label: &str,
        user_id: &str,
    ) -> Result<String, AgentError> {
        let session_id = format!("{}-{}", session_label, Uuid::new_v4());
        let guard = SessionGuard::new(Arc::clone(&self.runtime), session_id.clone());
        tracing::debug!(
            "invoking {} in session {} ({} prompt chars)",
            persona.id,
            session_id,
            prompt.chars().count()
        );

        let outcome = tokio::time::timeout(
            self.timeout,
            self.converse(persona, &session_id, prompt, user_id),
        )
        .await;
        guard.close().await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(AgentError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    async fn converse(
        &self,
        persona: &Persona,
        session_id: &str,
        prompt: &str,
        user_id: &str,
    ) -> Result<String, AgentError> {
        self.runtime.open_session(persona, user_id, session_id).await?;
        let mut events = self.runtime.run(persona, session_id, prompt).await?;

        let mut text = String::new();
        while let Some(event) = events.next().await {
            match event? {
                ModelEvent::Message {
                    role,
                    content,
                    delta,
                } if role == "assistant" => {
                    if delta {
                        text.push_str(&content);
                    } else {
                        text = content;
                    }
                }
                ModelEvent::Message { role, .. } => {
                    tracing::trace!("ignoring {} message in {}", role, session_id);
                }
                ModelEvent::Content { text: fragment } => text.push_str(&fragment),
                ModelEvent::ToolUse { tool_name, .. } => {
                    tracing::debug!("{} called tool {}", persona.id, tool_name);
                }
                ModelEvent::ToolResult { status, .. } => {
                    tracing::debug!("{} tool result: {}", persona.id, status);
                }
                ModelEvent::Init { model, .. } => {
                    tracing::debug!("session {} running on {}", session_id, model);
                }
                ModelEvent::Error { message } => {
                    tracing::error!("{} reported an error: {}", persona.id, message);
                    return Err(AgentError::Model(message));
                }
                ModelEvent::Result { status, .. } => {
                    if status != "success" {
                        return Err(AgentError::Model(format!(
                            "turn finished with status {}",
                            status
                        )));
                    }
                    return Ok(text.trim().to_string());
                }
                ModelEvent::End { .. } => return Ok(text.trim().to_string()),
            }
        }

        Err(AgentError::Stream(format!(
            "session {} ended without a terminal event",
            session_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Script, ScriptedRuntime};

    fn persona() -> Persona {
        Persona::bare("tester", "Tester", "*", "be brief")
    }

    fn invoker(runtime: &Arc<ScriptedRuntime>) -> AgentInvoker {
        AgentInvoker::new(runtime.clone() as Arc<dyn ModelRuntime>)
            .with_timeout(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_assistant_text_only() {
        let runtime = Arc::new(ScriptedRuntime::new().script(
            "tester",
            Script::Events(vec![
                ModelEvent::Message {
                    role: "user".into(),
                    content: "echo of the prompt".into(),
                    delta: false,
                },
                ModelEvent::Message {
                    role: "assistant".into(),
                    content: "Hello".into(),
                    delta: true,
                },
                ModelEvent::Message {
                    role: "assistant".into(),
                    content: ", world ".into(),
                    delta: true,
                },
                ModelEvent::success(),
                ModelEvent::assistant("after the end"),
            ]),
        ));
        let text = invoker(&runtime)
            .invoke(&persona(), "hi", "tester", "u")
            .await
            .unwrap();
        assert_eq!(text, "Hello, world");
        assert_eq!(runtime.open_sessions(), 0);
        assert_eq!(runtime.closed_count(), 1);
    }

    #[tokio::test]
    async fn test_error_event_fails_and_closes() {
        let runtime = Arc::new(ScriptedRuntime::new().script(
            "tester",
            Script::Events(vec![ModelEvent::Error {
                message: "quota".into(),
            }]),
        ));
        let err = invoker(&runtime)
            .invoke(&persona(), "hi", "tester", "u")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Model(m) if m == "quota"));
        assert_eq!(runtime.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_truncated_stream_is_malformed() {
        let runtime = Arc::new(
            ScriptedRuntime::new().script("tester", Script::Events(vec![ModelEvent::assistant("x")])),
        );
        let err = invoker(&runtime)
            .invoke(&persona(), "hi", "tester", "u")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Stream(_)));
    }

    #[tokio::test]
    async fn test_deadline_closes_session() {
        let runtime = Arc::new(ScriptedRuntime::new().script("tester", Script::Hang));
        let err = invoker(&runtime)
            .invoke(&persona(), "hi", "tester", "u")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Timeout { timeout_ms: 200 }));
        assert_eq!(runtime.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_caller_still_releases_session() {
        let runtime = Arc::new(ScriptedRuntime::new().script("tester", Script::Hang));
        let inv = AgentInvoker::new(runtime.clone() as Arc<dyn ModelRuntime>);
        let p = persona();
        let call = inv.invoke(&p, "hi", "tester", "u");
        let raced = tokio::time::timeout(Duration::from_millis(50), call).await;
        assert!(raced.is_err());
        // The guard's close task runs on the next scheduler turns.
        for _ in 0..10 {
            if runtime.open_sessions() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(runtime.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_session_ids_are_unique_per_call() {
        let runtime = Arc::new(ScriptedRuntime::new());
        let inv = invoker(&runtime);
        inv.invoke(&persona(), "a", "label", "u").await.unwrap();
        inv.invoke(&persona(), "b", "label", "u").await.unwrap();
        let ids = runtime.session_ids();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert!(ids.iter().all(|id| id.starts_with("label-")));
    }
}
