use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::clients::traits::{AgentError, EventStream, ModelEvent, ModelRuntime};
use crate::personas::Persona;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Chat-completions runtime for any OpenAI-compatible endpoint.
///
/// Session state is the message history, seeded with the persona instruction.
/// Tool calls requested by the model are executed locally against the
/// persona's own tool set.
pub struct OpenAiCompatRuntime {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tool_rounds: usize,
    client: Client,
    sessions: Mutex<HashMap<String, Vec<Value>>>,
}

impl OpenAiCompatRuntime {
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, AgentError> {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(AgentError::Transport(format!(
                "endpoint '{}' must start with http:// or https://",
                endpoint
            )));
        }
        // Ensure endpoint has the correct path if not provided
        let endpoint = if endpoint.ends_with("/chat/completions") {
            endpoint.to_string()
        } else {
            format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'))
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS))
            .build()
            .map_err(|e| AgentError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            model: model.into(),
            api_key,
            temperature: 0.7,
            max_tool_rounds: 3,
            client,
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn open_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn post(&self, body: &Value) -> Result<Value, AgentError> {
        let mut req = self.client.post(&self.endpoint).json(body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req
            .send()
            .await
            .map_err(|e| AgentError::Transport(format!("chat endpoint unreachable: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AgentError::Model(format!(
                "chat endpoint returned {}: {}",
                status, text
            )));
        }

        res.json::<Value>()
            .await
            .map_err(|e| AgentError::ParseError(format!("chat response was not JSON: {}", e)))
    }
}

#[async_trait]
impl ModelRuntime for OpenAiCompatRuntime {
    fn name(&self) -> &str {
        "openai_compat"
    }

    async fn open_session(
        &self,
        persona: &Persona,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), AgentError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(session_id) {
            return Err(AgentError::Session(format!(
                "session {} already open",
                session_id
            )));
        }
        tracing::debug!("opening chat session {} for {}", session_id, user_id);
        sessions.insert(
            session_id.to_string(),
            vec![json!({"role": "system", "content": persona.instruction})],
        );
        Ok(())
    }

    async fn run(
        &self,
        persona: &Persona,
        session_id: &str,
        prompt: &str,
    ) -> Result<EventStream, AgentError> {
        let mut messages = self
            .sessions
            .lock()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| AgentError::Session(format!("unknown session {}", session_id)))?;
        messages.push(json!({"role": "user", "content": prompt}));

        let tool_schemas = persona.tools.schemas();
        let mut events = vec![ModelEvent::Init {
            session_id: session_id.to_string(),
            model: self.model.clone(),
        }];

        for round in 0..=self.max_tool_rounds {
            let mut body = json!({
                "model": self.model,
                "messages": messages,
                "temperature": self.temperature,
            });
            // Last round withholds tools so the model has to answer in text.
            if !tool_schemas.is_empty() && round < self.max_tool_rounds {
                body["tools"] = Value::Array(tool_schemas.clone());
            }

            let reply = self.post(&body).await?;
            let message = reply
                .pointer("/choices/0/message")
                .cloned()
                .ok_or_else(|| AgentError::ParseError("response has no choices".to_string()))?;

            let tool_calls = message
                .get("tool_calls")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            if tool_calls.is_empty() {
                let content = message
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .trim()
                    .to_string();
                messages.push(json!({"role": "assistant", "content": content}));
                events.push(ModelEvent::assistant(content));
                events.push(ModelEvent::success());

                if let Some(history) = self.sessions.lock().await.get_mut(session_id) {
                    *history = messages;
                }
                return Ok(futures_util::stream::iter(events.into_iter().map(Ok)).boxed());
            }

            messages.push(message);
            for call in tool_calls {
                let call_id = call.get("id").and_then(Value::as_str).unwrap_or_default();
                let name = call
                    .pointer("/function/name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let args = call
                    .pointer("/function/arguments")
                    .and_then(Value::as_str)
                    .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
                    .unwrap_or_else(|| json!({}));

                events.push(ModelEvent::ToolUse {
                    tool_name: name.clone(),
                    parameters: args.clone(),
                });
                let (status, output) = match persona.tools.invoke(&name, args).await {
                    Ok(value) => ("success", render_tool_output(value)),
                    Err(e) => {
                        tracing::warn!("tool {} failed for {}: {}", name, persona.id, e);
                        ("error", e.to_string())
                    }
                };
                events.push(ModelEvent::ToolResult {
                    status: status.to_string(),
                    output: Some(output.clone()),
                });
                messages.push(json!({
                    "role": "tool",
                    "tool_call_id": call_id,
                    "content": output,
                }));
            }
        }

        Err(AgentError::Model(format!(
            "model kept requesting tools after {} rounds",
            self.max_tool_rounds
        )))
    }

    async fn close_session(&self, session_id: &str) {
        self.sessions.lock().await.remove(session_id);
    }
}

fn render_tool_output(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
