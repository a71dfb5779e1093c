//! Deterministic model runtime shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use persona_reflect::clients::EventStream;
use persona_reflect::{AgentError, ModelEvent, ModelRuntime, Persona};

/// Replies with a fixed text per persona id. Personas listed in `failing` return a
/// transport error; unknown ids answer "{display_name} reflects on: {first line}".
#[derive(Default)]
pub struct FixedRuntime {
    replies: HashMap<String, String>,
    failing: HashSet<String>,
    open: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FixedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, persona_id: &str, text: &str) -> Self {
        self.replies.insert(persona_id.to_string(), text.to_string());
        self
    }

    pub fn failing(mut self, persona_id: &str) -> Self {
        self.failing.insert(persona_id.to_string());
        self
    }

    pub fn open_sessions(&self) -> usize {
        self.open.lock().unwrap().len()
    }

    /// Persona ids in the order their turns started
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelRuntime for FixedRuntime {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn open_session(
        &self,
        _persona: &Persona,
        _user_id: &str,
        session_id: &str,
    ) -> Result<(), AgentError> {
        if !self.open.lock().unwrap().insert(session_id.to_string()) {
            return Err(AgentError::Model(format!("session {} already open", session_id)));
        }
        Ok(())
    }

    async fn run(
        &self,
        persona: &Persona,
        _session_id: &str,
        prompt: &str,
    ) -> Result<EventStream, AgentError> {
        self.calls.lock().unwrap().push(persona.id.clone());
        if self.failing.contains(&persona.id) {
            return Err(AgentError::Transport("connection refused".into()));
        }
        let text = self.replies.get(&persona.id).cloned().unwrap_or_else(|| {
            format!(
                "{} reflects on: {}",
                persona.display_name,
                prompt.lines().next().unwrap_or_default()
            )
        });
        let events = vec![ModelEvent::assistant(text), ModelEvent::success()];
        Ok(futures_util::stream::iter(events.into_iter().map(Ok)).boxed())
    }

    async fn close_session(&self, session_id: &str) {
        self.open.lock().unwrap().remove(session_id);
    }
}
