//! Scripted model runtime for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::clients::{AgentError, EventStream, ModelEvent, ModelRuntime};
use crate::personas::Persona;

#[derive(Debug, Clone)]
pub enum Script {
    /// Streams the text as two delta fragments followed by a success result.
    Reply(String),
    Events(Vec<ModelEvent>),
    Fail(String),
    Hang,
}

/// Replies per persona id; unscripted personas answer "{id} says hi".
#[derive(Default)]
pub struct ScriptedRuntime {
    scripts: HashMap<String, Script>,
    open: Mutex<HashSet<String>>,
    seen: Mutex<Vec<String>>,
    prompts: Mutex<Vec<(String, String)>>,
    closed: AtomicUsize,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, persona_id: &str, script: Script) -> Self {
        self.scripts.insert(persona_id.to_string(), script);
        self
    }

    pub fn open_sessions(&self) -> usize {
        self.open.lock().unwrap().len()
    }

    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    /// (persona id, prompt) pairs in call order
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

fn reply_events(text: &str) -> Vec<ModelEvent> {
    let mid = text
        .char_indices()
        .nth(text.chars().count() / 2)
        .map_or(text.len(), |(i, _)| i);
    vec![
        ModelEvent::Init {
            session_id: "scripted".into(),
            model: "scripted".into(),
        },
        ModelEvent::Message {
            role: "assistant".into(),
            content: text[..mid].to_string(),
            delta: true,
        },
        ModelEvent::Message {
            role: "assistant".into(),
            content: text[mid..].to_string(),
            delta: true,
        },
        ModelEvent::success(),
    ]
}

#[async_trait]
impl ModelRuntime for ScriptedRuntime {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open_session(
        &self,
        _persona: &Persona,
        _user_id: &str,
        session_id: &str,
    ) -> Result<(), AgentError> {
        self.open.lock().unwrap().insert(session_id.to_string());
        self.seen.lock().unwrap().push(session_id.to_string());
        Ok(())
    }

    async fn run(
        &self,
        persona: &Persona,
        _session_id: &str,
        prompt: &str,
    ) -> Result<EventStream, AgentError> {
        self.prompts
            .lock()
            .unwrap()
            .push((persona.id.clone(), prompt.to_string()));

        let script = self
            .scripts
            .get(&persona.id)
            .cloned()
            .unwrap_or_else(|| Script::Reply(format!("{} says hi", persona.id)));

        let events = match script {
            Script::Reply(text) => reply_events(&text),
            Script::Events(events) => events,
            Script::Fail(message) => return Err(AgentError::Transport(message)),
            Script::Hang => return Ok(futures_util::stream::pending().boxed()),
        };
        Ok(futures_util::stream::iter(events.into_iter().map(Ok)).boxed())
    }

    async fn close_session(&self, session_id: &str) {
        if self.open.lock().unwrap().remove(session_id) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
