use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use futures_util::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{Mutex, mpsc};
use tokio::task::AbortHandle;

use crate::clients::traits::{AgentError, EventStream, ModelEvent, ModelRuntime};
use crate::personas::Persona;

const STDERR_CAP_BYTES: usize = 10 * 1024;
const EVENT_CHANNEL_CAPACITY: usize = 64;
pub const DEFAULT_MODEL: &str = "auto";

/// Line-oriented parser for the CLI's stream-json output.
///
/// Buffers raw bytes so multi-byte characters split across reads decode intact.
pub struct StreamJsonParser {
    buffer: Vec<u8>,
}

impl Default for StreamJsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamJsonParser {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn parse_chunk(&mut self, chunk: &[u8]) -> Vec<ModelEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }

        events
    }

    /// Parse whatever is left after the stream closed without a trailing newline.
    pub fn finish(&mut self) -> Vec<ModelEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest))
            .into_iter()
            .collect()
    }
}

fn parse_line(line: &str) -> Option<ModelEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Strip optional "data:" prefix that some CLI tools add
    let line = line.strip_prefix("data:").map(str::trim).unwrap_or(line);

    match serde_json::from_str::<ModelEvent>(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("Failed to parse stream JSON line: {}", e);
            tracing::debug!("Problematic line: {}", line);
            None
        }
    }
}

struct CliSession {
    user_id: String,
    reader: Option<AbortHandle>,
}

/// Runs each persona turn through the `gemini` CLI, one child process per session.
pub struct GeminiCliRuntime {
    binary: PathBuf,
    model: String,
    sessions: Mutex<HashMap<String, CliSession>>,
}

impl GeminiCliRuntime {
    pub fn new(binary: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn open_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn command(&self, persona: &Persona, prompt: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.kill_on_drop(true)
            .env("CI", "true")
            .env("TERM", "dumb")
            .env("NO_COLOR", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Auto-routing: if model is "auto", omit the -m flag
        if self.model != DEFAULT_MODEL && !self.model.is_empty() {
            cmd.arg("-m").arg(&self.model);
        }
        cmd.arg("--output-format").arg("stream-json");
        cmd.arg(compose_cli_prompt(persona, prompt));
        cmd
    }
}

#[async_trait]
impl ModelRuntime for GeminiCliRuntime {
    fn name(&self) -> &str {
        "gemini_cli"
    }

    async fn open_session(
        &self,
        _persona: &Persona,
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
        sessions.insert(
            session_id.to_string(),
            CliSession {
                user_id: user_id.to_string(),
                reader: None,
            },
        );
        Ok(())
    }

    async fn run(
        &self,
        persona: &Persona,
        session_id: &str,
        prompt: &str,
    ) -> Result<EventStream, AgentError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| AgentError::Session(format!("unknown session {}", session_id)))?;
        if session.reader.is_some() {
            return Err(AgentError::Session(format!(
                "session {} already has a turn in flight",
                session_id
            )));
        }

        let mut child = self.command(persona, prompt).spawn().map_err(map_spawn_err)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::CliError("stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AgentError::CliError("stderr unavailable".to_string()))?;

        tracing::debug!(
            "gemini turn started: session={} user={} persona={}",
            session_id,
            session.user_id,
            persona.id
        );

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = tokio::spawn(pump_events(child, stdout, stderr, tx));
        session.reader = Some(handle.abort_handle());

        Ok(receiver_stream(rx))
    }

    async fn close_session(&self, session_id: &str) {
        let removed = self.sessions.lock().await.remove(session_id);
        // Aborting the pump drops the child, and kill_on_drop reaps the process.
        if let Some(CliSession {
            reader: Some(handle),
            ..
        }) = removed
        {
            handle.abort();
        }
    }
}

fn receiver_stream(rx: mpsc::Receiver<Result<ModelEvent, AgentError>>) -> EventStream {
    futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed()
}

async fn pump_events(
    mut child: Child,
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
    tx: mpsc::Sender<Result<ModelEvent, AgentError>>,
) {
    let mut parser = StreamJsonParser::new();
    let mut stdout_chunk = [0u8; 4096];
    let mut stderr_chunk = [0u8; 1024];
    let mut stderr_buf = Vec::new();
    let mut stderr_open = true;

    loop {
        tokio::select! {
            result = stdout.read(&mut stdout_chunk) => {
                match result {
                    Ok(0) => break,
                    Ok(n) => {
                        for event in parser.parse_chunk(&stdout_chunk[..n]) {
                            if tx.send(Ok(clean_event(event))).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx
                            .send(Err(AgentError::CliError(format!("stdout read error: {}", e))))
                            .await;
                        return;
                    }
                }
            }
            result = stderr.read(&mut stderr_chunk), if stderr_open => {
                match result {
                    Ok(0) => stderr_open = false,
                    Ok(n) => append_capped(&mut stderr_buf, &stderr_chunk[..n]),
                    Err(e) => {
                        tracing::warn!("stderr read error (non-fatal): {}", e);
                        stderr_open = false;
                    }
                }
            }
        }
    }

    for event in parser.finish() {
        if tx.send(Ok(clean_event(event))).await.is_err() {
            return;
        }
    }

    while stderr_open {
        match stderr.read(&mut stderr_chunk).await {
            Ok(0) | Err(_) => stderr_open = false,
            Ok(n) => append_capped(&mut stderr_buf, &stderr_chunk[..n]),
        }
    }

    match child.wait().await {
        Ok(status) if status.success() => {}
        Ok(status) => {
            let stderr_str = String::from_utf8_lossy(&stderr_buf);
            let _ = tx
                .send(Err(AgentError::CliError(format!(
                    "gemini exit {}: {}",
                    status,
                    truncate_chars(stderr_str.trim(), 500)
                ))))
                .await;
        }
        Err(e) => {
            let _ = tx
                .send(Err(AgentError::CliError(format!("wait error: {}", e))))
                .await;
        }
    }
}

fn append_capped(buf: &mut Vec<u8>, chunk: &[u8]) {
    let remaining = STDERR_CAP_BYTES.saturating_sub(buf.len());
    if remaining > 0 {
        buf.extend_from_slice(&chunk[..remaining.min(chunk.len())]);
    }
}

fn clean_event(event: ModelEvent) -> ModelEvent {
    match event {
        ModelEvent::Content { text } => ModelEvent::Content {
            text: strip_ansi_codes(&text),
        },
        ModelEvent::Message {
            role,
            content,
            delta,
        } => ModelEvent::Message {
            role,
            content: strip_ansi_codes(&content),
            delta,
        },
        other => other,
    }
}

fn compose_cli_prompt(persona: &Persona, prompt: &str) -> String {
    format!("{}\n\n---\n\n{}", persona.instruction.trim(), prompt.trim())
}

fn map_spawn_err(err: std::io::Error) -> AgentError {
    if err.kind() == std::io::ErrorKind::NotFound {
        AgentError::NotFound
    } else {
        AgentError::CliError(err.to_string())
    }
}

fn strip_ansi_codes(input: &str) -> String {
    static ANSI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").unwrap());
    ANSI_RE.replace_all(input, "").to_string()
}

fn truncate_chars(input: &str, max: usize) -> String {
    let mut out = String::new();
    for (idx, ch) in input.chars().enumerate() {
        if idx >= max {
            out.push_str("...");
            break;
        }
        out.push(ch);
    }
    out
}
