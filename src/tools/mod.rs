//! Tool catalog. Each persona owns one `ToolSet`; the sets never share instances.

pub mod calendar;
pub mod cbt;
pub mod mindfulness;
pub mod support;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;

use crate::calendar::CalendarError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// A capability the model may call while answering.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object
    fn parameters_schema(&self) -> Value;

    async fn invoke(&self, args: Value) -> Result<Value, ToolError>;

    /// Function-calling declaration in chat-completions format.
    fn spec(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters_schema(),
            }
        })
    }
}

/// Synchronous, side-effect free tool backed by a plain function.
pub struct PureTool {
    name: &'static str,
    description: &'static str,
    schema: fn() -> Value,
    handler: fn(&Value) -> Result<Value, ToolError>,
}

impl PureTool {
    pub fn new(
        name: &'static str,
        description: &'static str,
        schema: fn() -> Value,
        handler: fn(&Value) -> Result<Value, ToolError>,
    ) -> Self {
        Self {
            name,
            description,
            schema,
            handler,
        }
    }
}

#[async_trait]
impl Tool for PureTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters_schema(&self) -> Value {
        (self.schema)()
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        (self.handler)(&args)
    }
}

/// Ordered, immutable collection of tools owned by one persona.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn schemas(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tracing::debug!("invoking tool {}", name);
        tool.invoke(args).await
    }
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

pub(crate) fn str_arg(args: &Value, key: &str, tool: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: format!("'{}' must be a string", key),
        })
}

pub(crate) fn str_arg_or(args: &Value, key: &str, default: &str) -> String {
    args.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Accepts integers and numeric strings; the model sends both.
pub(crate) fn u32_arg_or(args: &Value, key: &str, default: u32) -> u32 {
    match args.get(key) {
        Some(Value::Number(n)) => n.as_u64().map(|v| v.min(u64::from(u32::MAX)) as u32),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(default)
}

/// Accepts a JSON array of strings or a single string.
pub(crate) fn str_list_arg(args: &Value, key: &str) -> Vec<String> {
    match args.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_schema() -> Value {
        json!({"type": "object", "properties": {"text": {"type": "string"}}})
    }

    fn echo(args: &Value) -> Result<Value, ToolError> {
        Ok(json!(str_arg(args, "text", "echo")?))
    }

    #[tokio::test]
    async fn test_toolset_dispatch() {
        let set = ToolSet::new(vec![Arc::new(PureTool::new(
            "echo",
            "Echo text",
            echo_schema,
            echo,
        ))]);
        assert_eq!(set.names(), vec!["echo"]);
        assert_eq!(set.invoke("echo", json!({"text": "hi"})).await.unwrap(), json!("hi"));
        assert!(matches!(
            set.invoke("missing", json!({})).await,
            Err(ToolError::UnknownTool(_))
        ));
        assert!(matches!(
            set.invoke("echo", json!({})).await,
            Err(ToolError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_spec_shape() {
        let tool = PureTool::new("echo", "Echo text", echo_schema, echo);
        let spec = tool.spec();
        assert_eq!(spec["type"], "function");
        assert_eq!(spec["function"]["name"], "echo");
        assert_eq!(spec["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_argument_helpers() {
        let args = json!({"n": 12, "s": "7", "bad": "x", "list": ["a", 1, "b"], "one": "c"});
        assert_eq!(u32_arg_or(&args, "n", 0), 12);
        assert_eq!(u32_arg_or(&args, "s", 0), 7);
        assert_eq!(u32_arg_or(&args, "bad", 3), 3);
        assert_eq!(u32_arg_or(&args, "absent", 5), 5);
        assert_eq!(str_list_arg(&args, "list"), vec!["a", "b"]);
        assert_eq!(str_list_arg(&args, "one"), vec!["c"]);
        assert!(str_list_arg(&args, "absent").is_empty());
    }
}
