//! Domain-specific error types for persona-reflect

use thiserror::Error;

use crate::calendar::CalendarError;
use crate::clients::AgentError;

/// Main error type for the persona-reflect orchestration core
///
/// Per-persona model failures never reach this type; the dispatcher turns them
/// into fallback text. What does surface is bad caller input, a runtime that
/// could not be built, and calendar operations invoked directly.
#[derive(Error, Debug)]
pub enum PersonaReflectError {
    #[error("Model runtime error: {message}")]
    Runtime { message: String },

    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl From<AgentError> for PersonaReflectError {
    fn from(err: AgentError) -> Self {
        PersonaReflectError::Runtime {
            message: err.to_string(),
        }
    }
}

/// Result type alias for persona-reflect operations
pub type Result<T> = std::result::Result<T, PersonaReflectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_maps_to_runtime() {
        let err: PersonaReflectError = AgentError::Transport("tls backend missing".into()).into();
        assert!(matches!(err, PersonaReflectError::Runtime { .. }));
        assert!(err.to_string().contains("tls backend missing"));
    }

    #[test]
    fn test_calendar_error_keeps_source() {
        let err: PersonaReflectError =
            CalendarError::InvalidArgument("days must be at most 365".into()).into();
        assert!(matches!(
            err,
            PersonaReflectError::Calendar(CalendarError::InvalidArgument(_))
        ));
        assert!(err.to_string().starts_with("Calendar error: invalid argument"));
    }
}
