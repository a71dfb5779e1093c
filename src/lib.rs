//! Multi-persona reflection: one dilemma fanned out to four independently prompted
//! coaching personas, then reduced to a short list of concrete actions.

pub mod calendar;
pub mod clients;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod invoker;
pub mod orchestrator;
pub mod personas;
pub mod synthesis;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use calendar::{CalendarService, InMemoryCalendar};
pub use clients::{AgentError, ModelEvent, ModelRuntime};
pub use config::Config;
pub use dispatch::{FALLBACK_RESPONSE, PersonaResponse, ReflectionResult};
pub use error::{PersonaReflectError, Result};
pub use intent::{IntentResult, IntentTag};
pub use orchestrator::{
    ANALYST_OUTLINE, Orchestrator, OrchestratorSettings, ScheduleSuggestion, SlotOption,
};
pub use personas::{Persona, PersonaRegistry, PersonaSummary};
pub use synthesis::{ACTION_PLAN_RETRY, ActionPlan};
