//! Bootstrap and public surface of the reflection pipeline.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::calendar::{BookedBlock, CalendarService, InMemoryCalendar, Slot};
use crate::clients::{GeminiCliRuntime, ModelRuntime, OpenAiCompatRuntime};
use crate::config::{Config, Provider};
use crate::dispatch::{ParallelDispatcher, PersonaResponse, ReflectionResult};
use crate::error::{PersonaReflectError, Result};
use crate::invoker::{AgentInvoker, DEFAULT_CALL_TIMEOUT};
use crate::personas::{PersonaRegistry, PersonaSummary, RATIONAL_ANALYST};
use crate::synthesis::{ActionPlan, ActionPlanBuilder, Synthesizer};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub persona_timeout: Duration,
    pub synthesis_timeout: Duration,
    pub work_hours: (u32, u32),
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            persona_timeout: DEFAULT_CALL_TIMEOUT,
            synthesis_timeout: DEFAULT_CALL_TIMEOUT,
            work_hours: (9, 18),
        }
    }
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            persona_timeout: config.dispatch.persona_timeout(),
            synthesis_timeout: config.dispatch.synthesis_timeout(),
            work_hours: config.calendar.work_hours(),
        }
    }
}

/// Shown instead of the analyst's text when that persona could not answer.
pub const ANALYST_OUTLINE: &str =
    "Rational analysis: (fallback)\n- Define goal\n- Constraints\n- Options\n- Metrics\n- Timeline";

/// A free slot with its start split into date and clock time for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotOption {
    #[serde(flatten)]
    pub slot: Slot,
    pub date: String,
    pub time: String,
}

impl From<Slot> for SlotOption {
    fn from(slot: Slot) -> Self {
        let date = slot.start.get(..10).unwrap_or_default().to_string();
        let time = slot.start.get(11..16).unwrap_or_default().to_string();
        Self { slot, date, time }
    }
}

/// The rational analyst's take on a dilemma paired with open calendar slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSuggestion {
    pub entry_id: String,
    pub analysis: String,
    pub slots: Vec<SlotOption>,
}

/// Owns the shared handles (runtime, calendar, registry) for the process lifetime.
pub struct Orchestrator {
    registry: Arc<PersonaRegistry>,
    dispatcher: ParallelDispatcher,
    planner: ActionPlanBuilder,
    calendar: Arc<dyn CalendarService>,
    runtime_name: String,
    work_hours: (u32, u32),
}

impl Orchestrator {
    pub fn new(
        runtime: Arc<dyn ModelRuntime>,
        calendar: Arc<dyn CalendarService>,
        settings: OrchestratorSettings,
    ) -> Self {
        let registry = Arc::new(PersonaRegistry::build(
            Arc::clone(&calendar),
            settings.work_hours,
        ));
        let runtime_name = runtime.name().to_string();
        let persona_invoker =
            AgentInvoker::new(Arc::clone(&runtime)).with_timeout(settings.persona_timeout);
        let synthesis_invoker = AgentInvoker::new(runtime).with_timeout(settings.synthesis_timeout);
        let synthesis_persona = Arc::clone(registry.synthesis_persona());

        let synthesizer = Synthesizer::new(synthesis_invoker.clone(), Arc::clone(&synthesis_persona));
        let planner = ActionPlanBuilder::new(synthesis_invoker, synthesis_persona);
        let dispatcher = ParallelDispatcher::new(Arc::clone(&registry), persona_invoker, synthesizer);

        tracing::info!(
            "orchestrator ready: {} personas on {}",
            registry.len(),
            runtime_name
        );

        Self {
            registry,
            dispatcher,
            planner,
            calendar,
            runtime_name,
            work_hours: settings.work_hours,
        }
    }

    /// Build the runtime and calendar once from configuration and wire everything up.
    /// Fails when the configured runtime cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let rt = &config.runtime;
        let runtime: Arc<dyn ModelRuntime> = match rt.provider {
            Provider::GeminiCli => Arc::new(GeminiCliRuntime::new(&rt.cli_path, &rt.model)),
            Provider::OpenaiCompat => {
                let api_key = rt.api_key();
                if api_key.is_none() {
                    tracing::debug!("{} not set, calling {} without a key", rt.api_key_env, rt.endpoint);
                }
                Arc::new(
                    OpenAiCompatRuntime::new(&rt.endpoint, &rt.model, api_key)?
                        .with_temperature(rt.temperature)
                        .with_max_tool_rounds(rt.max_tool_rounds),
                )
            }
        };
        let calendar: Arc<dyn CalendarService> = Arc::new(InMemoryCalendar::new(
            config.calendar.granularity_minutes,
            config.calendar.timezone.clone(),
        ));
        Ok(Self::new(runtime, calendar, OrchestratorSettings::from(config)))
    }

    pub async fn process_dilemma(
        &self,
        requester_id: &str,
        dilemma: &str,
        context: Map<String, Value>,
    ) -> Result<ReflectionResult> {
        let result = self.dispatcher.dispatch(requester_id, dilemma, context).await?;
        tracing::info!(
            "reflection {} complete with {} suggested actions",
            result.id,
            result.suggested_actions.len()
        );
        Ok(result)
    }

    pub async fn create_action_plan(
        &self,
        entry_id: &str,
        responses: &[PersonaResponse],
        preferences: &Map<String, Value>,
    ) -> Result<ActionPlan> {
        if entry_id.trim().is_empty() {
            return Err(PersonaReflectError::Validation {
                message: "entry_id must not be empty".to_string(),
            });
        }
        Ok(self.planner.build(entry_id, responses, preferences).await)
    }

    /// Run a full reflection, then pair the analyst's response with free slots.
    pub async fn analyst_schedule(
        &self,
        requester_id: &str,
        dilemma: &str,
        days: u32,
        duration_minutes: u32,
        work_hours: Option<(u32, u32)>,
        topk: usize,
    ) -> Result<ScheduleSuggestion> {
        let result = self
            .process_dilemma(requester_id, dilemma, Map::new())
            .await?;
        let analysis = result
            .responses
            .iter()
            .find(|r| r.persona_id == RATIONAL_ANALYST)
            .filter(|r| !r.is_fallback())
            .map(|r| r.text.clone())
            .unwrap_or_else(|| ANALYST_OUTLINE.to_string());
        let slots = self
            .suggest_slots(days, duration_minutes, work_hours, topk)
            .await?
            .into_iter()
            .map(SlotOption::from)
            .collect();

        Ok(ScheduleSuggestion {
            entry_id: result.id,
            analysis,
            slots,
        })
    }

    /// Free slots; `work_hours` defaults to the configured window.
    pub async fn suggest_slots(
        &self,
        days: u32,
        duration_minutes: u32,
        work_hours: Option<(u32, u32)>,
        topk: usize,
    ) -> Result<Vec<Slot>> {
        let hours = work_hours.unwrap_or(self.work_hours);
        Ok(self
            .calendar
            .suggest_slots(days, duration_minutes, hours, topk)
            .await?)
    }

    pub async fn book_block(
        &self,
        title: &str,
        start_iso: &str,
        duration_minutes: u32,
        description: &str,
    ) -> Result<BookedBlock> {
        Ok(self
            .calendar
            .create_block(title, start_iso, duration_minutes, description)
            .await?)
    }

    pub fn personas(&self) -> Vec<PersonaSummary> {
        self.registry.summaries()
    }

    pub fn work_hours(&self) -> (u32, u32) {
        self.work_hours
    }

    pub fn runtime_name(&self) -> &str {
        &self.runtime_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_openai() {
        let mut config = Config::default();
        config.runtime.provider = Provider::OpenaiCompat;
        config.runtime.endpoint = "http://127.0.0.1:9".to_string();
        config.runtime.api_key_env = "PREFLECT_TEST_UNSET_KEY".to_string();
        let orchestrator = Orchestrator::from_config(&config).unwrap();
        assert_eq!(orchestrator.runtime_name(), "openai_compat");
        assert_eq!(orchestrator.personas().len(), 4);
    }

    #[test]
    fn test_from_config_surfaces_runtime_errors() {
        let mut config = Config::default();
        config.runtime.provider = Provider::OpenaiCompat;
        config.runtime.endpoint = "127.0.0.1:9".to_string();
        let err = Orchestrator::from_config(&config).err().unwrap();
        assert!(matches!(err, PersonaReflectError::Runtime { .. }));
    }

    #[test]
    fn test_slot_option_splits_start() {
        let option = SlotOption::from(Slot {
            start: "2025-03-11T09:00:00".to_string(),
            end: "2025-03-11T10:00:00".to_string(),
            label: "Tue 03/11 09:00".to_string(),
        });
        assert_eq!(option.date, "2025-03-11");
        assert_eq!(option.time, "09:00");
        let flat = serde_json::to_value(&option).unwrap();
        assert_eq!(flat["start"], "2025-03-11T09:00:00");
        assert_eq!(flat["label"], "Tue 03/11 09:00");
    }

    #[test]
    fn test_from_config_gemini_carries_work_hours() {
        let mut config = Config::default();
        config.calendar.work_start_hour = 7;
        config.calendar.work_end_hour = 15;
        let orchestrator = Orchestrator::from_config(&config).unwrap();
        assert_eq!(orchestrator.runtime_name(), "gemini_cli");
        assert_eq!(orchestrator.work_hours(), (7, 15));
    }
}
