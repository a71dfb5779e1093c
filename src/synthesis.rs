//! Second-stage model calls that reduce persona responses to ordered action steps.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::dispatch::PersonaResponse;
use crate::invoker::AgentInvoker;
use crate::personas::Persona;

pub const MAX_SUGGESTED_ACTIONS: usize = 5;
pub const MAX_PLAN_STEPS: usize = 7;
pub const ACTION_PLAN_RETRY: &str = "Please try creating your action plan again";

/// User id for calls the orchestrator makes on its own behalf.
pub const SYSTEM_USER: &str = "persona_reflect";

const SYNTHESIS_LABEL: &str = "orchestrator-synthesis";
const ACTION_PLAN_LABEL: &str = "orchestrator-action-plan";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionPlan {
    pub id: String,
    pub entry_id: String,
    pub steps: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// `"{name} ({persona_id}): {text}"` blocks separated by blank lines.
pub fn format_responses(responses: &[PersonaResponse]) -> String {
    responses
        .iter()
        .map(|r| format!("{} ({}): {}", r.display_name, r.persona_id, r.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Split model output into steps: drop blank lines, strip list numbering
/// (leading digits, dots, spaces), drop lines left empty, keep at most `cap`.
pub fn normalize_steps(raw: &str, cap: usize) -> Vec<String> {
    raw.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ' ')
                .trim()
        })
        .filter(|step| !step.is_empty())
        .take(cap)
        .map(str::to_string)
        .collect()
}

fn synthesis_prompt(responses: &[PersonaResponse], dilemma: &str) -> String {
    format!(
        "Based on the following diverse perspectives on this dilemma:\n\n\
         Dilemma: {}\n\n\
         Perspectives:\n{}\n\n\
         Please synthesize these insights into 3-5 concrete, actionable steps.\n\
         Focus on practical actions the user can take immediately.\n\
         Return only the action steps as a numbered list.",
        dilemma,
        format_responses(responses)
    )
}

fn action_plan_prompt(responses: &[PersonaResponse], preferences: &Map<String, Value>) -> String {
    let preferences = if preferences.is_empty() {
        "None specified".to_string()
    } else {
        Value::Object(preferences.clone()).to_string()
    };
    format!(
        "Create a detailed action plan based on these coaching perspectives:\n\n\
         {}\n\n\
         User preferences: {}\n\n\
         Generate 5-7 specific, measurable action steps that:\n\
         1. Are immediately actionable\n\
         2. Build on each other progressively\n\
         3. Address the core issues identified\n\
         4. Can be tracked and measured\n\n\
         Return only the action steps as a numbered list.",
        format_responses(responses),
        preferences
    )
}

/// Reduces one dispatch's responses to at most five suggested actions.
#[derive(Clone)]
pub struct Synthesizer {
    invoker: AgentInvoker,
    persona: Arc<Persona>,
}

impl Synthesizer {
    pub fn new(invoker: AgentInvoker, persona: Arc<Persona>) -> Self {
        Self { invoker, persona }
    }

    /// Never fails; a model failure degrades to an empty list.
    pub async fn synthesize(&self, responses: &[PersonaResponse], dilemma: &str) -> Vec<String> {
        let prompt = synthesis_prompt(responses, dilemma);
        match self
            .invoker
            .invoke(&self.persona, &prompt, SYNTHESIS_LABEL, SYSTEM_USER)
            .await
        {
            Ok(text) => normalize_steps(&text, MAX_SUGGESTED_ACTIONS),
            Err(e) => {
                tracing::warn!("action synthesis failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Builds an on-demand plan of up to seven steps from an existing response set.
#[derive(Clone)]
pub struct ActionPlanBuilder {
    invoker: AgentInvoker,
    persona: Arc<Persona>,
}

impl ActionPlanBuilder {
    pub fn new(invoker: AgentInvoker, persona: Arc<Persona>) -> Self {
        Self { invoker, persona }
    }

    /// On model failure or an empty result the plan holds a single retry step.
    pub async fn build(
        &self,
        entry_id: &str,
        responses: &[PersonaResponse],
        preferences: &Map<String, Value>,
    ) -> ActionPlan {
        let prompt = action_plan_prompt(responses, preferences);
        let steps = match self
            .invoker
            .invoke(&self.persona, &prompt, ACTION_PLAN_LABEL, SYSTEM_USER)
            .await
        {
            Ok(text) => normalize_steps(&text, MAX_PLAN_STEPS),
            Err(e) => {
                tracing::warn!("action plan for {} failed: {}", entry_id, e);
                Vec::new()
            }
        };

        let steps = if steps.is_empty() {
            vec![ACTION_PLAN_RETRY.to_string()]
        } else {
            steps
        };

        ActionPlan {
            id: format!("ap-{}", Uuid::new_v4().simple()),
            entry_id: entry_id.to_string(),
            steps,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{ModelEvent, ModelRuntime};
    use crate::test_support::{Script, ScriptedRuntime};

    fn responses() -> Vec<PersonaResponse> {
        vec![
            PersonaResponse {
                persona_id: "cognitive-behavioral".into(),
                display_name: "Dr. Chen".into(),
                icon: "🧠".into(),
                text: "Challenge the thought.".into(),
            },
            PersonaResponse {
                persona_id: "empathetic-friend".into(),
                display_name: "Maya".into(),
                icon: "💙".into(),
                text: "Be gentle.".into(),
            },
        ]
    }

    fn parts(script: Script) -> (AgentInvoker, Arc<Persona>, Arc<ScriptedRuntime>) {
        let runtime = Arc::new(ScriptedRuntime::new().script("orchestrator", script));
        let invoker = AgentInvoker::new(runtime.clone() as Arc<dyn ModelRuntime>);
        let persona = Arc::new(Persona::bare("orchestrator", "Orchestrator", "🎭", "synthesize"));
        (invoker, persona, runtime)
    }

    #[test]
    fn test_normalize_strips_numbering_and_blanks() {
        let raw = "\n1. Breathe\n\n  2) Walk\n3.   \n10. Journal\n...\nCall a friend";
        assert_eq!(
            normalize_steps(raw, 10),
            vec!["Breathe", ") Walk", "Journal", "Call a friend"]
        );
    }

    #[test]
    fn test_normalize_caps() {
        let raw = (1..=9).map(|i| format!("{}. step {}", i, i)).collect::<Vec<_>>().join("\n");
        let steps = normalize_steps(&raw, MAX_SUGGESTED_ACTIONS);
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[4], "step 5");
    }

    #[test]
    fn test_format_responses_block() {
        assert_eq!(
            format_responses(&responses()),
            "Dr. Chen (cognitive-behavioral): Challenge the thought.\n\nMaya (empathetic-friend): Be gentle."
        );
    }

    #[tokio::test]
    async fn test_synthesize_noisy_output() {
        let noisy = "Here you go:\n\n1. One\n2. Two\n\n3. Three\n4. Four\n5. Five\n6. Six\n";
        let (invoker, persona, runtime) = parts(Script::Reply(noisy.into()));
        let actions = Synthesizer::new(invoker, persona)
            .synthesize(&responses(), "Should I quit?")
            .await;
        assert_eq!(actions.len(), 5);
        assert_eq!(actions[0], "Here you go:");
        assert!(actions.iter().all(|a| !a.trim().is_empty()));

        let (persona_id, prompt) = &runtime.prompts()[0];
        assert_eq!(persona_id, "orchestrator");
        assert!(prompt.contains("Dilemma: Should I quit?"));
        assert!(prompt.contains("Maya (empathetic-friend): Be gentle."));
        assert!(runtime.session_ids()[0].starts_with("orchestrator-synthesis-"));
    }

    #[tokio::test]
    async fn test_synthesize_failure_is_empty() {
        let (invoker, persona, _) = parts(Script::Fail("down".into()));
        let actions = Synthesizer::new(invoker, persona)
            .synthesize(&responses(), "x")
            .await;
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_action_plan_retry_on_error() {
        let (invoker, persona, _) = parts(Script::Events(vec![ModelEvent::Error {
            message: "boom".into(),
        }]));
        let plan = ActionPlanBuilder::new(invoker, persona)
            .build("entry-1", &responses(), &Map::new())
            .await;
        assert_eq!(plan.steps, vec![ACTION_PLAN_RETRY]);
        assert_eq!(plan.entry_id, "entry-1");
        assert!(plan.id.starts_with("ap-"));
    }

    #[tokio::test]
    async fn test_action_plan_retry_on_blank_output() {
        let (invoker, persona, _) = parts(Script::Reply("\n  \n1. \n".into()));
        let plan = ActionPlanBuilder::new(invoker, persona)
            .build("entry-2", &responses(), &Map::new())
            .await;
        assert_eq!(plan.steps, vec![ACTION_PLAN_RETRY]);
    }

    #[tokio::test]
    async fn test_action_plan_caps_and_uses_preferences() {
        let raw = (1..=9).map(|i| format!("{}. step {}", i, i)).collect::<Vec<_>>().join("\n");
        let (invoker, persona, runtime) = parts(Script::Reply(raw));
        let mut prefs = Map::new();
        prefs.insert("time_per_day".into(), Value::String("30 minutes".into()));
        let plan = ActionPlanBuilder::new(invoker, persona)
            .build("entry-3", &responses(), &prefs)
            .await;
        assert_eq!(plan.steps.len(), MAX_PLAN_STEPS);
        let prompt = &runtime.prompts()[0].1;
        assert!(prompt.contains("30 minutes"));
        assert!(!prompt.contains("None specified"));
    }
}
