//! Fan-out of one dilemma to every persona, fan-in in registry order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::context;
use crate::error::{PersonaReflectError, Result};
use crate::intent::{self, IntentTag};
use crate::invoker::AgentInvoker;
use crate::personas::{Persona, PersonaRegistry};
use crate::synthesis::Synthesizer;

/// Substituted for any persona whose call failed or produced no text.
pub const FALLBACK_RESPONSE: &str =
    "I'm having trouble processing this right now. Please try again.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonaResponse {
    #[serde(alias = "persona")]
    pub persona_id: String,
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(alias = "response")]
    pub text: String,
}

impl PersonaResponse {
    pub fn is_fallback(&self) -> bool {
        self.text == FALLBACK_RESPONSE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionResult {
    pub id: String,
    pub dilemma: String,
    /// One entry per persona, in registry order
    pub responses: Vec<PersonaResponse>,
    pub suggested_actions: Vec<String>,
    pub detected_intent: Option<IntentTag>,
    pub created_at: DateTime<Utc>,
}

pub struct ParallelDispatcher {
    registry: Arc<PersonaRegistry>,
    invoker: AgentInvoker,
    synthesizer: Synthesizer,
}

impl ParallelDispatcher {
    pub fn new(
        registry: Arc<PersonaRegistry>,
        invoker: AgentInvoker,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            registry,
            invoker,
            synthesizer,
        }
    }

    pub async fn dispatch(
        &self,
        requester_id: &str,
        dilemma: &str,
        mut context: Map<String, Value>,
    ) -> Result<ReflectionResult> {
        if dilemma.trim().is_empty() {
            return Err(PersonaReflectError::Validation {
                message: "dilemma must not be empty".to_string(),
            });
        }

        // Context is only mutated here, before any persona runs.
        let intent = intent::classify(dilemma);
        if let Some(primary) = intent.primary {
            tracing::info!("intent detected: {:?} (primary: {})", intent.matched, primary);
        }
        context::enrich_with_intent(&mut context, &intent);
        let hint = context::build_hint(&context);
        let prompt = context::compose_prompt(dilemma, &context, &hint);

        tracing::info!(
            "dispatching dilemma for {} to {} personas via {}",
            requester_id,
            self.registry.len(),
            self.invoker.runtime_name()
        );

        let calls = self
            .registry
            .personas()
            .iter()
            .map(|persona| self.respond(persona, &prompt, requester_id));
        let responses: Vec<PersonaResponse> = join_all(calls).await;

        let failed = responses.iter().filter(|r| r.is_fallback()).count();
        if failed == responses.len() {
            tracing::warn!("every persona fell back for {}", requester_id);
        } else if failed > 0 {
            tracing::info!("{} of {} personas fell back", failed, responses.len());
        }

        let suggested_actions = self.synthesizer.synthesize(&responses, dilemma).await;

        Ok(ReflectionResult {
            id: format!("entry-{}", Uuid::new_v4().simple()),
            dilemma: dilemma.to_string(),
            responses,
            suggested_actions,
            detected_intent: intent.primary,
            created_at: Utc::now(),
        })
    }

    /// Never fails: errors and empty replies become the fallback text.
    async fn respond(
        &self,
        persona: &Arc<Persona>,
        prompt: &str,
        user_id: &str,
    ) -> PersonaResponse {
        let text = match self.invoker.invoke(persona, prompt, &persona.id, user_id).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("{} returned no text", persona.display_name);
                FALLBACK_RESPONSE.to_string()
            }
            Err(e) => {
                tracing::warn!("error getting response from {}: {}", persona.display_name, e);
                FALLBACK_RESPONSE.to_string()
            }
        };

        PersonaResponse {
            persona_id: persona.id.clone(),
            display_name: persona.display_name.clone(),
            icon: persona.icon.clone(),
            text,
        }
    }
}
