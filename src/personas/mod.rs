//! The four coaching personas, assembled once at startup and shared read-only.

pub mod prompts;

use std::sync::Arc;

use serde::Serialize;

use crate::calendar::CalendarService;
use crate::tools::{self, ToolSet};

/// One coaching voice. Behavior differences between personas are data, not types.
#[derive(Debug, Clone)]
pub struct Persona {
    pub id: String,
    pub display_name: String,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub instruction: String,
    pub tools: ToolSet,
}

impl Persona {
    /// A persona with no tools and no listing metadata, used for internal
    /// model calls such as synthesis.
    pub fn bare(id: &str, display_name: &str, icon: &str, instruction: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            icon: icon.to_string(),
            title: String::new(),
            description: String::new(),
            instruction: instruction.to_string(),
            tools: ToolSet::default(),
        }
    }

    pub fn summary(&self) -> PersonaSummary {
        PersonaSummary {
            id: self.id.clone(),
            name: self.display_name.clone(),
            icon: self.icon.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            tools: self.tools.names().into_iter().map(str::to_string).collect(),
        }
    }
}

/// Read-only listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaSummary {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub tools: Vec<String>,
}

pub const COGNITIVE_BEHAVIORAL: &str = "cognitive-behavioral";
pub const EMPATHETIC_FRIEND: &str = "empathetic-friend";
pub const RATIONAL_ANALYST: &str = "rational-analyst";
pub const MINDFULNESS_MENTOR: &str = "mindfulness-mentor";

/// Fixed, ordered set of personas. Order is the dispatch order.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: Vec<Arc<Persona>>,
    synthesis: Arc<Persona>,
}

impl PersonaRegistry {
    /// Assemble the registry. The calendar handle goes only to the analyst's tools.
    pub fn build(calendar: Arc<dyn CalendarService>, work_hours: (u32, u32)) -> Self {
        let personas = vec![
            Persona {
                id: COGNITIVE_BEHAVIORAL.to_string(),
                display_name: "Dr. Chen".to_string(),
                icon: "🧠".to_string(),
                title: "Cognitive-Behavioral Coach".to_string(),
                description: "Helps identify thought patterns and develop practical strategies"
                    .to_string(),
                instruction: prompts::compose(
                    prompts::COGNITIVE_BEHAVIORAL_ROLE,
                    prompts::COGNITIVE_BEHAVIORAL_EXAMPLES,
                    prompts::COGNITIVE_BEHAVIORAL_TOOLS,
                ),
                tools: tools::cbt::tools(),
            },
            Persona {
                id: EMPATHETIC_FRIEND.to_string(),
                display_name: "Maya".to_string(),
                icon: "💙".to_string(),
                title: "Empathetic Friend".to_string(),
                description: "Provides emotional support and validation".to_string(),
                instruction: prompts::compose(
                    prompts::EMPATHETIC_FRIEND_ROLE,
                    prompts::EMPATHETIC_FRIEND_EXAMPLES,
                    prompts::EMPATHETIC_FRIEND_TOOLS,
                ),
                tools: tools::support::tools(),
            },
            Persona {
                id: RATIONAL_ANALYST.to_string(),
                display_name: "Alex".to_string(),
                icon: "📊".to_string(),
                title: "Rational Analyst".to_string(),
                description: "Offers structured, data-driven approaches".to_string(),
                instruction: prompts::compose(
                    prompts::RATIONAL_ANALYST_ROLE,
                    prompts::RATIONAL_ANALYST_EXAMPLES,
                    prompts::RATIONAL_ANALYST_TOOLS,
                ),
                tools: tools::calendar::tools(calendar, work_hours),
            },
            Persona {
                id: MINDFULNESS_MENTOR.to_string(),
                display_name: "Sage".to_string(),
                icon: "🧘".to_string(),
                title: "Mindfulness Mentor".to_string(),
                description: "Guides toward present-moment awareness".to_string(),
                instruction: prompts::compose(
                    prompts::MINDFULNESS_MENTOR_ROLE,
                    prompts::MINDFULNESS_MENTOR_EXAMPLES,
                    prompts::MINDFULNESS_MENTOR_TOOLS,
                ),
                tools: tools::mindfulness::tools(),
            },
        ];

        Self {
            personas: personas.into_iter().map(Arc::new).collect(),
            synthesis: Arc::new(Persona::bare(
                "orchestrator",
                "PersonaReflect Orchestrator",
                "🎭",
                prompts::SYNTHESIS_INSTRUCTION,
            )),
        }
    }

    pub fn personas(&self) -> &[Arc<Persona>] {
        &self.personas
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Persona>> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn synthesis_persona(&self) -> &Arc<Persona> {
        &self.synthesis
    }

    pub fn summaries(&self) -> Vec<PersonaSummary> {
        self.personas.iter().map(|p| p.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
