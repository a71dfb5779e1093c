//! Intent classification for dilemma routing
//!
//! Case-insensitive keyword membership across four categories. Every matching
//! category is reported; the primary intent is the first match in
//! `INTENT_PRIORITY`, so overlaps ("anxious" is both cbt and mindfulness) are
//! settled by order alone.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentTag {
    Schedule,
    Cbt,
    Mindfulness,
    Support,
}

impl IntentTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentTag::Schedule => "schedule",
            IntentTag::Cbt => "cbt",
            IntentTag::Mindfulness => "mindfulness",
            IntentTag::Support => "support",
        }
    }

    /// Guidance line telling the personas who should lead.
    pub fn routing_hint(&self) -> &'static str {
        match self {
            IntentTag::Schedule => {
                "User wants to schedule time. Alex (Rational Analyst) should use calendar tools to find and book time slots."
            }
            IntentTag::Cbt => {
                "Focus on identifying thought patterns and cognitive distortions. Dr. Chen should use CBT tools."
            }
            IntentTag::Mindfulness => {
                "User needs grounding and present-moment awareness. Sage should offer mindfulness practices."
            }
            IntentTag::Support => {
                "User may need professional resources or crisis support. Maya should assess and offer appropriate resources."
            }
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            IntentTag::Schedule => SCHEDULE_KEYWORDS,
            IntentTag::Cbt => CBT_KEYWORDS,
            IntentTag::Mindfulness => MINDFULNESS_KEYWORDS,
            IntentTag::Support => SUPPORT_KEYWORDS,
        }
    }
}

impl std::fmt::Display for IntentTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tie-break order for the primary intent.
pub const INTENT_PRIORITY: [IntentTag; 4] = [
    IntentTag::Schedule,
    IntentTag::Cbt,
    IntentTag::Mindfulness,
    IntentTag::Support,
];

/// Keywords that indicate the user wants calendar time
pub const SCHEDULE_KEYWORDS: &[&str] = &[
    "schedule",
    "calendar",
    "time block",
    "plan time",
    "book",
    "set aside",
    "when can i",
    "find time",
    "block out",
    "allocate time",
];

/// Keywords that indicate unhelpful thought patterns
pub const CBT_KEYWORDS: &[&str] = &[
    "stuck",
    "negative thought",
    "anxious",
    "procrastinating",
    "distortion",
    "thinking",
    "worry",
    "ruminating",
    "overthinking",
    "can't stop thinking",
    "spiraling",
    "anxious about",
];

/// Keywords that indicate a need for grounding
pub const MINDFULNESS_KEYWORDS: &[&str] = &[
    "overwhelmed",
    "breathe",
    "grounding",
    "present",
    "anxious",
    "calm down",
    "center",
    "focus",
    "racing thoughts",
    "can't focus",
    "stressed",
    "tense",
    "tight",
    "body",
    "relax",
];

/// Keywords that indicate a need for support or resources
pub const SUPPORT_KEYWORDS: &[&str] = &[
    "help",
    "resources",
    "crisis",
    "don't know what to do",
    "need support",
    "feeling lost",
    "don't know where to turn",
    "therapy",
    "counseling",
    "professional help",
    "suicide",
    "self-harm",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Matched categories in priority order
    pub matched: Vec<IntentTag>,
    pub primary: Option<IntentTag>,
}

/// Classify a dilemma. Pure and deterministic.
///
/// # Examples
/// ```
/// use persona_reflect::intent::{classify, IntentTag};
///
/// let result = classify("Can you schedule time? I'm anxious");
/// assert_eq!(result.primary, Some(IntentTag::Schedule));
/// assert_eq!(result.matched.len(), 3);
/// ```
pub fn classify(text: &str) -> IntentResult {
    let lower = text.to_lowercase();
    let matched: Vec<IntentTag> = INTENT_PRIORITY
        .iter()
        .copied()
        .filter(|tag| tag.keywords().iter().any(|kw| lower.contains(kw)))
        .collect();

    IntentResult {
        primary: matched.first().copied(),
        matched,
    }
}
