//! Cognitive-behavioral tools: distortion spotting, behavioral activation, thought records.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

use super::{PureTool, ToolError, ToolSet, str_arg, str_list_arg, u32_arg_or};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Distortion {
    pub distortion: &'static str,
    pub evidence: String,
    pub explanation: &'static str,
    pub reframe: &'static str,
    pub severity: &'static str,
}

const ABSOLUTE_WORDS: &[&str] = &[
    "always", "never", "every", "everyone", "no one", "everything", "nothing", "completely",
    "totally",
];
const CATASTROPHE_WORDS: &[&str] = &[
    "disaster", "terrible", "awful", "horrible", "worst", "ruined", "catastrophe",
    "end of the world",
];
const SHOULD_WORDS: &[&str] = &["should", "must", "ought to", "have to", "need to"];
const NEGATORS: &[&str] = &["but", "can't", "don't", "not"];
const PERSONALIZATION: &[&str] = &[
    "my fault", "because of me", "i caused", "i ruined", "i'm responsible for",
];
const FILTER_WORDS: &[&str] = &["only", "just", "nothing but", "except"];
const NEGATIVE_WORDS: &[&str] = &["bad", "wrong", "negative", "failed", "problem"];

static OVERGENERALIZATION: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(failed|messed up|didn't work).*(always|never)").unwrap(),
            "One setback doesn't define all future outcomes",
        ),
        (
            Regex::new(r"(can't|cannot).*(anything|everything)").unwrap(),
            "Struggling with one thing doesn't mean inability in all areas",
        ),
    ]
});

static LABELING: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"i am (a|an)?\s*(failure|loser|idiot|stupid|worthless|useless)").unwrap(),
        Regex::new(r"i'm (such a|just a|a total|a complete)?\s*(failure|loser|idiot|stupid|mess)")
            .unwrap(),
    ]
});

static EMOTIONAL_REASONING: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"i feel (like)?\s*(a failure|worthless|stupid)").unwrap(),
        Regex::new(r"(feel|feeling).*(so|therefore|means).*(i am|i'm)").unwrap(),
    ]
});

static INTENSITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*%?").unwrap());
static TRAILING_INTENSITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()\-\d%\s]+$").unwrap());

fn found<'a>(text: &str, words: &[&'a str]) -> Vec<&'a str> {
    words.iter().copied().filter(|w| text.contains(w)).collect()
}

pub fn identify_distortions(text: &str) -> Vec<Distortion> {
    let lower = text.to_lowercase();
    let mut out = Vec::new();

    let absolutes = found(&lower, ABSOLUTE_WORDS);
    if !absolutes.is_empty() {
        out.push(Distortion {
            distortion: "all-or-nothing",
            evidence: absolutes.join(", "),
            explanation: "Using absolute or extreme language suggests black-and-white thinking. Reality often exists in shades of gray.",
            reframe: "Consider: Are there exceptions? Degrees? Nuances in this situation?",
            severity: "moderate",
        });
    }

    let catastrophes = found(&lower, CATASTROPHE_WORDS);
    if !catastrophes.is_empty() {
        out.push(Distortion {
            distortion: "catastrophizing",
            evidence: catastrophes.join(", "),
            explanation: "Imagining the worst possible outcome or magnifying negative aspects.",
            reframe: "What's the most realistic outcome? What would you tell a friend in this situation?",
            severity: "high",
        });
    }

    if let Some((m, reframe)) = OVERGENERALIZATION
        .iter()
        .find_map(|(re, reframe)| re.find(&lower).map(|m| (m, *reframe)))
    {
        out.push(Distortion {
            distortion: "overgeneralization",
            evidence: m.as_str().to_string(),
            explanation: "Drawing broad conclusions from a single incident.",
            reframe,
            severity: "moderate",
        });
    }

    let shoulds = found(&lower, SHOULD_WORDS);
    if !shoulds.is_empty() && NEGATORS.iter().any(|w| lower.contains(w)) {
        out.push(Distortion {
            distortion: "should-statements",
            evidence: shoulds.join(", "),
            explanation: "Rigid rules about how you 'should' be can create unnecessary guilt and pressure.",
            reframe: "Replace 'should' with 'I would prefer to' or 'It would be nice if'. This reduces shame.",
            severity: "moderate",
        });
    }

    if let Some(m) = LABELING.iter().find_map(|re| re.find(&lower)) {
        out.push(Distortion {
            distortion: "labeling",
            evidence: m.as_str().to_string(),
            explanation: "Defining yourself by a single characteristic or mistake is inaccurate and harmful.",
            reframe: "You had a human experience. You are not defined by one moment, thought, or outcome.",
            severity: "high",
        });
    }

    if let Some(m) = EMOTIONAL_REASONING.iter().find_map(|re| re.find(&lower)) {
        out.push(Distortion {
            distortion: "emotional-reasoning",
            evidence: m.as_str().to_string(),
            explanation: "Feelings are real, but they aren't facts. Feeling like a failure doesn't make it true.",
            reframe: "Separate the feeling from the fact. Ask: What's the objective evidence?",
            severity: "moderate",
        });
    }

    let personal = found(&lower, PERSONALIZATION);
    if !personal.is_empty() {
        out.push(Distortion {
            distortion: "personalization",
            evidence: personal.join(", "),
            explanation: "Taking excessive responsibility for events outside your complete control.",
            reframe: "What factors were truly within your control? What role did circumstances play?",
            severity: "moderate",
        });
    }

    if FILTER_WORDS.iter().any(|w| lower.contains(w))
        && NEGATIVE_WORDS.iter().any(|w| lower.contains(w))
    {
        out.push(Distortion {
            distortion: "mental-filtering",
            evidence: "Focus appears exclusively on negative aspects".to_string(),
            explanation: "Filtering out positive aspects while magnifying the negative creates distorted view.",
            reframe: "What's being overlooked? What went right or neutral, even in a small way?",
            severity: "moderate",
        });
    }

    if out.is_empty() {
        out.push(Distortion {
            distortion: "none-detected",
            evidence: String::new(),
            explanation: "No obvious cognitive distortions detected in this statement. The thinking appears balanced.",
            reframe: "This thought seems grounded in reality. Continue examining evidence objectively.",
            severity: "none",
        });
    }
    out
}

/// (category, trigger words, micro action template, success criteria, next step)
type ActivationRule = (
    &'static str,
    &'static [&'static str],
    &'static str,
    &'static str,
    &'static str,
);

const ACTIVATION_RULES: &[ActivationRule] = &[
    (
        "writing",
        &["write", "paper", "essay", "report", "email", "document"],
        "Open a blank document and write just the title or first sentence. Nothing more for {m} minutes.",
        "A document exists with at least one sentence written",
        "Spend 5 minutes brainstorming 3 key points you want to make",
    ),
    (
        "studying",
        &["study", "read", "learn", "review", "research"],
        "Gather materials (book, notes, laptop) and read just the first paragraph or section heading for {m} minutes.",
        "Materials are in front of you and you've read something, even just a title",
        "Spend 5 minutes highlighting or noting one interesting thing you learned",
    ),
    (
        "exercise",
        &["exercise", "workout", "run", "gym", "walk"],
        "Put on workout clothes or shoes. That's it. You have permission to stop after {m} minutes.",
        "You're wearing appropriate clothing for the activity",
        "Step outside or do 5 minutes of gentle movement (stretching, short walk)",
    ),
    (
        "organizing",
        &["clean", "organize", "tidy", "declutter"],
        "Set a timer for {m} minutes and clear just one small surface (desk corner, nightstand, counter).",
        "One visible area is clearer than before",
        "Take a 2-minute break, then tackle one drawer or shelf for 5 minutes",
    ),
    (
        "communication",
        &["call", "message", "reach out", "contact"],
        "Write or speak the first sentence of what you need to say. Don't send yet, just draft it for {m} minutes.",
        "First sentence exists in draft form",
        "Add 1-2 more sentences to complete your main point",
    ),
    (
        "application",
        &["apply", "application", "form", "submit"],
        "Open the application and read the first question. Fill in just your name and contact info for {m} minutes.",
        "Basic information fields are completed",
        "Answer just the first substantive question in rough draft form",
    ),
    (
        "project",
        &["project", "assignment", "work on"],
        "Create a list of 3-5 tiny steps this project requires. Don't do them, just list them for {m} minutes.",
        "A simple list exists breaking down the project",
        "Pick the smallest item on the list and spend 5 minutes on it",
    ),
];

pub fn behavioral_activation(task: &str, minutes: u32) -> Value {
    let lower = task.to_lowercase();
    let rule = ACTIVATION_RULES
        .iter()
        .find(|(_, words, ..)| words.iter().any(|w| lower.contains(w)));

    let (category, micro_action, success, next_step) = match rule {
        Some((category, _, action, success, next)) => (
            *category,
            action.replace("{m}", &minutes.to_string()),
            success.to_string(),
            next.to_string(),
        ),
        None => (
            "general",
            format!(
                "Spend exactly {} minutes on the absolute smallest first step of '{}'. Set a timer and give yourself permission to stop when it rings.",
                minutes, task
            ),
            format!(
                "You engaged with the task for {} minutes, regardless of outcome",
                minutes
            ),
            "Notice how you feel. If momentum built, continue. If not, take a break and try another 5 minutes later.".to_string(),
        ),
    };

    json!({
        "original_task": task,
        "category": category,
        "micro_action": micro_action,
        "duration_minutes": minutes,
        "rationale": format!("Starting is often the hardest part. Committing to just {} minutes removes the overwhelming feeling of tackling the entire task. Once you start, momentum often builds naturally.", minutes),
        "success_criteria": success,
        "next_step_suggestion": next_step,
        "permission_to_stop": format!("You have full permission to stop after {} minutes. This isn't about finishing, it's about starting.", minutes),
        "tip": "Set a visible timer. When it goes off, check in: continue, or is this a good stopping point? Either choice is valid.",
    })
}

fn intensity_label(intensity: u32) -> &'static str {
    match intensity {
        80.. => "very high",
        60..=79 => "high",
        40..=59 => "moderate",
        20..=39 => "mild",
        _ => "minimal",
    }
}

fn evidence_questions(thought: &str) -> Vec<String> {
    let mut questions = vec![
        format!("What concrete facts support the thought: '{}'?", thought),
        format!("What facts contradict or don't fit with: '{}'?", thought),
        "Am I confusing a thought with a fact?".to_string(),
        "Am I jumping to conclusions without all the information?".to_string(),
    ];
    let lower = thought.to_lowercase();
    if ["always", "never", "every"].iter().any(|w| lower.contains(w)) {
        questions.push("Are there any exceptions to this absolute statement?".to_string());
    }
    if ["should", "must", "have to"].iter().any(|w| lower.contains(w)) {
        questions.push(
            "Who made this rule? Is it flexible? What happens if it's not followed?".to_string(),
        );
    }
    if lower.contains("i am") || lower.contains("i'm") {
        questions.push("Am I defining myself by a single characteristic or moment?".to_string());
    }
    questions
}

/// ABC-model thought record: activating event, beliefs, consequences.
pub fn thought_record(situation: &str, thoughts: &[String], emotions: &[String]) -> Value {
    let parsed_emotions: Vec<Value> = emotions
        .iter()
        .map(|emotion| {
            let intensity = INTENSITY
                .captures(emotion)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u32>().ok());
            let name = match intensity {
                Some(_) => TRAILING_INTENSITY.replace(emotion, "").trim().to_string(),
                None => emotion.trim().to_string(),
            };
            json!({
                "emotion": name,
                "intensity": intensity,
                "intensity_description": intensity.map_or("not specified", intensity_label),
            })
        })
        .collect();

    let thought_analysis: Vec<Value> = thoughts
        .iter()
        .map(|thought| {
            let distortions: Vec<&str> = identify_distortions(thought)
                .into_iter()
                .map(|d| d.distortion)
                .filter(|d| *d != "none-detected")
                .collect();
            json!({
                "thought": thought,
                "potential_distortions": distortions,
                "evidence_questions": evidence_questions(thought),
            })
        })
        .collect();

    json!({
        "abc_model": {
            "A_activating_event": {
                "situation": situation,
                "objective_facts": "What happened, stripped of interpretation?",
                "trigger_identified": !situation.trim().is_empty(),
            },
            "B_beliefs_thoughts": {
                "automatic_thoughts": thoughts,
                "thought_analysis": thought_analysis,
                "core_belief_hint": "Do these thoughts reveal a deeper belief about yourself, others, or the world?",
            },
            "C_consequences": {
                "emotional_summary": format!("{} emotions identified", parsed_emotions.len()),
                "emotions": parsed_emotions,
                "behavioral_consequences": "How did these thoughts affect your actions or urges to act?",
                "physical_sensations": "What did you notice in your body? (tension, heart rate, etc.)",
            },
        },
        "cognitive_restructuring": {
            "evidence_for": "What evidence supports these thoughts? List specific, objective facts.",
            "evidence_against": "What evidence contradicts these thoughts? What am I overlooking?",
            "alternative_thoughts": "What are 2-3 alternative ways to interpret this situation?",
            "friend_perspective": "What would you tell a close friend who had these exact thoughts?",
            "worst_best_realistic": "What's the worst outcome? Best outcome? Most realistic outcome?",
        },
        "balanced_thought_exercise": {
            "instruction": "After examining evidence, write a more balanced thought that:",
            "criteria": [
                "Acknowledges your feelings as valid",
                "Incorporates evidence from both sides",
                "Is more flexible (less absolute)",
                "Is compassionate toward yourself",
                "Focuses on what you can control",
            ],
        },
        "summary": format!(
            "Thought record captured: 1 situation, {} thoughts, {} emotions. Use restructuring prompts to examine evidence and develop balanced perspectives.",
            thoughts.len(),
            emotions.len()
        ),
    })
}

pub fn tools() -> ToolSet {
    ToolSet::new(vec![
        Arc::new(PureTool::new(
            "identify_distortions",
            "Identify cognitive distortions (all-or-nothing, catastrophizing, labeling, ...) in the user's thoughts, with reframes.",
            || json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]}),
            |args| {
                let text = str_arg(args, "text", "identify_distortions")?;
                Ok(serde_json::to_value(identify_distortions(&text)).unwrap_or(Value::Null))
            },
        )),
        Arc::new(PureTool::new(
            "behavioral_activation",
            "Turn an avoided task into a tiny timed first step (the 5-minute rule).",
            || json!({"type": "object", "properties": {"task": {"type": "string"}, "minutes": {"type": "integer", "default": 5}}, "required": ["task"]}),
            |args| {
                let task = str_arg(args, "task", "behavioral_activation")?;
                Ok(behavioral_activation(&task, u32_arg_or(args, "minutes", 5)))
            },
        )),
        Arc::new(PureTool::new(
            "thought_record",
            "Build an ABC-model thought record from a situation, automatic thoughts, and emotions.",
            || json!({"type": "object", "properties": {
                "situation": {"type": "string"},
                "thoughts": {"type": "array", "items": {"type": "string"}},
                "emotions": {"type": "array", "items": {"type": "string"}}
            }, "required": ["situation"]}),
            thought_record_tool,
        )),
    ])
}

fn thought_record_tool(args: &Value) -> Result<Value, ToolError> {
    let situation = str_arg(args, "situation", "thought_record")?;
    Ok(thought_record(
        &situation,
        &str_list_arg(args, "thoughts"),
        &str_list_arg(args, "emotions"),
    ))
}
