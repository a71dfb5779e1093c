//! Emotional support: compassionate reframes, a breath-and-body anchor, resources.

use std::sync::Arc;

use serde_json::{Value, json};

use super::{PureTool, ToolError, ToolSet, str_arg, str_arg_or, u32_arg_or};

/// (trigger phrases, validation, perspective, reframe); first match wins.
type ReframeRule = (
    &'static [&'static str],
    &'static str,
    &'static str,
    &'static str,
);

const REFRAME_RULES: &[ReframeRule] = &[
    (
        &["i'm a failure", "i'm an idiot", "i'm stupid", "i'm worthless", "i'm a mess", "i'm useless"],
        "I hear that you're being really hard on yourself right now. That pain is real.",
        "Having a difficult moment, or even many difficult moments, doesn't define who you are as a person.",
        "What if we separated the behavior from your identity? Instead of 'I am a failure,' try 'I'm struggling with something challenging right now, and I'm learning.'",
    ),
    (
        &["should have", "shouldn't have", "should've", "shouldn't've"],
        "Hindsight can be painful. It's hard when we wish we'd done something differently.",
        "You made the best decision you could with the information, resources, and emotional state you had in that moment.",
        "Instead of 'I should have...', try 'Next time, I'd like to try...'. This shifts from shame to growth.",
    ),
    (
        &["can't", "cannot"],
        "Feeling stuck or incapable is a heavy feeling to carry.",
        "Often 'I can't' actually means 'I don't know how yet' or 'This feels too hard right now with the resources I have.'",
        "What if 'I can't' became 'I haven't figured out how yet'? That leaves room for possibility.",
    ),
    (
        &["ruined", "disaster", "terrible", "worst", "horrible"],
        "When things feel catastrophic, it's because they really matter to you.",
        "When we're overwhelmed, our brain sometimes overestimates the threat while trying to protect us.",
        "What's the actual impact in a week, a month, a year? Is it permanently ruined, or just hard right now?",
    ),
    (
        &["everyone else", "other people", "others can", "they can"],
        "Comparison is painful, especially when it feels like everyone else has it figured out.",
        "You're comparing your messy inside to everyone else's curated outside.",
        "Ask instead: 'Am I making progress compared to where I was last month?' That's the comparison that matters.",
    ),
    (
        &["not good enough", "not enough", "should be better", "have to be perfect"],
        "The drive to be 'good enough' often comes from wanting to be loved, safe, valued. That's deeply human.",
        "Perfectionism is an impossible standard that keeps you perpetually dissatisfied.",
        "What if progress, effort, and showing up imperfectly counted? Because they do.",
    ),
];

const ALWAYS_NEVER: &[&str] = &["always", "never"];
const FAILING: &[&str] = &["fail", "mess up", "screw up", "wrong"];

pub fn reframe(negative_self_talk: &str) -> String {
    let lower = negative_self_talk.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let (validation, perspective, reframe) = if contains_any(REFRAME_RULES[0].0) {
        (REFRAME_RULES[0].1, REFRAME_RULES[0].2, REFRAME_RULES[0].3)
    } else if contains_any(ALWAYS_NEVER) && contains_any(FAILING) {
        (
            "It feels like this pattern keeps happening, and that's incredibly frustrating.",
            "Words like 'always' and 'never' are heavy. They erase all the times things went differently.",
            "Get specific: instead of 'I always fail,' try 'This particular situation didn't go as I hoped. What can I learn from it?'",
        )
    } else if let Some((_, v, p, r)) = REFRAME_RULES[1..]
        .iter()
        .find(|(words, ..)| contains_any(words))
    {
        (*v, *p, *r)
    } else {
        (
            "The way you're talking to yourself sounds painful. You deserve kindness, especially from yourself.",
            "Self-criticism might feel motivating, but it usually increases shame, anxiety, and paralysis.",
            "What would you say to a dear friend who came to you with this exact struggle? Offer yourself that same warmth.",
        )
    };

    format!(
        "**Reframing: \"{}\"**\n\n**Validation:** {}\n\n**Perspective Shift:** {}\n\n**Compassionate Reframe:** {}\n\n---\n\n**Try this:** place your hand on your heart, take a breath, and say: *\"I'm struggling right now, and that's okay. I'm doing my best. I deserve kindness, especially from myself.\"*",
        negative_self_talk, validation, perspective, reframe
    )
}

/// Breath and body anchor; lighter than the 5-4-3-2-1 practice.
pub fn grounding_exercise(duration: u32) -> Value {
    json!({
        "duration_minutes": duration,
        "technique": "Breath & Body Anchor",
        "purpose": "Come back to the present moment when you're overwhelmed, anxious, or feeling disconnected.",
        "steps": [
            {"action": "Find your breath", "details": "Place one hand on your chest or belly. Feel it rise and fall."},
            {"action": "Feel your body", "details": "Notice where your body touches the ground or chair. Press your feet into the floor."},
            {"action": "Soften one thing", "details": "Is your jaw clenched? Shoulders tight? Consciously soften one place of tension."},
            {"action": "Say something kind", "details": "Silently or aloud: 'I'm here. I'm okay. This moment is manageable.'"},
        ],
        "simple_version": format!(
            "**{}-Minute Grounding**\n1. Breathe: hand on chest.\n2. Ground: feet on floor.\n3. Soften: jaw, shoulders, hands.\n4. Affirm: \"I'm here. I'm okay. This will pass.\"",
            duration
        ),
        "tip": format!("Set a gentle timer for {} minute(s). No fixing, no solving, just grounding.", duration),
    })
}

fn crisis_resources() -> Vec<Value> {
    vec![
        json!({"name": "988 Suicide & Crisis Lifeline", "type": "crisis_line", "contact": "Call or text 988", "availability": "24/7", "url": "https://988lifeline.org"}),
        json!({"name": "Crisis Text Line", "type": "crisis_line", "contact": "Text HOME to 741741", "availability": "24/7", "url": "https://www.crisistextline.org"}),
        json!({"name": "Trevor Project (LGBTQ Youth)", "type": "crisis_line", "contact": "Call 1-866-488-7386 or text START to 678678", "availability": "24/7", "url": "https://www.thetrevorproject.org"}),
        json!({"name": "SAMHSA National Helpline", "type": "crisis_line", "contact": "1-800-662-4357", "availability": "24/7", "url": "https://www.samhsa.gov/find-help/national-helpline"}),
    ]
}

fn therapy_resources() -> Vec<Value> {
    vec![
        json!({"name": "Psychology Today Therapist Directory", "type": "therapy_finder", "url": "https://www.psychologytoday.com/us/therapists"}),
        json!({"name": "Open Path Collective", "type": "affordable_therapy", "description": "Sessions for $30-$80 for those without insurance or with high deductibles.", "url": "https://openpathcollective.org"}),
        json!({"name": "NAMI (National Alliance on Mental Illness)", "type": "support_advocacy", "description": "Free education programs and support groups. Helpline: 1-800-950-6264", "url": "https://www.nami.org"}),
    ]
}

fn anxiety_resources() -> Vec<Value> {
    vec![
        json!({"name": "Anxiety and Depression Association of America (ADAA)", "type": "educational", "url": "https://adaa.org"}),
        json!({"name": "DARE App", "type": "app", "description": "Panic and anxiety support based on exposure therapy and CBT principles."}),
    ]
}

fn depression_resources() -> Vec<Value> {
    vec![
        json!({"name": "Depression and Bipolar Support Alliance (DBSA)", "type": "support_groups", "url": "https://www.dbsalliance.org"}),
        json!({"name": "7 Cups", "type": "peer_support", "description": "Free emotional support through trained listeners.", "url": "https://www.7cups.com"}),
    ]
}

fn student_resources() -> Vec<Value> {
    vec![
        json!({"name": "University Counseling Center", "type": "campus_resource", "description": "Most colleges offer free or low-cost counseling through student health services."}),
        json!({"name": "JED Foundation", "type": "student_mental_health", "url": "https://jedfoundation.org"}),
    ]
}

/// Curated resources for a topic, always ending with a disclaimer entry.
pub fn resources(topic: &str) -> Vec<Value> {
    let lower = topic.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    let mut out = Vec::new();

    if has(&["crisis", "suicide", "emergency", "urgent", "help now"]) {
        out.extend(crisis_resources());
        out.push(json!({
            "name": "Emergency Services",
            "type": "emergency",
            "contact": "Call 911",
            "description": "For immediate medical or psychiatric emergencies, call 911 or go to your nearest emergency room.",
        }));
    }
    if has(&["therapy", "therapist", "counseling"]) {
        out.extend(therapy_resources());
    }
    if has(&["anxiety", "panic"]) {
        out.extend(anxiety_resources());
    }
    if has(&["depression", "depressed"]) {
        out.extend(depression_resources());
    }
    if has(&["student", "college", "school"]) {
        out.extend(student_resources());
    }

    if out.is_empty() || lower == "general" {
        let crisis = crisis_resources();
        out = crisis.into_iter().take(2).chain(therapy_resources()).collect();
        out.push(json!({"name": "Self-Compassion.org", "type": "educational", "url": "https://self-compassion.org"}));
    }

    out.push(json!({
        "type": "disclaimer",
        "notes": [
            "These resources are for informational purposes and do not replace professional medical advice.",
            "If you're in immediate danger, call 911 or go to your nearest emergency room.",
            "Many resources offer sliding scale fees or free services.",
        ],
    }));
    out
}

pub const SELF_COMPASSION: &str = "**Self-Compassion Practice**

Treat yourself with the same kindness you'd offer a good friend.

**1. Mindfulness: name what's hard.**
\"Right now, I'm struggling with ____.\" Just acknowledge it: this is difficult.

**2. Common humanity: you're not alone.**
\"This is a moment of suffering. Suffering is a part of life. Many people have felt this way.\"

**3. Self-kindness: offer yourself warmth.**
Place a hand on your heart and say:
- \"May I be kind to myself in this moment.\"
- \"May I give myself the compassion I need.\"
- \"May I accept myself as I am right now.\"

Or use your own words: what would you say to a dear friend going through this exact thing?

**Practice:** try this once a day for a week, especially in difficult moments. You're not lowering standards; you're meeting yourself with humanity.";

pub fn tools() -> ToolSet {
    ToolSet::new(vec![
        Arc::new(PureTool::new(
            "reframe",
            "Compassionate reframe of harsh self-talk with validation and a perspective shift.",
            || json!({"type": "object", "properties": {"negative_self_talk": {"type": "string"}}, "required": ["negative_self_talk"]}),
            reframe_tool,
        )),
        Arc::new(PureTool::new(
            "grounding_exercise",
            "Short breath-and-body anchor for overwhelm or racing thoughts.",
            || json!({"type": "object", "properties": {"duration": {"type": "integer", "default": 3}}}),
            |args| Ok(grounding_exercise(u32_arg_or(args, "duration", 3))),
        )),
        Arc::new(PureTool::new(
            "resources",
            "Mental health resources by topic: crisis, therapy, anxiety, depression, student, general.",
            || json!({"type": "object", "properties": {"topic": {"type": "string", "default": "general"}}}),
            |args| Ok(Value::Array(resources(&str_arg_or(args, "topic", "general")))),
        )),
        Arc::new(PureTool::new(
            "self_compassion_prompt",
            "Guided three-part self-compassion exercise.",
            || json!({"type": "object", "properties": {}}),
            |_| Ok(json!(SELF_COMPASSION)),
        )),
    ])
}

fn reframe_tool(args: &Value) -> Result<Value, ToolError> {
    let text = str_arg(args, "negative_self_talk", "reframe")?;
    Ok(json!(reframe(&text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reframe_rule_order() {
        assert!(reframe("I'm such an idiot, I'm stupid").contains("separated the behavior"));
        assert!(reframe("I always fail at this").contains("Get specific"));
        assert!(reframe("I should have called her").contains("Next time"));
        assert!(reframe("I can't do anything right").contains("figured out how yet"));
        assert!(reframe("I dislike Mondays").contains("dear friend"));
    }

    #[test]
    fn test_resources_crisis_first() {
        let list = resources("crisis");
        assert_eq!(list[0]["name"], "988 Suicide & Crisis Lifeline");
        assert!(list.iter().any(|r| r["type"] == "emergency"));
        assert_eq!(list.last().unwrap()["type"], "disclaimer");
    }

    #[test]
    fn test_resources_general_default() {
        let list = resources("something unrelated");
        assert_eq!(list.len(), 7);
        assert_eq!(list, resources("general"));
    }

    #[test]
    fn test_grounding_anchor_steps() {
        let g = grounding_exercise(2);
        assert_eq!(g["technique"], "Breath & Body Anchor");
        assert_eq!(g["steps"].as_array().unwrap().len(), 4);
    }
}
