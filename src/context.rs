//! Reflection-journey context: the hint block and the shared persona prompt.

use serde_json::{Map, Value};

use crate::intent::IntentResult;

pub const RECENT_DILEMMAS: &str = "recent_dilemmas";
pub const GROWTH_AREA: &str = "growth_area";
pub const DETECTED_INTENT: &str = "detected_intent";
pub const ROUTING_HINT: &str = "routing_hint";

/// How many of the most recent dilemmas are surfaced to the personas.
const RECENT_LIMIT: usize = 3;

const JOURNEY_INSTRUCTION: &str =
    "Consider the user's ongoing reflection journey when forming your response.";

/// Write the classifier's verdict into the caller context. No-op without a primary.
pub fn enrich_with_intent(context: &mut Map<String, Value>, intent: &IntentResult) {
    if let Some(primary) = intent.primary {
        context.insert(
            DETECTED_INTENT.to_string(),
            Value::String(primary.as_str().to_string()),
        );
        context.insert(
            ROUTING_HINT.to_string(),
            Value::String(primary.routing_hint().to_string()),
        );
    }
}

fn non_empty_str<'a>(context: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    context
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Fold journey state into a short preamble. Malformed values are skipped field by
/// field; an empty string means there is nothing to say.
pub fn build_hint(context: &Map<String, Value>) -> String {
    let mut lines = Vec::new();

    if let Some(Value::Array(items)) = context.get(RECENT_DILEMMAS) {
        let topics: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
        let recent = &topics[topics.len().saturating_sub(RECENT_LIMIT)..];
        if !recent.is_empty() {
            let quoted: Vec<String> = recent.iter().map(|t| format!("\"{}\"", t)).collect();
            lines.push(format!("User has been reflecting on: {}", quoted.join(", ")));
        }
    }
    if let Some(area) = non_empty_str(context, GROWTH_AREA) {
        lines.push(format!("Focus area: {}", area));
    }
    if let Some(intent) = non_empty_str(context, DETECTED_INTENT) {
        lines.push(format!("Detected user intent: {}", intent));
    }
    if let Some(hint) = non_empty_str(context, ROUTING_HINT) {
        lines.push(format!("💡 {}", hint));
    }

    if lines.is_empty() {
        return String::new();
    }
    format!("\n**Reflection Journey Context:**\n{}\n", lines.join("\n"))
}

/// The one prompt every persona receives for a dilemma.
pub fn compose_prompt(dilemma: &str, context: &Map<String, Value>, hint: &str) -> String {
    let raw_context = if context.is_empty() {
        "No additional context provided".to_string()
    } else {
        Value::Object(context.clone()).to_string()
    };
    let journey = if hint.is_empty() { "" } else { JOURNEY_INSTRUCTION };

    format!(
        "User Dilemma: {}\n\nContext: {}\n{}\n\nPlease provide your unique perspective and guidance for this dilemma.\n{}",
        dilemma, raw_context, hint, journey
    )
    .trim_end()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::classify;
    use serde_json::json;

    fn ctx(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_empty_context_yields_empty_hint() {
        assert_eq!(build_hint(&Map::new()), "");
    }

    #[test]
    fn test_recent_dilemmas_keeps_last_three() {
        let hint = build_hint(&ctx(json!({"recent_dilemmas": ["A", "B", "C", "D"]})));
        assert!(hint.contains("User has been reflecting on: \"B\", \"C\", \"D\""));
        assert!(!hint.contains("\"A\""));
        assert!(hint.starts_with("\n**Reflection Journey Context:**\n"));
    }

    #[test]
    fn test_non_string_entries_skipped() {
        let hint = build_hint(&ctx(json!({"recent_dilemmas": ["A", 7, null, "B"]})));
        assert!(hint.contains("\"A\", \"B\""));

        let hint = build_hint(&ctx(json!({"recent_dilemmas": "not a list", "growth_area": 5})));
        assert_eq!(hint, "");
    }

    #[test]
    fn test_line_order() {
        let hint = build_hint(&ctx(json!({
            "routing_hint": "Sage leads",
            "detected_intent": "mindfulness",
            "growth_area": "work-life balance",
            "recent_dilemmas": ["X"]
        })));
        let expected = "\n**Reflection Journey Context:**\nUser has been reflecting on: \"X\"\nFocus area: work-life balance\nDetected user intent: mindfulness\n💡 Sage leads\n";
        assert_eq!(hint, expected);
    }

    #[test]
    fn test_enrich_overwrites_detected_intent() {
        let mut context = ctx(json!({"detected_intent": "stale"}));
        enrich_with_intent(&mut context, &classify("please book me a slot"));
        assert_eq!(context[DETECTED_INTENT], "schedule");
        assert!(context[ROUTING_HINT].as_str().unwrap().contains("Alex"));

        let mut untouched = Map::new();
        enrich_with_intent(&mut untouched, &classify("nothing here"));
        assert!(untouched.is_empty());
    }

    #[test]
    fn test_prompt_without_journey() {
        let prompt = compose_prompt("Should I move?", &Map::new(), "");
        assert!(prompt.starts_with("User Dilemma: Should I move?"));
        assert!(prompt.contains("Context: No additional context provided"));
        assert!(!prompt.contains("reflection journey"));
    }

    #[test]
    fn test_prompt_with_journey() {
        let context = ctx(json!({"growth_area": "career"}));
        let hint = build_hint(&context);
        let prompt = compose_prompt("Should I move?", &context, &hint);
        assert!(prompt.contains("Focus area: career"));
        assert!(prompt.ends_with(JOURNEY_INSTRUCTION));
    }
}
