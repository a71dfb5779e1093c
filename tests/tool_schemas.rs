//! Tool catalog exposed to the personas: schema shape and live invocation.

use std::sync::Arc;

use chrono::NaiveDate;
use persona_reflect::calendar::InMemoryCalendar;
use persona_reflect::personas::{
    COGNITIVE_BEHAVIORAL, EMPATHETIC_FRIEND, MINDFULNESS_MENTOR, PersonaRegistry, RATIONAL_ANALYST,
};
use persona_reflect::tools::Tool;
use serde_json::{Value, json};

fn registry() -> PersonaRegistry {
    let now = NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    PersonaRegistry::build(Arc::new(InMemoryCalendar::default().with_clock(now)), (9, 18))
}

fn schema_has_property(schema: &Value, property: &str) -> bool {
    schema["properties"][property].is_object()
}

#[test]
fn test_every_tool_spec_is_a_function() {
    let reg = registry();
    for persona in reg.personas() {
        for spec in persona.tools.schemas() {
            assert_eq!(spec["type"], "function", "{}", persona.id);
            let function = &spec["function"];
            assert!(function["name"].as_str().is_some_and(|n| !n.is_empty()));
            assert!(function["description"].as_str().is_some_and(|d| !d.is_empty()));
            assert_eq!(function["parameters"]["type"], "object");
        }
    }
}

#[test]
fn test_expected_tools_per_persona() {
    let reg = registry();
    let names = |id: &str| reg.get(id).unwrap().tools.names().len();
    assert_eq!(names(COGNITIVE_BEHAVIORAL), 3);
    assert_eq!(names(EMPATHETIC_FRIEND), 4);
    assert_eq!(names(RATIONAL_ANALYST), 3);
    assert_eq!(names(MINDFULNESS_MENTOR), 5);
}

#[test]
fn test_create_block_schema_requires_title_and_start() {
    let reg = registry();
    let tool = reg.get(RATIONAL_ANALYST).unwrap().tools.get("create_block").unwrap().clone();
    let schema = tool.parameters_schema();
    assert!(schema_has_property(&schema, "title"));
    assert!(schema_has_property(&schema, "start_iso"));
    let required: Vec<&str> = schema["required"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(required.contains(&"title"));
    assert!(required.contains(&"start_iso"));
}

#[tokio::test]
async fn test_booking_through_tools_blocks_the_slot() {
    let reg = registry();
    let tools = &reg.get(RATIONAL_ANALYST).unwrap().tools;

    let before = tools
        .invoke("find_free_time", json!({"days": 2, "duration": 60, "topk": 1}))
        .await
        .unwrap();
    let first_start = before[0]["start"].as_str().unwrap().to_string();

    let booked = tools
        .invoke(
            "create_block",
            json!({"title": "Deep work", "start_iso": first_start, "duration": "60"}),
        )
        .await
        .unwrap();
    assert!(booked["htmlLink"].as_str().unwrap().contains(booked["id"].as_str().unwrap()));

    let events = tools.invoke("list_events", json!({"days": 3})).await.unwrap();
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["title"], "Deep work");

    let after = tools
        .invoke("find_free_time", json!({"days": 2, "duration": 60, "topk": 1}))
        .await
        .unwrap();
    assert_ne!(after[0]["start"], before[0]["start"]);
}

#[tokio::test]
async fn test_unknown_tool_is_an_error() {
    let reg = registry();
    let tools = &reg.get(MINDFULNESS_MENTOR).unwrap().tools;
    assert!(tools.invoke("create_block", json!({})).await.is_err());
}
