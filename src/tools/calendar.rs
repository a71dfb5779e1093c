//! Scheduling tools bound to an injected `CalendarService`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, ToolError, ToolSet, str_arg, str_arg_or, u32_arg_or};
use crate::calendar::{CalendarService, MAX_LOOKAHEAD_DAYS};

pub struct ListEvents {
    calendar: Arc<dyn CalendarService>,
}

#[async_trait]
impl Tool for ListEvents {
    fn name(&self) -> &str {
        "list_events"
    }

    fn description(&self) -> &str {
        "List upcoming calendar events within the next N days, earliest first."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {
            "days": {"type": "integer", "default": 7, "maximum": MAX_LOOKAHEAD_DAYS}
        }})
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let events = self
            .calendar
            .list_events(u32_arg_or(&args, "days", 7))
            .await?;
        let rendered: Vec<Value> = events
            .iter()
            .map(|e| {
                json!({
                    "id": e.id,
                    "title": e.title,
                    "start_time": e.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                    "duration": (e.end - e.start).num_minutes(),
                    "timezone": e.timezone,
                })
            })
            .collect();
        Ok(Value::Array(rendered))
    }
}

pub struct FindFreeTime {
    calendar: Arc<dyn CalendarService>,
    work_hours: (u32, u32),
}

#[async_trait]
impl Tool for FindFreeTime {
    fn name(&self) -> &str {
        "find_free_time"
    }

    fn description(&self) -> &str {
        "Suggest free time slots of a given length within working hours over the next N days."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "days": {"type": "integer", "default": 3, "maximum": MAX_LOOKAHEAD_DAYS},
                "duration": {"type": "integer", "description": "minutes", "default": 60},
                "start_hour": {"type": "integer", "default": self.work_hours.0},
                "end_hour": {"type": "integer", "default": self.work_hours.1},
                "topk": {"type": "integer", "default": 3}
            }
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let slots = self
            .calendar
            .suggest_slots(
                u32_arg_or(&args, "days", 3),
                u32_arg_or(&args, "duration", 60),
                (
                    u32_arg_or(&args, "start_hour", self.work_hours.0),
                    u32_arg_or(&args, "end_hour", self.work_hours.1),
                ),
                u32_arg_or(&args, "topk", 3) as usize,
            )
            .await?;
        Ok(serde_json::to_value(slots).unwrap_or(Value::Null))
    }
}

pub struct CreateBlock {
    calendar: Arc<dyn CalendarService>,
}

#[async_trait]
impl Tool for CreateBlock {
    fn name(&self) -> &str {
        "create_block"
    }

    fn description(&self) -> &str {
        "Book a focused time block on the calendar. Confirm the slot with the user first."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "start_iso": {"type": "string", "description": "local start time, e.g. 2025-03-11T09:00:00"},
                "duration": {"type": "integer", "default": 60},
                "description": {"type": "string"}
            },
            "required": ["title", "start_iso"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let title = str_arg(&args, "title", "create_block")?;
        let start_iso = str_arg(&args, "start_iso", "create_block")?;
        let block = self
            .calendar
            .create_block(
                &title,
                &start_iso,
                u32_arg_or(&args, "duration", 60),
                &str_arg_or(&args, "description", ""),
            )
            .await?;
        Ok(json!({
            "id": block.id,
            "htmlLink": block.link,
            "message": format!("Scheduled: {} at {}", title, start_iso),
        }))
    }
}

/// Scheduling tool set; each call builds fresh instances over the shared calendar.
pub fn tools(calendar: Arc<dyn CalendarService>, work_hours: (u32, u32)) -> ToolSet {
    ToolSet::new(vec![
        Arc::new(ListEvents {
            calendar: Arc::clone(&calendar),
        }),
        Arc::new(FindFreeTime {
            calendar: Arc::clone(&calendar),
            work_hours,
        }),
        Arc::new(CreateBlock { calendar }),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::InMemoryCalendar;
    use chrono::NaiveDate;

    fn set() -> ToolSet {
        let now = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        tools(Arc::new(InMemoryCalendar::default().with_clock(now)), (9, 18))
    }

    #[tokio::test]
    async fn test_find_then_book_then_list() {
        let set = set();
        let slots = set
            .invoke("find_free_time", json!({"duration": 30, "topk": 2}))
            .await
            .unwrap();
        assert_eq!(slots.as_array().unwrap().len(), 2);
        let first = slots[0]["start"].as_str().unwrap().to_string();

        let booked = set
            .invoke(
                "create_block",
                json!({"title": "Deep work", "start_iso": first, "duration": "30"}),
            )
            .await
            .unwrap();
        assert!(booked["htmlLink"].as_str().unwrap().contains(booked["id"].as_str().unwrap()));

        let events = set.invoke("list_events", json!({})).await.unwrap();
        assert_eq!(events[0]["title"], "Deep work");
        assert_eq!(events[0]["duration"], 30);

        let slots = set
            .invoke("find_free_time", json!({"duration": 30, "topk": 1}))
            .await
            .unwrap();
        assert_ne!(slots[0]["start"].as_str().unwrap(), first);
    }

    #[tokio::test]
    async fn test_calendar_errors_surface_as_tool_errors() {
        let err = set()
            .invoke("find_free_time", json!({"start_hour": 18, "end_hour": 9}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Calendar(_)));

        let err = set()
            .invoke("create_block", json!({"start_iso": "2025-03-11T09:00:00"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_oversized_horizon_is_a_tool_error() {
        let set = set();
        let err = set
            .invoke("find_free_time", json!({"days": 4000000000u64}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Calendar(_)));

        let err = set
            .invoke("list_events", json!({"days": "4000000000"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Calendar(_)));
    }
}
