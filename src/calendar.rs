//! Calendar collaborator used by the rational-analyst persona's tools.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Furthest horizon accepted by `suggest_slots` and `list_events`.
pub const MAX_LOOKAHEAD_DAYS: u32 = 365;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("calendar backend error: {0}")]
    Backend(String),
}

/// A free window suggested to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub start: String,
    pub end: String,
    pub label: String,
}

/// Result of booking a block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookedBlock {
    pub id: String,
    #[serde(rename = "htmlLink")]
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub timezone: String,
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn suggest_slots(
        &self,
        days: u32,
        duration_minutes: u32,
        work_hours: (u32, u32),
        topk: usize,
    ) -> Result<Vec<Slot>, CalendarError>;

    async fn create_block(
        &self,
        title: &str,
        start_iso: &str,
        duration_minutes: u32,
        description: &str,
    ) -> Result<BookedBlock, CalendarError>;

    /// Upcoming events within `days`, earliest first.
    async fn list_events(&self, days: u32) -> Result<Vec<CalendarEvent>, CalendarError>;
}

/// Process-local calendar. Booked blocks double as the busy list for slot search.
pub struct InMemoryCalendar {
    granularity_minutes: i64,
    timezone: String,
    fixed_now: Option<NaiveDateTime>,
    events: Mutex<Vec<CalendarEvent>>,
}

impl InMemoryCalendar {
    pub fn new(granularity_minutes: u32, timezone: impl Into<String>) -> Self {
        Self {
            granularity_minutes: i64::from(granularity_minutes),
            timezone: timezone.into(),
            fixed_now: None,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Pin "now" so slot search is reproducible.
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    fn now(&self) -> NaiveDateTime {
        self.fixed_now
            .unwrap_or_else(|| Local::now().naive_local())
    }

    async fn busy(&self) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        self.events
            .lock()
            .await
            .iter()
            .map(|e| (e.start, e.end))
            .collect()
    }
}

impl Default for InMemoryCalendar {
    fn default() -> Self {
        Self::new(30, "UTC")
    }
}

#[async_trait]
impl CalendarService for InMemoryCalendar {
    async fn suggest_slots(
        &self,
        days: u32,
        duration_minutes: u32,
        work_hours: (u32, u32),
        topk: usize,
    ) -> Result<Vec<Slot>, CalendarError> {
        if duration_minutes == 0 {
            return Err(CalendarError::InvalidArgument(
                "duration must be positive".to_string(),
            ));
        }
        if work_hours.0 >= work_hours.1 {
            return Err(CalendarError::InvalidArgument(format!(
                "work hours {}-{} are empty",
                work_hours.0, work_hours.1
            )));
        }

        let horizon = lookahead(days)?;
        let today = self.now().date();
        let start = today
            .checked_add_signed(Duration::days(1))
            .and_then(|d| d.and_hms_opt(work_hours.0, 0, 0))
            .ok_or_else(|| CalendarError::InvalidArgument(format!("hour {}", work_hours.0)))?;
        let end = today
            .checked_add_signed(horizon)
            .and_then(|d| d.and_hms_opt(work_hours.1, 0, 0))
            .ok_or_else(|| CalendarError::InvalidArgument(format!("hour {}", work_hours.1)))?;

        Ok(find_slots(
            start,
            end,
            &self.busy().await,
            Duration::minutes(i64::from(duration_minutes)),
            Duration::minutes(self.granularity_minutes),
            topk,
        ))
    }

    async fn create_block(
        &self,
        title: &str,
        start_iso: &str,
        duration_minutes: u32,
        description: &str,
    ) -> Result<BookedBlock, CalendarError> {
        if title.trim().is_empty() {
            return Err(CalendarError::InvalidArgument("title is empty".to_string()));
        }
        if duration_minutes == 0 {
            return Err(CalendarError::InvalidArgument(
                "duration must be positive".to_string(),
            ));
        }
        let start = parse_timestamp(start_iso)?;
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
            .ok_or_else(|| CalendarError::InvalidTimestamp(start_iso.to_string()))?;
        let id = uuid::Uuid::new_v4().simple().to_string();

        tracing::info!("booked '{}' at {}", title, start.format(ISO_FORMAT));
        self.events.lock().await.push(CalendarEvent {
            id: id.clone(),
            title: title.to_string(),
            description: description.to_string(),
            start,
            end,
            timezone: self.timezone.clone(),
        });

        Ok(BookedBlock {
            link: format!("local-calendar://events/{}", id),
            id,
        })
    }

    async fn list_events(&self, days: u32) -> Result<Vec<CalendarEvent>, CalendarError> {
        let now = self.now();
        let cutoff = now
            .checked_add_signed(lookahead(days)?)
            .ok_or_else(|| CalendarError::InvalidArgument(format!("days {}", days)))?;
        let mut upcoming: Vec<CalendarEvent> = self
            .events
            .lock()
            .await
            .iter()
            .filter(|e| e.start >= now && e.start <= cutoff)
            .cloned()
            .collect();
        upcoming.sort_by_key(|e| e.start);
        Ok(upcoming)
    }
}

fn lookahead(days: u32) -> Result<Duration, CalendarError> {
    if days > MAX_LOOKAHEAD_DAYS {
        return Err(CalendarError::InvalidArgument(format!(
            "days must be at most {}, got {}",
            MAX_LOOKAHEAD_DAYS, days
        )));
    }
    Ok(Duration::days(i64::from(days)))
}

/// Greedy forward scan. On a conflict the cursor jumps to whichever comes first,
/// the end of the candidate block or the end of the busy block; after an accepted
/// slot it skips `gap` past the slot's end.
fn find_slots(
    start: NaiveDateTime,
    end: NaiveDateTime,
    busy: &[(NaiveDateTime, NaiveDateTime)],
    duration: Duration,
    gap: Duration,
    topk: usize,
) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut cursor = start;

    while cursor + duration <= end && slots.len() < topk {
        let block_end = cursor + duration;
        let conflict = busy
            .iter()
            .find(|(bs, be)| !(block_end <= *bs || cursor >= *be));

        match conflict {
            Some((_, busy_end)) => cursor = block_end.min(*busy_end),
            None => {
                slots.push(Slot {
                    start: cursor.format(ISO_FORMAT).to_string(),
                    end: block_end.format(ISO_FORMAT).to_string(),
                    label: cursor.format("%a %m/%d %H:%M").to_string(),
                });
                cursor = block_end + gap;
            }
        }
    }
    slots
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, CalendarError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, ISO_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| CalendarError::InvalidTimestamp(raw.to_string()))
}
