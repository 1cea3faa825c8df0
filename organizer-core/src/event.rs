//! Event types shared by the expander, the scheduler and the stores.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OrganizerError, OrganizerResult};

/// A user-scheduled calendar item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Rendering hint only, timestamps keep their meaning
    #[serde(default)]
    pub all_day: bool,
    /// Rule text such as `FREQ=WEEKLY;COUNT=4`. None for one-off events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
    #[serde(default)]
    pub status: EventStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Active,
    Canceled,
}

impl Event {
    /// Create a new active event with a generated id.
    pub fn new(
        title: impl Into<String>,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        recurrence_rule: Option<String>,
    ) -> OrganizerResult<Self> {
        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            start_at,
            end_at,
            all_day: false,
            recurrence_rule,
            status: EventStatus::Active,
        };
        event.validate()?;
        Ok(event)
    }

    /// Check the invariants every stored event must hold.
    pub fn validate(&self) -> OrganizerResult<()> {
        if self.id.trim().is_empty() {
            return Err(OrganizerError::InvalidEvent("event id is empty".into()));
        }
        if self.end_at < self.start_at {
            return Err(OrganizerError::InvalidEvent(format!(
                "event '{}' ends ({}) before it starts ({})",
                self.id, self.end_at, self.start_at
            )));
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        self.end_at - self.start_at
    }

    pub fn is_canceled(&self) -> bool {
        self.status == EventStatus::Canceled
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule.is_some()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Identity of one materialized occurrence: `{event_id}@{start}`.
///
/// The start is rendered as `%Y%m%dT%H%M%SZ`, which never contains `@`,
/// so two different (event, start) pairs can never share an id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OccurrenceId(String);

impl OccurrenceId {
    pub fn new(event_id: &str, start: DateTime<Utc>) -> Self {
        OccurrenceId(format!("{}@{}", event_id, start.format("%Y%m%dT%H%M%SZ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One concrete, time-bounded instance of an event.
///
/// `event` is a copy of the parent with `start_at`/`end_at` moved to this
/// occurrence. Everything else is carried over unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub id: OccurrenceId,
    pub event: Event,
}

impl Occurrence {
    pub(crate) fn at(parent: &Event, start: DateTime<Utc>) -> Self {
        let mut event = parent.clone();
        event.start_at = start;
        event.end_at = start + parent.duration();

        Occurrence {
            id: OccurrenceId::new(&parent.id, start),
            event,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event.id
    }

    pub fn start_at(&self) -> DateTime<Utc> {
        self.event.start_at
    }

    pub fn end_at(&self) -> DateTime<Utc> {
        self.event.end_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_rejects_end_before_start() {
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap();
        let end = start - Duration::minutes(1);

        let err = Event::new("Broken", start, end, None).unwrap_err();
        assert!(matches!(err, OrganizerError::InvalidEvent(_)));
    }

    #[test]
    fn zero_length_event_is_valid() {
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap();
        let event = Event::new("Instant", start, start, None).unwrap();
        assert_eq!(event.duration(), Duration::zero());
    }

    #[test]
    fn occurrence_id_is_composite_of_event_and_start() {
        let start = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap();
        let id = OccurrenceId::new("abc", start);
        assert_eq!(id.as_str(), "abc@20250320T150000Z");
    }

    #[test]
    fn occurrence_ids_do_not_collide_across_events() {
        let a = Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap();
        let b = a + Duration::days(1);

        assert_ne!(OccurrenceId::new("x", a), OccurrenceId::new("x", b));
        assert_ne!(OccurrenceId::new("x", a), OccurrenceId::new("y", a));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&EventStatus::Canceled).unwrap();
        assert_eq!(json, "\"canceled\"");
    }
}
