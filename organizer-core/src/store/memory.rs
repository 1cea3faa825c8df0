//! In-memory store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{EventStore, may_occur_in, merge_reminders};
use crate::error::OrganizerResult;
use crate::event::Event;
use crate::reminder::{Reminder, cancel_scheduled};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    events: BTreeMap<String, Event>,
    reminders: BTreeMap<String, Vec<Reminder>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for MemoryStore {
    fn load_events(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> OrganizerResult<Vec<Event>> {
        Ok(self
            .events
            .values()
            .filter(|e| may_occur_in(e, from, to))
            .cloned()
            .collect())
    }

    fn event(&self, id: &str) -> OrganizerResult<Option<Event>> {
        Ok(self.events.get(id).cloned())
    }

    fn save_event(&mut self, event: &Event) -> OrganizerResult<Event> {
        event.validate()?;
        self.events.insert(event.id.clone(), event.clone());
        Ok(event.clone())
    }

    fn cancel_reminders(&mut self, event_id: &str) -> OrganizerResult<()> {
        if let Some(reminders) = self.reminders.get_mut(event_id) {
            cancel_scheduled(reminders);
        }
        Ok(())
    }

    fn save_reminders(&mut self, reminders: &[Reminder]) -> OrganizerResult<()> {
        for reminder in reminders {
            let existing = self.reminders.entry(reminder.event_id.clone()).or_default();
            merge_reminders(existing, [reminder.clone()]);
        }
        Ok(())
    }

    fn reminders(&self, event_id: &str) -> OrganizerResult<Vec<Reminder>> {
        Ok(self.reminders.get(event_id).cloned().unwrap_or_default())
    }
}
