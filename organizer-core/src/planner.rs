//! Event lifecycle on top of an [`EventStore`].
//!
//! Keeps an event and its reminders consistent: any edit cancels the stored
//! reminder set before the event and a freshly scheduled set are written, so a
//! stale `scheduled` reminder never outlives a change of start time.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{OrganizerError, OrganizerResult};
use crate::event::{Event, EventStatus};
use crate::recurrence::{BatchExpansion, expand_all};
use crate::reminder::{Reminder, schedule};
use crate::store::EventStore;

pub struct Planner<S> {
    store: S,
}

impl<S: EventStore> Planner<S> {
    pub fn new(store: S) -> Self {
        Planner { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Save a new event together with its reminder set.
    pub fn create_event(&mut self, event: &Event, offsets: &[u32]) -> OrganizerResult<(Event, Vec<Reminder>)> {
        event.validate()?;

        let saved = self.store.save_event(event)?;
        let reminders = schedule(&saved.id, saved.start_at, offsets.iter().copied());
        self.store.save_reminders(&reminders)?;

        info!(event_id = %saved.id, reminders = reminders.len(), "created event");
        Ok((saved, reminders))
    }

    /// Replace an existing event and regenerate its reminders from `offsets`.
    pub fn update_event(&mut self, event: &Event, offsets: &[u32]) -> OrganizerResult<(Event, Vec<Reminder>)> {
        event.validate()?;
        if self.store.event(&event.id)?.is_none() {
            return Err(OrganizerError::EventNotFound(event.id.clone()));
        }

        // Delete before insert
        self.store.cancel_reminders(&event.id)?;
        let saved = self.store.save_event(event)?;

        let reminders = if saved.status == EventStatus::Canceled {
            Vec::new()
        } else {
            schedule(&saved.id, saved.start_at, offsets.iter().copied())
        };
        self.store.save_reminders(&reminders)?;

        info!(event_id = %saved.id, reminders = reminders.len(), "updated event");
        Ok((saved, reminders))
    }

    /// Mark an event canceled and cancel its pending reminders.
    pub fn cancel_event(&mut self, event_id: &str) -> OrganizerResult<Event> {
        let mut event = self
            .store
            .event(event_id)?
            .ok_or_else(|| OrganizerError::EventNotFound(event_id.to_string()))?;

        self.store.cancel_reminders(event_id)?;
        event.status = EventStatus::Canceled;
        let saved = self.store.save_event(&event)?;

        info!(event_id, "canceled event");
        Ok(saved)
    }

    pub fn event(&self, event_id: &str) -> OrganizerResult<Event> {
        self.store
            .event(event_id)?
            .ok_or_else(|| OrganizerError::EventNotFound(event_id.to_string()))
    }

    /// Every occurrence in `[from, to]`, with diagnostics for events whose rule was ignored.
    pub fn occurrences(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> OrganizerResult<BatchExpansion> {
        let events = self.store.load_events(from, to)?;
        Ok(expand_all(&events, from, to))
    }

    pub fn reminders(&self, event_id: &str) -> OrganizerResult<Vec<Reminder>> {
        self.store.reminders(event_id)
    }

    /// Offsets of the reminders still pending for an event.
    pub fn scheduled_offsets(&self, event_id: &str) -> OrganizerResult<Vec<u32>> {
        Ok(self
            .store
            .reminders(event_id)?
            .into_iter()
            .filter(Reminder::is_scheduled)
            .map(|r| r.minutes_before)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::ReminderStatus;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    /// Records the order of store calls on top of a MemoryStore.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryStore,
        calls: Vec<&'static str>,
    }

    impl EventStore for RecordingStore {
        fn load_events(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> OrganizerResult<Vec<Event>> {
            self.inner.load_events(from, to)
        }

        fn event(&self, id: &str) -> OrganizerResult<Option<Event>> {
            self.inner.event(id)
        }

        fn save_event(&mut self, event: &Event) -> OrganizerResult<Event> {
            self.calls.push("save_event");
            self.inner.save_event(event)
        }

        fn cancel_reminders(&mut self, event_id: &str) -> OrganizerResult<()> {
            self.calls.push("cancel_reminders");
            self.inner.cancel_reminders(event_id)
        }

        fn save_reminders(&mut self, reminders: &[Reminder]) -> OrganizerResult<()> {
            self.calls.push("save_reminders");
            self.inner.save_reminders(reminders)
        }

        fn reminders(&self, event_id: &str) -> OrganizerResult<Vec<Reminder>> {
            self.inner.reminders(event_id)
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()
    }

    fn sample_event() -> Event {
        Event::new("Electricity bill", start(), start() + Duration::minutes(30), None).unwrap()
    }

    #[test]
    fn create_saves_event_then_reminders() {
        let mut planner = Planner::new(RecordingStore::default());
        let (event, reminders) = planner.create_event(&sample_event(), &[30, 10, 30]).unwrap();

        assert_eq!(reminders.len(), 2);
        assert_eq!(planner.store().calls, vec!["save_event", "save_reminders"]);
        assert_eq!(planner.reminders(&event.id).unwrap(), reminders);
    }

    #[test]
    fn update_cancels_before_writing() {
        let mut planner = Planner::new(RecordingStore::default());
        let (mut event, _) = planner.create_event(&sample_event(), &[10]).unwrap();

        event.start_at += Duration::hours(2);
        event.end_at += Duration::hours(2);
        let (_, fresh) = planner.update_event(&event, &[10]).unwrap();

        assert_eq!(
            planner.store().calls[2..],
            ["cancel_reminders", "save_event", "save_reminders"]
        );
        assert_eq!(fresh[0].scheduled_for, event.start_at - Duration::minutes(10));

        // Only the fresh reminder is still scheduled
        let stored = planner.reminders(&event.id).unwrap();
        let scheduled: Vec<_> = stored.iter().filter(|r| r.is_scheduled()).collect();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].scheduled_for, event.start_at - Duration::minutes(10));
    }

    #[test]
    fn update_keeps_fired_history() {
        let mut store = MemoryStore::new();
        let event = sample_event();
        store.save_event(&event).unwrap();

        let mut fired = schedule(&event.id, event.start_at, [60]);
        fired[0].mark_fired();
        store.save_reminders(&fired).unwrap();

        let mut planner = Planner::new(store);
        planner.update_event(&event, &[5]).unwrap();

        let statuses: Vec<ReminderStatus> = planner
            .reminders(&event.id)
            .unwrap()
            .into_iter()
            .map(|r| r.status)
            .collect();
        assert_eq!(statuses, vec![ReminderStatus::Fired, ReminderStatus::Scheduled]);
        assert_eq!(planner.scheduled_offsets(&event.id).unwrap(), vec![5]);
    }

    #[test]
    fn update_of_unknown_event_fails() {
        let mut planner = Planner::new(MemoryStore::new());
        let err = planner.update_event(&sample_event(), &[]).unwrap_err();
        assert!(matches!(err, OrganizerError::EventNotFound(_)));
    }

    #[test]
    fn cancel_event_hides_occurrences_and_reminders() {
        let mut planner = Planner::new(MemoryStore::new());
        let (event, _) = planner.create_event(&sample_event(), &[15]).unwrap();

        planner.cancel_event(&event.id).unwrap();

        let window = planner
            .occurrences(start() - Duration::days(1), start() + Duration::days(1))
            .unwrap();
        assert!(window.occurrences.is_empty());
        assert!(planner.scheduled_offsets(&event.id).unwrap().is_empty());
        assert_eq!(planner.event(&event.id).unwrap().status, EventStatus::Canceled);
    }

    #[test]
    fn occurrences_include_recurring_events_started_before_window() {
        let mut planner = Planner::new(MemoryStore::new());
        let weekly = Event::new(
            "Gym",
            start() - Duration::weeks(10),
            start() - Duration::weeks(10) + Duration::hours(1),
            Some("FREQ=WEEKLY".into()),
        )
        .unwrap();
        planner.create_event(&weekly, &[]).unwrap();

        let batch = planner.occurrences(start(), start() + Duration::days(6)).unwrap();
        assert_eq!(batch.occurrences.len(), 1);
        assert_eq!(batch.occurrences[0].start_at(), start());
    }
}
