//! Event and reminder persistence.
//!
//! The calculators never touch storage. Screens and the CLI go through an
//! [`EventStore`], usually via [`crate::planner::Planner`], which applies the
//! reminder lifecycle rules on top of it.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};

use crate::error::OrganizerResult;
use crate::event::Event;
use crate::reminder::Reminder;

pub trait EventStore {
    /// Events that may have an occurrence in `[from, to]`: one-off events
    /// starting inside the window and recurring events starting before its end.
    fn load_events(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> OrganizerResult<Vec<Event>>;

    fn event(&self, id: &str) -> OrganizerResult<Option<Event>>;

    /// Insert or replace an event by id.
    fn save_event(&mut self, event: &Event) -> OrganizerResult<Event>;

    /// Cancel every scheduled reminder of an event. Fired ones are kept as they are.
    fn cancel_reminders(&mut self, event_id: &str) -> OrganizerResult<()>;

    /// Store a fresh reminder set. Previously canceled reminders of the same
    /// events are dropped.
    fn save_reminders(&mut self, reminders: &[Reminder]) -> OrganizerResult<()>;

    /// All stored reminders of an event, in any status.
    fn reminders(&self, event_id: &str) -> OrganizerResult<Vec<Reminder>>;
}

/// Whether `event` belongs in a `load_events(from, to)` result.
pub(crate) fn may_occur_in(event: &Event, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    if event.start_at > to {
        return false;
    }
    event.is_recurring() || event.start_at >= from
}

/// Merge a fresh set into an event's stored reminders, dropping canceled ones.
pub(crate) fn merge_reminders(existing: &mut Vec<Reminder>, fresh: impl IntoIterator<Item = Reminder>) {
    existing.retain(|r| r.status != crate::reminder::ReminderStatus::Canceled);
    existing.extend(fresh);
}
