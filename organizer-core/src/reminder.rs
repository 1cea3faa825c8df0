//! Reminder scheduling.
//!
//! Reminders belong to the base event, not to its individual occurrences.
//! A reminder set is never patched: when an event's start or its offsets
//! change, the old set is canceled and a fresh one is built with [`schedule`].

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A notification tied to one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub event_id: String,
    /// Minutes before the event start (0 = at start time)
    pub minutes_before: u32,
    pub scheduled_for: DateTime<Utc>,
    pub status: ReminderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Scheduled,
    Fired,
    Canceled,
}

impl Reminder {
    pub fn is_scheduled(&self) -> bool {
        self.status == ReminderStatus::Scheduled
    }

    /// Scheduled and at or past its fire time.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_scheduled() && self.scheduled_for <= now
    }

    /// Move a scheduled reminder to `fired`. Returns false if it wasn't scheduled.
    pub fn mark_fired(&mut self) -> bool {
        self.transition(ReminderStatus::Fired)
    }

    /// Move a scheduled reminder to `canceled`. Returns false if it wasn't scheduled.
    pub fn cancel(&mut self) -> bool {
        self.transition(ReminderStatus::Canceled)
    }

    fn transition(&mut self, to: ReminderStatus) -> bool {
        if !self.is_scheduled() {
            return false;
        }
        self.status = to;
        true
    }
}

/// Build a fresh reminder set for an event starting at `event_start`.
///
/// Duplicate offsets collapse into one reminder. The result is ordered by
/// ascending offset. Fire times in the past are kept; whoever delivers them
/// decides what to do.
pub fn schedule<I>(event_id: &str, event_start: DateTime<Utc>, offsets_minutes: I) -> Vec<Reminder>
where
    I: IntoIterator<Item = u32>,
{
    let offsets: BTreeSet<u32> = offsets_minutes.into_iter().collect();

    offsets
        .into_iter()
        .map(|minutes| Reminder {
            event_id: event_id.to_string(),
            minutes_before: minutes,
            scheduled_for: event_start - Duration::minutes(i64::from(minutes)),
            status: ReminderStatus::Scheduled,
        })
        .collect()
}

/// Cancel every scheduled reminder in place, leaving fired ones untouched.
///
/// Returns how many were canceled.
pub fn cancel_scheduled(reminders: &mut [Reminder]) -> usize {
    reminders.iter_mut().map(Reminder::cancel).filter(|canceled| *canceled).count()
}
