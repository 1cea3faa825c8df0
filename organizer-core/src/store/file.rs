//! File-backed store.
//!
//! Layout under the data directory:
//!
//! ```text
//! events/<event-id>.json       one event per file
//! reminders/<event-id>.json    that event's reminder list
//! ```
//!
//! Every write goes to a temp file in the same directory and is renamed into
//! place, so readers never see a partially written file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::{EventStore, may_occur_in, merge_reminders};
use crate::error::{OrganizerError, OrganizerResult};
use crate::event::Event;
use crate::reminder::{Reminder, cancel_scheduled};

#[derive(Debug, Clone)]
pub struct FileStore {
    events_dir: PathBuf,
    reminders_dir: PathBuf,
}

impl FileStore {
    pub fn open(data_dir: &Path) -> OrganizerResult<Self> {
        let events_dir = data_dir.join("events");
        let reminders_dir = data_dir.join("reminders");

        std::fs::create_dir_all(&events_dir)?;
        std::fs::create_dir_all(&reminders_dir)?;

        info!(data_dir = %data_dir.display(), "opened file store");

        Ok(FileStore {
            events_dir,
            reminders_dir,
        })
    }

    /// Every readable event. Files that fail to parse are skipped with a warning.
    pub fn events(&self) -> OrganizerResult<Vec<Event>> {
        let entries = std::fs::read_dir(&self.events_dir)?;

        let mut events: Vec<Event> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "json"))
            .filter_map(|path| match read_json::<Event>(&path) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping unreadable event file");
                    None
                }
            })
            .collect();

        events.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));
        debug!(count = events.len(), "loaded events");
        Ok(events)
    }

    fn event_path(&self, id: &str) -> OrganizerResult<PathBuf> {
        Ok(self.events_dir.join(format!("{}.json", file_stem(id)?)))
    }

    fn reminders_path(&self, event_id: &str) -> OrganizerResult<PathBuf> {
        Ok(self.reminders_dir.join(format!("{}.json", file_stem(event_id)?)))
    }

    fn read_reminders(&self, event_id: &str) -> OrganizerResult<Vec<Reminder>> {
        let path = self.reminders_path(event_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    fn write_reminders(&self, event_id: &str, reminders: &[Reminder]) -> OrganizerResult<()> {
        write_json_atomic(&self.reminders_path(event_id)?, &reminders)
    }
}

impl EventStore for FileStore {
    fn load_events(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> OrganizerResult<Vec<Event>> {
        Ok(self
            .events()?
            .into_iter()
            .filter(|e| may_occur_in(e, from, to))
            .collect())
    }

    fn event(&self, id: &str) -> OrganizerResult<Option<Event>> {
        let path = self.event_path(id)?;
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn save_event(&mut self, event: &Event) -> OrganizerResult<Event> {
        event.validate()?;
        write_json_atomic(&self.event_path(&event.id)?, event)?;
        debug!(event_id = %event.id, "saved event");
        Ok(event.clone())
    }

    fn cancel_reminders(&mut self, event_id: &str) -> OrganizerResult<()> {
        let mut reminders = self.read_reminders(event_id)?;
        let canceled = cancel_scheduled(&mut reminders);
        if canceled > 0 {
            self.write_reminders(event_id, &reminders)?;
        }
        debug!(event_id, canceled, "canceled reminders");
        Ok(())
    }

    fn save_reminders(&mut self, reminders: &[Reminder]) -> OrganizerResult<()> {
        let mut by_event: BTreeMap<&str, Vec<Reminder>> = BTreeMap::new();
        for reminder in reminders {
            by_event
                .entry(reminder.event_id.as_str())
                .or_default()
                .push(reminder.clone());
        }

        for (event_id, fresh) in by_event {
            let mut stored = self.read_reminders(event_id)?;
            merge_reminders(&mut stored, fresh);
            self.write_reminders(event_id, &stored)?;
            debug!(event_id, count = stored.len(), "saved reminders");
        }

        Ok(())
    }

    fn reminders(&self, event_id: &str) -> OrganizerResult<Vec<Reminder>> {
        self.read_reminders(event_id)
    }
}

/// Ids become file names, so anything that could escape the directory is refused.
fn file_stem(id: &str) -> OrganizerResult<&str> {
    let unsafe_id = id.is_empty()
        || id.starts_with('.')
        || id.contains(['/', '\\'])
        || id.chars().any(char::is_control);

    if unsafe_id {
        return Err(OrganizerError::InvalidEvent(format!(
            "event id '{}' cannot be used as a file name",
            id
        )));
    }
    Ok(id)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> OrganizerResult<T> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        OrganizerError::Serialization(format!("failed parsing {}: {}", path.display(), e))
    })
}

fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> OrganizerResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut temp, value)?;
    writeln!(temp)?;
    temp.flush()?;

    temp.persist(path).map_err(|e| OrganizerError::Io(e.error))?;
    Ok(())
}
