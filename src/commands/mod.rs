pub mod cancel;
pub mod edit;
pub mod events;
pub mod new;
pub mod reminders;
pub mod tax;

use anyhow::{Result, bail};
use organizer_core::planner::Planner;
use organizer_core::store::{EventStore, FileStore};

/// Accept a full event id or an unambiguous prefix of one.
pub fn resolve_event_id(planner: &Planner<FileStore>, id: &str) -> Result<String> {
    if planner.store().event(id)?.is_some() {
        return Ok(id.to_string());
    }

    let matches: Vec<String> = planner
        .store()
        .events()?
        .into_iter()
        .map(|e| e.id)
        .filter(|candidate| candidate.starts_with(id))
        .collect();

    match matches.as_slice() {
        [single] => Ok(single.clone()),
        [] => bail!("No event matches '{}'", id),
        _ => bail!("'{}' is ambiguous, matches: {}", id, matches.join(", ")),
    }
}
