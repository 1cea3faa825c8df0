use anyhow::Result;
use organizer_core::organizer::Organizer;
use owo_colors::OwoColorize;

use super::resolve_event_id;

pub fn run(organizer: &Organizer, id: &str) -> Result<()> {
    let mut planner = organizer.planner()?;
    let id = resolve_event_id(&planner, id)?;

    let event = planner.cancel_event(&id)?;
    println!("{} {}", "Canceled:".red(), event.title);

    Ok(())
}
