use anyhow::Result;
use chrono::Utc;
use organizer_core::organizer::Organizer;
use owo_colors::OwoColorize;

use super::resolve_event_id;
use crate::render::Render;

pub fn run(organizer: &Organizer, id: &str) -> Result<()> {
    let planner = organizer.planner()?;
    let id = resolve_event_id(&planner, id)?;

    let event = planner.event(&id)?;
    let reminders = planner.reminders(&id)?;

    println!("{}", event.to_string().bold());
    if reminders.is_empty() {
        println!("  {}", "No reminders".dimmed());
        return Ok(());
    }

    let now = Utc::now();
    for reminder in &reminders {
        let due = if reminder.is_due(now) { " (due)".yellow().to_string() } else { String::new() };
        println!("  {}{}", reminder.render(), due);
    }

    Ok(())
}
