use anyhow::{Context, Result};
use organizer_core::event::Event;
use organizer_core::organizer::Organizer;
use owo_colors::OwoColorize;

use super::new::{canonical_rule, resolve_end};
use super::resolve_event_id;
use crate::input::parse_when;
use crate::render::{Render, format_local};

pub struct EventChanges {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration: Option<String>,
    pub repeat: Option<String>,
    pub no_repeat: bool,
    pub reminders: Vec<u32>,
    pub no_reminders: bool,
}

pub fn run(organizer: &Organizer, id: &str, changes: EventChanges) -> Result<()> {
    let mut planner = organizer.planner()?;
    let id = resolve_event_id(&planner, id)?;
    let current = planner.event(&id)?;

    let offsets = if changes.no_reminders {
        Vec::new()
    } else if changes.reminders.is_empty() {
        planner.scheduled_offsets(&id)?
    } else {
        changes.reminders.clone()
    };

    let edited = apply_changes(current, changes)?;
    let (event, reminders) = planner.update_event(&edited, &offsets)?;

    println!("{} {}", "Updated:".yellow(), event.title);
    println!("  {} {}", "start:".dimmed(), format_local(event.start_at));
    println!("  {} {}", "end:".dimmed(), format_local(event.end_at));
    match &event.recurrence_rule {
        Some(rule) => println!("  {} {}", "repeat:".dimmed(), rule),
        None => println!("  {} {}", "repeat:".dimmed(), "never".dimmed()),
    }
    if reminders.is_empty() {
        println!("  {} {}", "remind:".dimmed(), "none".dimmed());
    }
    for reminder in &reminders {
        println!("  {} {}", "remind:".dimmed(), reminder.render());
    }

    Ok(())
}

/// Apply command-line changes to a stored event. Moving the start keeps the
/// event's length unless a new end or duration is given.
fn apply_changes(mut event: Event, changes: EventChanges) -> Result<Event> {
    if let Some(title) = changes.title {
        event.title = title;
    }

    let length = event.duration();
    if let Some(input) = &changes.start {
        let start = parse_when(input)?;
        event.start_at = start.at;
        event.all_day = start.all_day;
    }

    if changes.end.is_some() || changes.duration.is_some() {
        event.end_at = resolve_end(
            event.start_at,
            event.all_day,
            changes.end.as_deref(),
            changes.duration.as_deref(),
        )?;
    } else if changes.start.is_some() {
        event.end_at = event
            .start_at
            .checked_add_signed(length)
            .context("Event end is out of range")?;
    }

    if changes.no_repeat {
        event.recurrence_rule = None;
    } else if let Some(rule) = &changes.repeat {
        event.recurrence_rule = Some(canonical_rule(rule)?);
    }

    event.validate()?;
    Ok(event)
}
