use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use organizer_core::event::Event;
use organizer_core::organizer::Organizer;
use organizer_core::recurrence::RecurrenceRule;
use owo_colors::OwoColorize;

use crate::input::{When, default_duration, parse_duration, parse_when};
use crate::render::{Render, format_local};

pub struct NewEvent {
    pub title: String,
    pub start: String,
    pub end: Option<String>,
    pub duration: Option<String>,
    pub repeat: Option<String>,
    pub reminders: Vec<u32>,
    pub all_day: bool,
    pub description: Option<String>,
}

pub fn run(organizer: &Organizer, args: NewEvent) -> Result<()> {
    let start = parse_when(&args.start)?;
    let all_day = args.all_day || start.all_day;
    let end = resolve_end(start.at, all_day, args.end.as_deref(), args.duration.as_deref())?;
    let rule = args.repeat.as_deref().map(canonical_rule).transpose()?;

    let mut event = Event::new(args.title, start.at, end, rule)?;
    event.all_day = all_day;
    event.description = args.description;

    let offsets = if args.reminders.is_empty() {
        organizer.config().default_reminders.clone()
    } else {
        args.reminders
    };

    let mut planner = organizer.planner()?;
    let (event, reminders) = planner.create_event(&event, &offsets)?;

    println!("{} {}", "Created:".green(), event.title);
    println!("  {} {}", "id:".dimmed(), event.id);
    println!("  {} {}", "start:".dimmed(), format_local(event.start_at));
    println!("  {} {}", "end:".dimmed(), format_local(event.end_at));
    if let Some(rule) = &event.recurrence_rule {
        println!("  {} {}", "repeat:".dimmed(), rule);
    }
    for reminder in &reminders {
        println!("  {} {}", "remind:".dimmed(), reminder.render());
    }

    Ok(())
}

/// End from --end, else --duration, else the default length for the kind of event.
pub fn resolve_end(
    start: DateTime<Utc>,
    all_day: bool,
    end: Option<&str>,
    duration: Option<&str>,
) -> Result<DateTime<Utc>> {
    if let Some(input) = end {
        let When { at, all_day: end_is_date } = parse_when(input)?;
        // An all-day end date is inclusive: the event runs through that day
        return Ok(if end_is_date { at + default_duration(true) } else { at });
    }

    let length = match duration {
        Some(input) => parse_duration(input)?,
        None => default_duration(all_day),
    };
    start
        .checked_add_signed(length)
        .context("Event end is out of range")
}

/// Parse a rule given on the command line and store its canonical form.
pub fn canonical_rule(input: &str) -> Result<String> {
    let rule: RecurrenceRule = input
        .parse()
        .with_context(|| format!("Invalid recurrence rule '{}'", input))?;
    Ok(rule.to_string())
}
