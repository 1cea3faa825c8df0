use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveTime, TimeZone, Utc};
use organizer_core::organizer::Organizer;
use owo_colors::OwoColorize;
use tracing::debug;

use crate::input::{parse_when, parse_window_end};
use crate::render::{Render, format_date_label};

/// Default window length when only a start (or nothing) is given.
const DEFAULT_WINDOW_DAYS: i64 = 7;

pub struct Window<'a> {
    pub from: Option<&'a str>,
    pub to: Option<&'a str>,
}

pub fn run(organizer: &Organizer, window: Window<'_>, json: bool) -> Result<()> {
    let from = match window.from {
        Some(input) => parse_when(input)?.at,
        None => {
            let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
            Local
                .from_local_datetime(&midnight)
                .earliest()
                .context("local midnight does not exist today")?
                .with_timezone(&Utc)
        }
    };
    let to = match window.to {
        Some(input) => parse_window_end(input)?,
        None => from + Duration::days(DEFAULT_WINDOW_DAYS),
    };

    debug!(%from, %to, "listing occurrences");
    let planner = organizer.planner()?;
    let batch = planner.occurrences(from, to)?;

    for diagnostic in &batch.diagnostics {
        eprintln!("{}", diagnostic.render());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&batch.occurrences)?);
        return Ok(());
    }

    if batch.occurrences.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    // Group occurrences by day
    let mut current_date: Option<String> = None;

    for occurrence in &batch.occurrences {
        let date_label = format_date_label(occurrence.start_at());

        if current_date.as_ref() != Some(&date_label) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", date_label.bold());
            current_date = Some(date_label);
        }

        println!("  {}", occurrence.render());
    }

    Ok(())
}
