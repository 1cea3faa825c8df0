//! Terminal rendering for organizer types.
//!
//! Extension traits that add colored output to organizer-core types using
//! owo_colors.

use chrono::{DateTime, Local, Utc};
use organizer_core::event::Occurrence;
use organizer_core::recurrence::RuleDiagnostic;
use organizer_core::reminder::{Reminder, ReminderStatus};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Occurrence {
    fn render(&self) -> String {
        let time = if self.event.all_day {
            format!("{:>7}", "all-day")
        } else {
            format!("{:>7}", self.start_at().with_timezone(&Local).format("%H:%M"))
        };
        let repeat = if self.event.is_recurring() { " ↻" } else { "" };

        format!(
            "{} {}{} {}",
            time,
            self.event.title,
            repeat,
            format!("[{}]", short_id(self.event_id())).dimmed()
        )
    }
}

impl Render for ReminderStatus {
    fn render(&self) -> String {
        match self {
            ReminderStatus::Scheduled => "scheduled".green().to_string(),
            ReminderStatus::Fired => "fired".dimmed().to_string(),
            ReminderStatus::Canceled => "canceled".red().to_string(),
        }
    }
}

impl Render for Reminder {
    fn render(&self) -> String {
        format!(
            "{:>16}  {}  {}",
            format_offset(self.minutes_before),
            format_local(self.scheduled_for),
            self.status.render()
        )
    }
}

impl Render for RuleDiagnostic {
    fn render(&self) -> String {
        format!("{} {}", "warning:".yellow(), self)
    }
}

/// Date label for grouping (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(at: DateTime<Utc>) -> String {
    let today = Local::now().date_naive();
    let date = at.with_timezone(&Local).date_naive();

    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d %Y").to_string(),
    }
}

pub fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// "at start", "30 min before", "2 h before", "1 d before"
fn format_offset(minutes: u32) -> String {
    match minutes {
        0 => "at start".to_string(),
        m if m % 1440 == 0 => format!("{} d before", m / 1440),
        m if m % 60 == 0 => format!("{} h before", m / 60),
        m => format!("{} min before", m),
    }
}

/// First block of a UUID is enough to tell events apart on screen.
pub fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

/// Two decimal places, thousands separated with ','.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

pub fn format_rate(rate: Decimal) -> String {
    format!("{:.2}%", (rate * Decimal::ONE_HUNDRED).round_dp(2))
}
