//! Recurrence rules and their expansion into occurrences.
//!
//! Only a small RRULE subset is supported:
//! `FREQ=DAILY|WEEKLY|MONTHLY`, optionally bounded by `COUNT=n` or `UNTIL=ts`.
//! Expansion is fail-soft: an event whose rule cannot be parsed is treated as a
//! one-off event and the problem is reported as a [`RuleDiagnostic`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::event::{Event, Occurrence};

/// Upper bound on occurrences produced by a single expansion.
pub const MAX_OCCURRENCES_PER_EXPANSION: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }

    /// Fixed step for frequencies that don't depend on the calendar.
    fn fixed_step_days(&self) -> Option<i64> {
        match self {
            Frequency::Daily => Some(1),
            Frequency::Weekly => Some(7),
            Frequency::Monthly => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceBound {
    /// Total number of occurrences, counted from the series start.
    Count(u32),
    /// Last instant an occurrence may start at (inclusive).
    Until(DateTime<Utc>),
}

/// A parsed recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub bound: Option<RecurrenceBound>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleParseError {
    #[error("rule is empty")]
    Empty,

    #[error("rule contains an empty part")]
    EmptyPart,

    #[error("expected KEY=VALUE, got '{0}'")]
    MissingValue(String),

    #[error("unsupported rule part '{0}'")]
    UnknownKey(String),

    #[error("{0} is given more than once")]
    DuplicateKey(&'static str),

    #[error("unsupported frequency '{0}'")]
    UnknownFrequency(String),

    #[error("invalid COUNT '{0}', expected a positive integer")]
    InvalidCount(String),

    #[error("invalid UNTIL '{0}'")]
    InvalidUntil(String),

    #[error("COUNT and UNTIL cannot both be set")]
    CountAndUntil,

    #[error("FREQ is required")]
    MissingFrequency,
}

/// Accumulates rule parts. Each part moves it forward; `finish` checks the end state.
#[derive(Default)]
struct RuleBuilder {
    frequency: Option<Frequency>,
    count: Option<u32>,
    until: Option<DateTime<Utc>>,
}

impl RuleBuilder {
    fn accept(&mut self, part: &str) -> Result<(), RuleParseError> {
        let part = part.trim();
        if part.is_empty() {
            return Err(RuleParseError::EmptyPart);
        }

        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| RuleParseError::MissingValue(part.to_string()))?;
        let value = value.trim();

        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => {
                if self.frequency.is_some() {
                    return Err(RuleParseError::DuplicateKey("FREQ"));
                }
                self.frequency = Some(parse_frequency(value)?);
            }
            "COUNT" => {
                if self.count.is_some() {
                    return Err(RuleParseError::DuplicateKey("COUNT"));
                }
                let count = value
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| RuleParseError::InvalidCount(value.to_string()))?;
                self.count = Some(count);
            }
            "UNTIL" => {
                if self.until.is_some() {
                    return Err(RuleParseError::DuplicateKey("UNTIL"));
                }
                self.until = Some(parse_until(value)?);
            }
            _ => return Err(RuleParseError::UnknownKey(part.to_string())),
        }

        Ok(())
    }

    fn finish(self) -> Result<RecurrenceRule, RuleParseError> {
        let frequency = self.frequency.ok_or(RuleParseError::MissingFrequency)?;

        let bound = match (self.count, self.until) {
            (Some(_), Some(_)) => return Err(RuleParseError::CountAndUntil),
            (Some(count), None) => Some(RecurrenceBound::Count(count)),
            (None, Some(until)) => Some(RecurrenceBound::Until(until)),
            (None, None) => None,
        };

        Ok(RecurrenceRule { frequency, bound })
    }
}

fn parse_frequency(value: &str) -> Result<Frequency, RuleParseError> {
    match value.to_ascii_uppercase().as_str() {
        "DAILY" => Ok(Frequency::Daily),
        "WEEKLY" => Ok(Frequency::Weekly),
        "MONTHLY" => Ok(Frequency::Monthly),
        _ => Err(RuleParseError::UnknownFrequency(value.to_string())),
    }
}

/// Accepts `YYYYMMDD` (end of that UTC day), `YYYYMMDDTHHMMSSZ` or RFC 3339.
fn parse_until(value: &str) -> Result<DateTime<Utc>, RuleParseError> {
    let upper = value.to_ascii_uppercase();
    let invalid = || RuleParseError::InvalidUntil(value.to_string());

    if upper.len() == 8 && upper.bytes().all(|b| b.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(&upper, "%Y%m%d").map_err(|_| invalid())?;
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).ok_or_else(invalid)?;
        return Ok(date.and_time(end_of_day).and_utc());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(&upper, "%Y%m%dT%H%M%SZ") {
        return Ok(dt.and_utc());
    }

    DateTime::parse_from_rfc3339(&upper)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid())
}

impl FromStr for RecurrenceRule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.trim();
        let body = body
            .get(..6)
            .filter(|prefix| prefix.eq_ignore_ascii_case("RRULE:"))
            .map_or(body, |_| &body[6..]);

        if body.trim().is_empty() {
            return Err(RuleParseError::Empty);
        }

        let mut builder = RuleBuilder::default();
        for part in body.split(';') {
            builder.accept(part)?;
        }
        builder.finish()
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency.as_str())?;
        match self.bound {
            Some(RecurrenceBound::Count(n)) => write!(f, ";COUNT={}", n),
            Some(RecurrenceBound::Until(t)) => write!(f, ";UNTIL={}", t.format("%Y%m%dT%H%M%SZ")),
            None => Ok(()),
        }
    }
}

impl RecurrenceRule {
    /// Occurrence starts of a series anchored at `anchor`, in ascending order.
    pub fn series(&self, anchor: DateTime<Utc>) -> Series {
        Series {
            rule: *self,
            anchor,
            index: 0,
            emitted: 0,
            missing_in_a_row: 0,
        }
    }
}

/// Iterator over every start a rule produces, honoring COUNT and UNTIL.
#[derive(Debug, Clone)]
pub struct Series {
    rule: RecurrenceRule,
    anchor: DateTime<Utc>,
    /// Step number (days/weeks) or month offset of the next candidate
    index: i64,
    emitted: u32,
    missing_in_a_row: u32,
}

enum Candidate {
    At(DateTime<Utc>),
    /// Day-of-month does not exist in that month
    Missing,
    OutOfRange,
}

impl Series {
    /// Jump close to `from` without changing which starts are produced.
    ///
    /// Monthly series with a COUNT are never advanced, because skipped months
    /// make the number of starts before `from` unknown without walking them.
    fn seek(&mut self, from: DateTime<Utc>) {
        if from <= self.anchor {
            return;
        }

        match self.rule.frequency.fixed_step_days() {
            Some(step_days) => {
                let step_ms = step_days * 24 * 60 * 60 * 1000;
                let steps = (from - self.anchor).num_milliseconds() / step_ms;
                self.index = steps;
                self.emitted = u32::try_from(steps).unwrap_or(u32::MAX);
            }
            None => {
                if matches!(self.rule.bound, Some(RecurrenceBound::Count(_))) {
                    return;
                }
                let months = months_between(self.anchor, from);
                self.index = (months - 1).max(0);
            }
        }
    }

    fn candidate(&self, index: i64) -> Candidate {
        match self.rule.frequency.fixed_step_days() {
            Some(step_days) => {
                let Some(offset) = index
                    .checked_mul(step_days)
                    .and_then(Duration::try_days)
                else {
                    return Candidate::OutOfRange;
                };
                match self.anchor.checked_add_signed(offset) {
                    Some(t) => Candidate::At(t),
                    None => Candidate::OutOfRange,
                }
            }
            None => {
                let base = self.anchor.year() as i64 * 12 + self.anchor.month0() as i64;
                let Some(target) = base.checked_add(index) else {
                    return Candidate::OutOfRange;
                };
                let Ok(year) = i32::try_from(target.div_euclid(12)) else {
                    return Candidate::OutOfRange;
                };
                let month = target.rem_euclid(12) as u32 + 1;

                match NaiveDate::from_ymd_opt(year, month, self.anchor.day()) {
                    Some(date) => Candidate::At(date.and_time(self.anchor.time()).and_utc()),
                    // Day 1 always exists, so a missing day 1 means the year is out of range
                    None if NaiveDate::from_ymd_opt(year, month, 1).is_none() => {
                        Candidate::OutOfRange
                    }
                    None => Candidate::Missing,
                }
            }
        }
    }
}

impl Iterator for Series {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(RecurrenceBound::Count(count)) = self.rule.bound {
                if self.emitted >= count {
                    return None;
                }
            }

            let candidate = self.candidate(self.index);
            self.index += 1;

            match candidate {
                Candidate::At(start) => {
                    if let Some(RecurrenceBound::Until(until)) = self.rule.bound {
                        if start > until {
                            return None;
                        }
                    }
                    self.missing_in_a_row = 0;
                    self.emitted += 1;
                    return Some(start);
                }
                Candidate::Missing => {
                    // A day of month exists at least once in any 12 consecutive months
                    self.missing_in_a_row += 1;
                    if self.missing_in_a_row > 12 {
                        return None;
                    }
                }
                Candidate::OutOfRange => return None,
            }
        }
    }
}

fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let from_months = from.year() as i64 * 12 + from.month0() as i64;
    let to_months = to.year() as i64 * 12 + to.month0() as i64;
    to_months - from_months
}

// =============================================================================
// Expansion
// =============================================================================

/// Why an event's expansion was degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The rule could not be parsed; the event was treated as non-recurring.
    MalformedRule(RuleParseError),
    /// The window held more occurrences than a single expansion may produce.
    Truncated { limit: usize },
}

/// A non-fatal problem found while expanding one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagnostic {
    pub event_id: String,
    pub rule: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for RuleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::MalformedRule(err) => write!(
                f,
                "event '{}': ignoring recurrence rule '{}': {}",
                self.event_id, self.rule, err
            ),
            DiagnosticKind::Truncated { limit } => write!(
                f,
                "event '{}': rule '{}' produced more than {} occurrences, list truncated",
                self.event_id, self.rule, limit
            ),
        }
    }
}

/// Result of expanding one event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expansion {
    pub occurrences: Vec<Occurrence>,
    pub diagnostic: Option<RuleDiagnostic>,
}

/// Result of expanding many events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchExpansion {
    pub occurrences: Vec<Occurrence>,
    pub diagnostics: Vec<RuleDiagnostic>,
}

/// Expand an event into the occurrences that start within `[window_start, window_end]`.
///
/// Both window ends are inclusive. Canceled events and inverted windows yield
/// nothing. A malformed rule never fails the call: the event is handled as a
/// one-off and the returned [`Expansion`] carries a diagnostic.
pub fn expand(event: &Event, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Expansion {
    if event.is_canceled() || window_start > window_end {
        return Expansion::default();
    }

    let Some(rule_text) = event.recurrence_rule.as_deref() else {
        return Expansion {
            occurrences: single(event, window_start, window_end),
            diagnostic: None,
        };
    };

    let rule = match rule_text.parse::<RecurrenceRule>() {
        Ok(rule) => rule,
        Err(err) => {
            warn!(event_id = %event.id, rule = rule_text, error = %err, "malformed recurrence rule, treating event as non-recurring");
            return Expansion {
                occurrences: single(event, window_start, window_end),
                diagnostic: Some(RuleDiagnostic {
                    event_id: event.id.clone(),
                    rule: rule_text.to_string(),
                    kind: DiagnosticKind::MalformedRule(err),
                }),
            };
        }
    };

    let mut series = rule.series(event.start_at);
    series.seek(window_start);

    let mut starts = series
        .skip_while(|start| *start < window_start)
        .take_while(|start| *start <= window_end);

    let occurrences: Vec<Occurrence> = starts
        .by_ref()
        .take(MAX_OCCURRENCES_PER_EXPANSION)
        .map(|start| Occurrence::at(event, start))
        .collect();

    let diagnostic = if starts.next().is_some() {
        warn!(event_id = %event.id, rule = rule_text, limit = MAX_OCCURRENCES_PER_EXPANSION, "expansion truncated");
        Some(RuleDiagnostic {
            event_id: event.id.clone(),
            rule: rule_text.to_string(),
            kind: DiagnosticKind::Truncated {
                limit: MAX_OCCURRENCES_PER_EXPANSION,
            },
        })
    } else {
        None
    };

    debug!(event_id = %event.id, count = occurrences.len(), "expanded recurring event");

    Expansion {
        occurrences,
        diagnostic,
    }
}

fn single(event: &Event, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Vec<Occurrence> {
    if event.start_at >= window_start && event.start_at <= window_end {
        vec![Occurrence::at(event, event.start_at)]
    } else {
        Vec::new()
    }
}

/// Expand every event and merge the results in ascending start order.
///
/// One event's bad rule only affects that event; its diagnostic is collected
/// and the rest of the batch is expanded normally.
pub fn expand_all<'a, I>(events: I, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> BatchExpansion
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut batch = BatchExpansion::default();

    for event in events {
        let expansion = expand(event, window_start, window_end);
        batch.occurrences.extend(expansion.occurrences);
        batch.diagnostics.extend(expansion.diagnostic);
    }

    batch
        .occurrences
        .sort_by(|a, b| a.start_at().cmp(&b.start_at()).then_with(|| a.id.cmp(&b.id)));

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventStatus;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn event(rule: Option<&str>, start: DateTime<Utc>, minutes: i64) -> Event {
        Event {
            id: "evt-1".to_string(),
            title: "Pay rent".to_string(),
            description: None,
            start_at: start,
            end_at: start + Duration::minutes(minutes),
            all_day: false,
            recurrence_rule: rule.map(str::to_string),
            status: EventStatus::Active,
        }
    }

    fn starts(expansion: &Expansion) -> Vec<DateTime<Utc>> {
        expansion.occurrences.iter().map(|o| o.start_at()).collect()
    }

    // --- parsing ---

    #[test]
    fn parse_frequency_only() {
        let rule: RecurrenceRule = "FREQ=WEEKLY".parse().unwrap();
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.bound, None);
    }

    #[test]
    fn parse_with_prefix_and_mixed_case() {
        let rule: RecurrenceRule = "RRULE:freq=monthly;Count=3".parse().unwrap();
        assert_eq!(rule.frequency, Frequency::Monthly);
        assert_eq!(rule.bound, Some(RecurrenceBound::Count(3)));
    }

    #[test]
    fn parse_until_forms() {
        let compact: RecurrenceRule = "FREQ=DAILY;UNTIL=20250110T100000Z".parse().unwrap();
        assert_eq!(compact.bound, Some(RecurrenceBound::Until(utc(2025, 1, 10, 10, 0))));

        let rfc: RecurrenceRule = "FREQ=DAILY;UNTIL=2025-01-10T10:00:00Z".parse().unwrap();
        assert_eq!(rfc.bound, compact.bound);

        let date_only: RecurrenceRule = "FREQ=DAILY;UNTIL=20250110".parse().unwrap();
        assert_eq!(
            date_only.bound,
            Some(RecurrenceBound::Until(
                Utc.with_ymd_and_hms(2025, 1, 10, 23, 59, 59).unwrap()
            ))
        );
    }

    #[test]
    fn parse_rejects_unsupported_input() {
        let cases = [
            ("", RuleParseError::Empty),
            ("FREQ=YEARLY", RuleParseError::UnknownFrequency("YEARLY".into())),
            ("FREQ=DAILY;INTERVAL=2", RuleParseError::UnknownKey("INTERVAL=2".into())),
            ("FREQ=DAILY;COUNT=0", RuleParseError::InvalidCount("0".into())),
            ("FREQ=DAILY;COUNT=-1", RuleParseError::InvalidCount("-1".into())),
            ("FREQ=DAILY;FREQ=WEEKLY", RuleParseError::DuplicateKey("FREQ")),
            ("COUNT=3", RuleParseError::MissingFrequency),
            ("FREQ=DAILY;", RuleParseError::EmptyPart),
            ("FREQ", RuleParseError::MissingValue("FREQ".into())),
            ("FREQ=DAILY;UNTIL=tomorrow", RuleParseError::InvalidUntil("tomorrow".into())),
            (
                "FREQ=DAILY;COUNT=2;UNTIL=20250101",
                RuleParseError::CountAndUntil,
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(input.parse::<RecurrenceRule>(), Err(expected), "input: {input:?}");
        }
    }

    #[test]
    fn display_is_canonical() {
        let rule: RecurrenceRule = "rrule:freq=daily; until=2025-01-10T10:00:00Z".parse().unwrap();
        assert_eq!(rule.to_string(), "FREQ=DAILY;UNTIL=20250110T100000Z");
        assert_eq!(rule.to_string().parse::<RecurrenceRule>().unwrap(), rule);
    }

    // --- expansion ---

    #[test]
    fn weekly_rule_over_three_weeks_yields_three_occurrences() {
        // 2025-03-03 is a Monday
        let start = utc(2025, 3, 3, 10, 0);
        let ev = event(Some("FREQ=WEEKLY"), start, 90);

        let window_start = start;
        let window_end = start + Duration::weeks(3) - Duration::seconds(1);
        let expansion = expand(&ev, window_start, window_end);

        assert_eq!(
            starts(&expansion),
            vec![start, start + Duration::weeks(1), start + Duration::weeks(2)]
        );
        for occ in &expansion.occurrences {
            assert_eq!(occ.end_at() - occ.start_at(), ev.duration());
        }
        assert!(expansion.diagnostic.is_none());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = utc(2025, 1, 1, 9, 0);
        let ev = event(Some("FREQ=DAILY"), start, 30);

        let window_start = utc(2025, 1, 3, 9, 0);
        let window_end = utc(2025, 1, 5, 9, 0);
        let expansion = expand(&ev, window_start, window_end);

        assert_eq!(
            starts(&expansion),
            vec![window_start, utc(2025, 1, 4, 9, 0), window_end]
        );
    }

    #[test]
    fn non_recurring_event_passes_through_only_inside_window() {
        let start = utc(2025, 5, 10, 12, 0);
        let ev = event(None, start, 60);

        let inside = expand(&ev, start, start);
        assert_eq!(inside.occurrences.len(), 1);
        assert_eq!(inside.occurrences[0].event, ev);

        let before = expand(&ev, start + Duration::seconds(1), start + Duration::days(1));
        assert!(before.occurrences.is_empty());

        let after = expand(&ev, start - Duration::days(1), start - Duration::seconds(1));
        assert!(after.occurrences.is_empty());
    }

    #[test]
    fn expansion_is_idempotent() {
        let ev = event(Some("FREQ=DAILY;COUNT=5"), utc(2025, 1, 1, 8, 0), 15);
        let from = utc(2024, 12, 1, 0, 0);
        let to = utc(2025, 2, 1, 0, 0);

        assert_eq!(expand(&ev, from, to), expand(&ev, from, to));
    }

    #[test]
    fn occurrence_ids_are_deterministic_and_unique() {
        let ev = event(Some("FREQ=DAILY"), utc(2025, 1, 1, 8, 0), 15);
        let expansion = expand(&ev, utc(2025, 1, 1, 0, 0), utc(2025, 1, 3, 23, 0));

        let ids: Vec<&str> = expansion.occurrences.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "evt-1@20250101T080000Z",
                "evt-1@20250102T080000Z",
                "evt-1@20250103T080000Z"
            ]
        );
    }

    #[test]
    fn count_is_counted_from_series_start() {
        let start = utc(2025, 1, 1, 8, 0);
        let ev = event(Some("FREQ=DAILY;COUNT=5"), start, 15);

        // Window starts at the 4th occurrence, so only 2 remain
        let expansion = expand(&ev, utc(2025, 1, 4, 0, 0), utc(2025, 2, 1, 0, 0));
        assert_eq!(starts(&expansion), vec![utc(2025, 1, 4, 8, 0), utc(2025, 1, 5, 8, 0)]);
    }

    #[test]
    fn until_is_inclusive() {
        let start = utc(2025, 1, 1, 8, 0);
        let ev = event(Some("FREQ=WEEKLY;UNTIL=20250115T080000Z"), start, 15);

        let expansion = expand(&ev, start, utc(2025, 12, 31, 0, 0));
        assert_eq!(
            starts(&expansion),
            vec![start, utc(2025, 1, 8, 8, 0), utc(2025, 1, 15, 8, 0)]
        );
    }

    #[test]
    fn monthly_skips_months_without_the_day() {
        let start = utc(2025, 1, 31, 18, 0);
        let ev = event(Some("FREQ=MONTHLY;COUNT=4"), start, 60);

        let expansion = expand(&ev, start, utc(2026, 1, 1, 0, 0));
        assert_eq!(
            starts(&expansion),
            vec![
                start,
                utc(2025, 3, 31, 18, 0),
                utc(2025, 5, 31, 18, 0),
                utc(2025, 7, 31, 18, 0),
            ]
        );
    }

    #[test]
    fn monthly_window_far_from_start() {
        let start = utc(2020, 6, 15, 9, 0);
        let ev = event(Some("FREQ=MONTHLY"), start, 60);

        let expansion = expand(&ev, utc(2025, 2, 1, 0, 0), utc(2025, 4, 30, 0, 0));
        assert_eq!(
            starts(&expansion),
            vec![utc(2025, 2, 15, 9, 0), utc(2025, 3, 15, 9, 0), utc(2025, 4, 15, 9, 0)]
        );
    }

    #[test]
    fn daily_window_far_from_start_with_count() {
        let start = utc(2025, 1, 1, 8, 0);
        let ev = event(Some("FREQ=DAILY;COUNT=10"), start, 15);

        let expansion = expand(&ev, utc(2025, 1, 10, 8, 0), utc(2025, 3, 1, 0, 0));
        assert_eq!(starts(&expansion), vec![utc(2025, 1, 10, 8, 0)]);
    }

    #[test]
    fn series_start_before_window_is_not_emitted() {
        let start = utc(2025, 1, 1, 8, 0);
        let ev = event(Some("FREQ=WEEKLY"), start, 15);

        let expansion = expand(&ev, utc(2025, 1, 2, 0, 0), utc(2025, 1, 9, 0, 0));
        assert_eq!(starts(&expansion), vec![utc(2025, 1, 8, 8, 0)]);
    }

    #[test]
    fn malformed_rule_degrades_to_single_occurrence() {
        let start = utc(2025, 1, 1, 8, 0);
        let ev = event(Some("FREQ=HOURLY"), start, 15);

        let expansion = expand(&ev, start, utc(2025, 1, 31, 0, 0));
        assert_eq!(starts(&expansion), vec![start]);

        let diagnostic = expansion.diagnostic.expect("should report the bad rule");
        assert_eq!(diagnostic.event_id, "evt-1");
        assert_eq!(
            diagnostic.kind,
            DiagnosticKind::MalformedRule(RuleParseError::UnknownFrequency("HOURLY".into()))
        );
    }

    #[test]
    fn canceled_event_has_no_occurrences() {
        let mut ev = event(Some("FREQ=DAILY"), utc(2025, 1, 1, 8, 0), 15);
        ev.status = EventStatus::Canceled;

        let expansion = expand(&ev, utc(2025, 1, 1, 0, 0), utc(2025, 1, 31, 0, 0));
        assert!(expansion.occurrences.is_empty());
        assert!(expansion.diagnostic.is_none());
    }

    #[test]
    fn inverted_window_is_empty() {
        let ev = event(None, utc(2025, 1, 1, 8, 0), 15);
        let expansion = expand(&ev, utc(2025, 1, 2, 0, 0), utc(2025, 1, 1, 0, 0));
        assert!(expansion.occurrences.is_empty());
    }

    #[test]
    fn huge_window_is_truncated_with_diagnostic() {
        let ev = event(Some("FREQ=DAILY"), utc(2000, 1, 1, 0, 0), 15);

        let expansion = expand(&ev, utc(2000, 1, 1, 0, 0), utc(2100, 1, 1, 0, 0));
        assert_eq!(expansion.occurrences.len(), MAX_OCCURRENCES_PER_EXPANSION);
        assert!(matches!(
            expansion.diagnostic.map(|d| d.kind),
            Some(DiagnosticKind::Truncated { .. })
        ));
    }

    #[test]
    fn batch_keeps_good_events_when_one_rule_is_bad() {
        let mut good = event(Some("FREQ=DAILY;COUNT=2"), utc(2025, 1, 1, 8, 0), 15);
        good.id = "good".into();
        let mut bad = event(Some("FREQ=SOMETIMES"), utc(2025, 1, 1, 7, 0), 15);
        bad.id = "bad".into();

        let batch = expand_all([&good, &bad], utc(2025, 1, 1, 0, 0), utc(2025, 1, 31, 0, 0));

        let ids: Vec<&str> = batch.occurrences.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["bad@20250101T070000Z", "good@20250101T080000Z", "good@20250102T080000Z"]
        );
        assert_eq!(batch.diagnostics.len(), 1);
        assert_eq!(batch.diagnostics[0].event_id, "bad");
    }
}
