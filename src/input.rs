//! Parsing of user-typed dates, durations and amounts.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;

/// A parsed point in time. Date-only input means an all-day start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct When {
    pub at: DateTime<Utc>,
    pub all_day: bool,
}

/// Parse a start/end input.
///
/// Accepts RFC 3339, `YYYY-MM-DD[THH:MM]` (local time) or natural language
/// such as "tomorrow 3pm". Input without a time component is all-day.
pub fn parse_when(input: &str) -> Result<When> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(When {
            at: dt.with_timezone(&Utc),
            all_day: false,
        });
    }

    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(When {
                at: local_to_utc(naive)?,
                all_day: false,
            });
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(When {
            at: local_to_utc(date.and_time(NaiveTime::MIN))?,
            all_day: true,
        });
    }

    let expanded = expand_abbreviations(trimmed);
    let naive = fuzzydate::parse(&expanded)
        .map_err(|_| anyhow::anyhow!("Could not parse date/time: \"{}\"", input))?;

    if has_time_component(trimmed) {
        Ok(When {
            at: local_to_utc(naive)?,
            all_day: false,
        })
    } else {
        Ok(When {
            at: local_to_utc(naive.date().and_time(NaiveTime::MIN))?,
            all_day: true,
        })
    }
}

/// Parse the end of a listing window. Date-only input covers that whole day.
pub fn parse_window_end(input: &str) -> Result<DateTime<Utc>> {
    let when = parse_when(input)?;
    if when.all_day {
        Ok(when.at + Duration::days(1) - Duration::seconds(1))
    } else {
        Ok(when.at)
    }
}

fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("{} does not exist in the local time zone", naive))
}

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    lower_words(input)
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map_or(word.clone(), |(_, full)| full.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn lower_words(input: &str) -> impl Iterator<Item = String> + '_ {
    input.split_whitespace().map(str::to_lowercase)
}

/// Check if the input contains time tokens (am/pm, HH:MM, noon, midnight, "at N").
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();

    if lower.contains("noon") || lower.contains("midnight") {
        return true;
    }

    let bytes = lower.as_bytes();

    // "6pm", "6 pm", "11am"
    for (i, pair) in bytes.windows(2).enumerate() {
        if (pair == b"am" || pair == b"pm") && i > 0 {
            let digit_before = bytes[i - 1].is_ascii_digit()
                || (i > 1 && bytes[i - 1] == b' ' && bytes[i - 2].is_ascii_digit());
            let word_ends = bytes.get(i + 2).is_none_or(|b| !b.is_ascii_alphabetic());
            if digit_before && word_ends {
                return true;
            }
        }
    }

    // "15:00"
    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' {
            let has_digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
            let has_digit_after = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
            if has_digit_before && has_digit_after {
                return true;
            }
        }
    }

    // "at 3", "friday at 15"
    let words: Vec<&str> = lower.split_whitespace().collect();
    words
        .windows(2)
        .any(|w| w[0] == "at" && w[1].starts_with(|c: char| c.is_ascii_digit()))
}

/// Parse a humantime duration such as "1h", "90min" or "2 days".
pub fn parse_duration(input: &str) -> Result<Duration> {
    let std_dur = humantime::parse_duration(input)
        .with_context(|| format!("Could not parse duration: \"{}\"", input))?;
    Duration::from_std(std_dur).context("Duration too large")
}

/// Default length: one day for all-day events, one hour otherwise.
pub fn default_duration(all_day: bool) -> Duration {
    if all_day {
        Duration::days(1)
    } else {
        Duration::hours(1)
    }
}

/// Clap value parser for money amounts. Sign is kept so the calculator can reject it.
pub fn parse_amount(input: &str) -> Result<Decimal, String> {
    let cleaned: String = input.trim().chars().filter(|c| *c != '_').collect();
    Decimal::from_str(&cleaned).map_err(|_| format!("\"{}\" is not a valid amount", input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    // --- has_time_component ---

    #[test]
    fn time_component_am_pm() {
        assert!(has_time_component("tomorrow 6pm"));
        assert!(has_time_component("friday 11am"));
        assert!(has_time_component("sat 3 pm"));
        assert!(has_time_component("9AM"));
    }

    #[test]
    fn time_component_colon_and_keywords() {
        assert!(has_time_component("tomorrow 15:00"));
        assert!(has_time_component("tomorrow noon"));
        assert!(has_time_component("friday at 15"));
        assert!(has_time_component("at 9"));
    }

    #[test]
    fn no_time_component() {
        assert!(!has_time_component("tomorrow"));
        assert!(!has_time_component("march 20"));
        assert!(!has_time_component("next friday"));
        assert!(!has_time_component("december"));
        assert!(!has_time_component("3 amsterdam"));
    }

    // --- expand_abbreviations ---

    #[test]
    fn expand_day_and_month_abbreviations() {
        assert_eq!(expand_abbreviations("sat 3pm"), "saturday 3pm");
        assert_eq!(expand_abbreviations("Thu noon"), "thursday noon");
        assert_eq!(expand_abbreviations("sept 5"), "september 5");
        assert_eq!(expand_abbreviations("next friday"), "next friday");
    }

    // --- parse_when ---

    #[test]
    fn rfc3339_is_exact() {
        let when = parse_when("2025-03-20T15:00:00Z").unwrap();
        assert_eq!(when.at, Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap());
        assert!(!when.all_day);
    }

    #[test]
    fn plain_date_is_all_day() {
        let when = parse_when("2025-03-20").unwrap();
        assert!(when.all_day);

        let local = when.at.with_timezone(&Local);
        assert_eq!((local.month(), local.day(), local.hour()), (3, 20, 0));
    }

    #[test]
    fn local_datetime_is_timed() {
        let when = parse_when("2025-03-20T09:30").unwrap();
        assert!(!when.all_day);
        assert_eq!(when.at.with_timezone(&Local).minute(), 30);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_when("not a date at all xyz").is_err());
    }

    #[test]
    fn window_end_of_date_covers_the_day() {
        let end = parse_window_end("2025-03-20").unwrap();
        let start = parse_when("2025-03-20").unwrap().at;
        assert_eq!(end - start, Duration::days(1) - Duration::seconds(1));
    }

    // --- durations and amounts ---

    #[test]
    fn humantime_durations() {
        assert_eq!(parse_duration("90min").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn amounts_keep_sign() {
        assert_eq!(parse_amount("3_000.50").unwrap(), Decimal::from_str("3000.50").unwrap());
        assert_eq!(parse_amount("-5").unwrap(), Decimal::from(-5));
        assert!(parse_amount("three").is_err());
    }
}
