//! Relative date parser: natural-language timestamp phrases to instants.
//!
//! Dispatch runs over one ordered rule table. The first rule whose pattern
//! matches *and* yields a valid instant wins; results are never blended.
//! A `MonthDay` match is final: if its fields are rejected the phrase does
//! not resolve at all, so the calendar fallback cannot undo the rollback.
//! Patterns match against a lower-cased, trimmed copy of the input.
//!
//! | # | Rule            | Example                          |
//! |---|-----------------|----------------------------------|
//! | 1 | `JustNow`       | `Just now`                       |
//! | 2 | `ShortRelative` | `5m`, `2 hrs`, `3 days ago`      |
//! | 3 | `YesterdayAt`   | `Yesterday at 3:45 PM`           |
//! | 4 | `MonthDay`      | `September 13, 2024 at 2:34 PM`  |
//! | 5 | `Calendar`      | `2025-09-13 14:34`               |

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::clock::ReferenceClock;
use crate::iso::parse_calendar;

/// Identifies which rule of the table produced an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRule {
    /// `just now`, resolved to the reference clock exactly.
    JustNow,
    /// `<N> <unit>` with N of 1-3 digits and unit minutes/hours/days.
    ShortRelative,
    /// `Yesterday at HH:MM AM|PM`.
    YesterdayAt,
    /// `<Month> <Day>[, <Year>][ at HH:MM AM|PM]`.
    ///
    /// When the date falls after the reference clock the year is decremented
    /// once. This is only correct for true dates within the twelve months
    /// preceding the clock; anything older resolves to the wrong year.
    MonthDay,
    /// General calendar parse of the whole cleaned string.
    Calendar,
}

impl DateRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRule::JustNow => "just_now",
            DateRule::ShortRelative => "short_relative",
            DateRule::YesterdayAt => "yesterday_at",
            DateRule::MonthDay => "month_day",
            DateRule::Calendar => "calendar",
        }
    }
}

/// A successful relative parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeMatch {
    pub instant: DateTime<Utc>,
    pub rule: DateRule,
}

type Extractor = fn(&Captures<'_>, &ReferenceClock) -> Option<DateTime<Utc>>;

enum Matcher {
    Pattern(Regex, Extractor),
    Calendar,
}

struct RuleEntry {
    rule: DateRule,
    matcher: Matcher,
    /// A match is final even when its fields are rejected.
    decisive: bool,
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn rule_table() -> &'static [RuleEntry] {
    static TABLE: OnceLock<Vec<RuleEntry>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let month_alt = MONTHS.join("|");
        vec![
            RuleEntry {
                rule: DateRule::JustNow,
                matcher: Matcher::Pattern(
                    Regex::new(r"\bjust\s*now\b").expect("just-now regex is valid"),
                    extract_just_now,
                ),
                decisive: false,
            },
            RuleEntry {
                rule: DateRule::ShortRelative,
                matcher: Matcher::Pattern(
                    Regex::new(
                        r"\b(\d{1,3})\s*(minutes|minute|mins|min|m|hours|hour|hrs|hr|h|days|day|d)\b",
                    )
                    .expect("short-relative regex is valid"),
                    extract_short_relative,
                ),
                decisive: false,
            },
            RuleEntry {
                rule: DateRule::YesterdayAt,
                matcher: Matcher::Pattern(
                    Regex::new(r"\byesterday\s+at\s+(\d{1,2}):(\d{2})\s*(am|pm)\b")
                        .expect("yesterday regex is valid"),
                    extract_yesterday_at,
                ),
                decisive: false,
            },
            RuleEntry {
                rule: DateRule::MonthDay,
                matcher: Matcher::Pattern(
                    Regex::new(&format!(
                        r"\b({month_alt})\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s*(\d{{4}})\b)?(?:\s+at\s+(\d{{1,2}}):(\d{{2}})\s*(am|pm)\b|(\s+at\s+\d))?"
                    ))
                    .expect("month-day regex is valid"),
                    extract_month_day,
                ),
                decisive: true,
            },
            RuleEntry {
                rule: DateRule::Calendar,
                matcher: Matcher::Calendar,
                decisive: false,
            },
        ]
    })
}

/// Parse a natural-language timestamp phrase against `clock`.
pub fn parse_relative(text: &str, clock: &ReferenceClock) -> Option<DateTime<Utc>> {
    parse_relative_match(text, clock).map(|m| m.instant)
}

/// Like [`parse_relative`], also reporting which rule matched.
pub fn parse_relative_match(text: &str, clock: &ReferenceClock) -> Option<RelativeMatch> {
    let cleaned = collapse_whitespace(text);
    if cleaned.is_empty() {
        return None;
    }
    let lowered = cleaned.to_lowercase();

    for entry in rule_table() {
        let instant = match &entry.matcher {
            Matcher::Pattern(re, extract) => match re.captures(&lowered) {
                Some(caps) => {
                    let instant = extract(&caps, clock);
                    if instant.is_none() {
                        tracing::debug!(
                            rule = entry.rule.as_str(),
                            "rule pattern matched but fields are out of range"
                        );
                        if entry.decisive {
                            return None;
                        }
                    }
                    instant
                }
                None => None,
            },
            Matcher::Calendar => parse_calendar(&strip_ordinals(&cleaned), clock.offset()),
        };
        if let Some(instant) = instant {
            return Some(RelativeMatch {
                instant,
                rule: entry.rule,
            });
        }
    }
    None
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Extractors ───────────────────────────────────────────────────────────────

fn extract_just_now(_caps: &Captures<'_>, clock: &ReferenceClock) -> Option<DateTime<Utc>> {
    Some(clock.utc())
}

fn extract_short_relative(caps: &Captures<'_>, clock: &ReferenceClock) -> Option<DateTime<Utc>> {
    let n: i64 = caps.get(1)?.as_str().parse().ok()?;
    let unit_secs = match caps.get(2)?.as_str() {
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86_400,
        _ => return None,
    };
    clock
        .utc()
        .checked_sub_signed(Duration::seconds(n * unit_secs))
}

fn extract_yesterday_at(caps: &Captures<'_>, clock: &ReferenceClock) -> Option<DateTime<Utc>> {
    let (hour, minute) = clock_time(caps, 1)?;
    let yesterday = clock.at().date_naive().pred_opt()?;
    at_wall_time(yesterday, hour, minute, clock)
}

fn extract_month_day(caps: &Captures<'_>, clock: &ReferenceClock) -> Option<DateTime<Utc>> {
    // An `at` clause that is not `HH:MM AM|PM`; never fall back to midnight.
    if caps.get(7).is_some() {
        return None;
    }
    let month_name = caps.get(1)?.as_str();
    let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year: Option<i32> = match caps.get(3) {
        Some(y) => Some(y.as_str().parse().ok()?),
        None => None,
    };
    let (hour, minute) = if caps.get(4).is_some() {
        clock_time(caps, 4)?
    } else {
        (0, 0)
    };

    let date = month_day_date(year, month, day, clock)?;
    at_wall_time(date, hour, minute, clock)
}

/// Pick the calendar date for a month/day, rolling back one year when it
/// falls after the clock's date. A time later today than the clock stays in
/// the current year.
fn month_day_date(
    year: Option<i32>,
    month: u32,
    day: u32,
    clock: &ReferenceClock,
) -> Option<NaiveDate> {
    let today = clock.at().date_naive();
    let base = year.unwrap_or(today.year());
    match NaiveDate::from_ymd_opt(base, month, day) {
        Some(date) if date <= today => Some(date),
        Some(_) => {
            tracing::debug!(
                year = base,
                "month/day falls after reference clock, rolling back one year"
            );
            NaiveDate::from_ymd_opt(base - 1, month, day)
        }
        // February 29 outside a leap year: the previous year is the only
        // other date within twelve months.
        None if year.is_none() => NaiveDate::from_ymd_opt(base - 1, month, day),
        None => None,
    }
}

/// Read `HH:MM AM|PM` from three consecutive capture groups starting at `first`.
fn clock_time(caps: &Captures<'_>, first: usize) -> Option<(u32, u32)> {
    let hour: u32 = caps.get(first)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(first + 1)?.as_str().parse().ok()?;
    let meridiem = caps.get(first + 2)?.as_str();
    to_24_hour(hour, minute, meridiem == "pm")
}

/// 12-hour to 24-hour conversion: 12 AM is 0, 12 PM stays 12, other PM
/// hours add 12.
pub(crate) fn to_24_hour(hour: u32, minute: u32, pm: bool) -> Option<(u32, u32)> {
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    Some((hour, minute))
}

fn at_wall_time(
    date: NaiveDate,
    hour: u32,
    minute: u32,
    clock: &ReferenceClock,
) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    clock
        .offset()
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn strip_ordinals(text: &str) -> String {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    let re = ORDINAL
        .get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("ordinal regex is valid"));
    re.replace_all(text, "$1").into_owned()
}
