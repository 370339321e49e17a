//! `agentic-timestamp parse <text>` — run the relative date parser alone.

use anyhow::Result;
use serde::Serialize;

use agentic_timestamp::{parse_relative_match, DateRule, ReferenceClock};
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize)]
pub struct ParseOutcome {
    pub text: String,
    pub now: ReferenceClock,
    pub instant: Option<DateTime<Utc>>,
    pub rule: Option<DateRule>,
}

/// Run the parse command.
pub fn run(text: &str, now: Option<&str>) -> Result<ParseOutcome> {
    let clock = super::reference_clock(now)?;
    let found = parse_relative_match(text, &clock);
    Ok(ParseOutcome {
        text: text.to_string(),
        now: clock,
        instant: found.map(|m| m.instant),
        rule: found.map(|m| m.rule),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yesterday() {
        let out = run("Yesterday at 3:45 PM", Some("2025-09-13T12:00:00+08:00")).unwrap();
        assert_eq!(out.rule, Some(DateRule::YesterdayAt));
        assert_eq!(
            out.instant.unwrap().to_rfc3339(),
            "2025-09-12T07:45:00+00:00"
        );
    }

    #[test]
    fn test_parse_miss() {
        let out = run("Comment", Some("2025-09-13T12:00:00+08:00")).unwrap();
        assert!(out.instant.is_none());
        assert!(out.rule.is_none());
    }
}
