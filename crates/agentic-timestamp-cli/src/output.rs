//! Output helpers shared by the subcommands.

use chrono::SecondsFormat;
use serde::Serialize;

use agentic_timestamp::{Candidate, ReferenceClock, Resolution};

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line human summary of a resolution, shown in the clock's offset.
pub fn format_resolution(resolution: &Resolution, clock: &ReferenceClock) -> String {
    match resolution {
        Resolution::Resolved(ts) => format!(
            "{}  ({})",
            ts.instant()
                .with_timezone(&clock.offset())
                .to_rfc3339_opts(SecondsFormat::Secs, false),
            ts.provenance_tag()
        ),
        Resolution::Unresolved => "unresolved".to_string(),
    }
}

/// Human listing of harvested candidates.
pub fn format_candidates(candidates: &[Candidate]) -> String {
    if candidates.is_empty() {
        return "no candidates".to_string();
    }
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{i:>3}  {:<16}  {}", c.kind.as_str(), c.raw_value))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_unresolved() {
        let clock = ReferenceClock::parse_rfc3339("2025-09-13T12:00:00+08:00").unwrap();
        assert_eq!(format_resolution(&Resolution::Unresolved, &clock), "unresolved");
    }

    #[test]
    fn test_format_candidates() {
        let out = format_candidates(&[Candidate::aria("2h")]);
        assert!(out.contains("aria_label"));
        assert!(out.contains("2h"));
        assert_eq!(format_candidates(&[]), "no candidates");
    }
}
