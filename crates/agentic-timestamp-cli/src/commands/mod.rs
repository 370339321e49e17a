//! Subcommand implementations for the `agentic-timestamp` binary.

pub mod harvest;
pub mod parse;
pub mod resolve;

use anyhow::{Context, Result};

use agentic_timestamp::ReferenceClock;

/// Use the `--now` override if given, else sample the wall clock.
pub fn reference_clock(now: Option<&str>) -> Result<ReferenceClock> {
    match now {
        Some(raw) => ReferenceClock::parse_rfc3339(raw)
            .with_context(|| format!("--now must be an RFC 3339 instant, got '{raw}'")),
        None => Ok(ReferenceClock::now()),
    }
}
