//! Reference clock injected into every resolution.
//!
//! Relative phrases ("Yesterday at 3:45 PM") are wall-clock statements, so the
//! reference instant carries the UTC offset in which those phrases are read.

use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};

/// The "now" instant against which relative expressions are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceClock(DateTime<FixedOffset>);

impl ReferenceClock {
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self(at)
    }

    /// Sample the system wall clock in the local offset.
    pub fn now() -> Self {
        Self(Local::now().fixed_offset())
    }

    /// Parse an RFC 3339 instant, keeping its offset.
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s.trim()).ok().map(Self)
    }

    pub fn at(&self) -> DateTime<FixedOffset> {
        self.0
    }

    pub fn offset(&self) -> FixedOffset {
        *self.0.offset()
    }

    pub fn utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }
}

impl From<DateTime<FixedOffset>> for ReferenceClock {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self(value)
    }
}

impl From<DateTime<Utc>> for ReferenceClock {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.fixed_offset())
    }
}

/// A source of reference clocks, sampled once per target.
pub trait Clock: Send + Sync {
    fn now(&self) -> ReferenceClock;
}

/// Wall-clock source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> ReferenceClock {
        ReferenceClock::now()
    }
}

/// A clock frozen at one instant, for deterministic runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub ReferenceClock);

impl Clock for FixedClock {
    fn now(&self) -> ReferenceClock {
        self.0
    }
}
