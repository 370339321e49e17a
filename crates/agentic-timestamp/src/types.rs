//! Core data types for harvested timestamp signals and resolution results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provenance::{StrategySource, Tier};
use crate::relative::DateRule;

/// The kind of harvested signal a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// A machine-readable datetime attribute (e.g. `<time datetime>`).
    MachineDatetime,
    /// A Unix epoch value in seconds (e.g. `data-utime`).
    EpochSeconds,
    /// A `title` attribute, usually a tooltip with the full date.
    TitleAttribute,
    /// An `aria-label` attribute.
    AriaLabel,
    /// Visible text of a timestamp-like element.
    FreeText,
}

impl CandidateKind {
    /// Stable snake_case name used in logs and provenance tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateKind::MachineDatetime => "machine_datetime",
            CandidateKind::EpochSeconds => "epoch_seconds",
            CandidateKind::TitleAttribute => "title_attribute",
            CandidateKind::AriaLabel => "aria_label",
            CandidateKind::FreeText => "free_text",
        }
    }

    /// Whether candidates of this kind are handled by the relative text tier.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            CandidateKind::TitleAttribute | CandidateKind::AriaLabel | CandidateKind::FreeText
        )
    }
}

/// One harvested raw signal that might encode a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: CandidateKind,
    #[serde(alias = "rawValue")]
    pub raw_value: String,
}

impl Candidate {
    pub fn new(kind: CandidateKind, raw_value: impl Into<String>) -> Self {
        Self {
            kind,
            raw_value: raw_value.into(),
        }
    }

    pub fn machine(raw: impl Into<String>) -> Self {
        Self::new(CandidateKind::MachineDatetime, raw)
    }

    pub fn epoch(raw: impl Into<String>) -> Self {
        Self::new(CandidateKind::EpochSeconds, raw)
    }

    pub fn title(raw: impl Into<String>) -> Self {
        Self::new(CandidateKind::TitleAttribute, raw)
    }

    pub fn aria(raw: impl Into<String>) -> Self {
        Self::new(CandidateKind::AriaLabel, raw)
    }

    pub fn text(raw: impl Into<String>) -> Self {
        Self::new(CandidateKind::FreeText, raw)
    }
}

/// A successfully resolved timestamp. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTimestamp {
    instant: DateTime<Utc>,
    source: StrategySource,
    rule: Option<DateRule>,
    candidate_index: Option<usize>,
}

impl ResolvedTimestamp {
    pub(crate) fn new(
        instant: DateTime<Utc>,
        source: StrategySource,
        rule: Option<DateRule>,
        candidate_index: Option<usize>,
    ) -> Self {
        Self {
            instant,
            source,
            rule,
            candidate_index,
        }
    }

    /// The resolved absolute instant.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Which tier and candidate kind produced this result.
    pub fn source(&self) -> StrategySource {
        self.source
    }

    /// The relative-parser rule that matched, if the text tier produced it.
    pub fn rule(&self) -> Option<DateRule> {
        self.rule
    }

    /// Position of the winning candidate in the capped list. `None` for OCR.
    pub fn candidate_index(&self) -> Option<usize> {
        self.candidate_index
    }

    /// Stable provenance tag, e.g. `relative:title_attribute/month_day`.
    pub fn provenance_tag(&self) -> String {
        match self.rule {
            Some(rule) => format!("{}/{}", self.source.as_str(), rule.as_str()),
            None => self.source.as_str().to_string(),
        }
    }
}

/// Outcome of resolving one target.
///
/// `Unresolved` is structurally distinct from every valid instant; it is
/// never encoded as the Unix epoch or any other placeholder date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedTimestamp),
    Unresolved,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn as_resolved(&self) -> Option<&ResolvedTimestamp> {
        match self {
            Resolution::Resolved(ts) => Some(ts),
            Resolution::Unresolved => None,
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.as_resolved().map(ResolvedTimestamp::instant)
    }

    /// Treat `Unresolved` as a hard error.
    pub fn require(self) -> TimestampResult<ResolvedTimestamp> {
        match self {
            Resolution::Resolved(ts) => Ok(ts),
            Resolution::Unresolved => Err(TimestampError::Unresolved),
        }
    }
}

impl From<Option<ResolvedTimestamp>> for Resolution {
    fn from(value: Option<ResolvedTimestamp>) -> Self {
        match value {
            Some(ts) => Resolution::Resolved(ts),
            None => Resolution::Unresolved,
        }
    }
}

/// Wire shape of a [`Resolution`]: `instant` is `null` when unresolved.
#[derive(Serialize, Deserialize)]
struct ResolutionRecord {
    status: String,
    instant: Option<DateTime<Utc>>,
    source: Option<StrategySource>,
    tier: Option<Tier>,
    rule: Option<DateRule>,
    candidate_index: Option<usize>,
    provenance: Option<String>,
}

impl Serialize for Resolution {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = match self {
            Resolution::Resolved(ts) => ResolutionRecord {
                status: "resolved".to_string(),
                instant: Some(ts.instant),
                source: Some(ts.source),
                tier: Some(ts.source.tier()),
                rule: ts.rule,
                candidate_index: ts.candidate_index,
                provenance: Some(ts.provenance_tag()),
            },
            Resolution::Unresolved => ResolutionRecord {
                status: "unresolved".to_string(),
                instant: None,
                source: None,
                tier: None,
                rule: None,
                candidate_index: None,
                provenance: None,
            },
        };
        record.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resolution {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = ResolutionRecord::deserialize(deserializer)?;
        match (record.status.as_str(), record.instant, record.source) {
            ("unresolved", None, _) => Ok(Resolution::Unresolved),
            ("resolved", Some(instant), Some(source))
                if record.tier.map_or(true, |tier| tier == source.tier()) =>
            {
                Ok(Resolution::Resolved(
                    ResolvedTimestamp::new(instant, source, record.rule, record.candidate_index),
                ))
            }
            (status, _, _) => Err(serde::de::Error::custom(format!(
                "inconsistent resolution record with status '{status}'"
            ))),
        }
    }
}

/// A rectangle region of a screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Errors that can occur in the timestamp library.
#[derive(thiserror::Error, Debug)]
pub enum TimestampError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Timestamp could not be resolved")]
    Unresolved,
}

/// Convenience result type.
pub type TimestampResult<T> = Result<T, TimestampError>;
