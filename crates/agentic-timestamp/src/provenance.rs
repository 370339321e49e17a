//! Provenance tags recording which tier and candidate kind produced a result.
//!
//! Tags are diagnostic metadata only. They are stable strings so regression
//! fixtures can assert on them, and nothing in the pipeline branches on them.

use serde::{Deserialize, Serialize};

use crate::types::CandidateKind;

/// Priority level in the strategy pipeline, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    MachineDatetime = 1,
    EpochSeconds = 2,
    RelativeText = 3,
    Ocr = 4,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::MachineDatetime => "machine_datetime",
            Tier::EpochSeconds => "epoch_seconds",
            Tier::RelativeText => "relative_text",
            Tier::Ocr => "ocr",
        }
    }
}

/// Exact tier + candidate kind that produced a [`ResolvedTimestamp`].
///
/// [`ResolvedTimestamp`]: crate::types::ResolvedTimestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategySource {
    #[serde(rename = "iso:machine_datetime")]
    IsoMachineDatetime,
    #[serde(rename = "iso:epoch_seconds")]
    IsoEpochSeconds,
    #[serde(rename = "relative:title_attribute")]
    RelativeTitleAttribute,
    #[serde(rename = "relative:aria_label")]
    RelativeAriaLabel,
    #[serde(rename = "relative:free_text")]
    RelativeFreeText,
    #[serde(rename = "ocr:relative")]
    OcrRelative,
}

impl StrategySource {
    /// Tag for a DOM-derived candidate of the given kind.
    pub fn for_candidate(kind: CandidateKind) -> Self {
        match kind {
            CandidateKind::MachineDatetime => StrategySource::IsoMachineDatetime,
            CandidateKind::EpochSeconds => StrategySource::IsoEpochSeconds,
            CandidateKind::TitleAttribute => StrategySource::RelativeTitleAttribute,
            CandidateKind::AriaLabel => StrategySource::RelativeAriaLabel,
            CandidateKind::FreeText => StrategySource::RelativeFreeText,
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            StrategySource::IsoMachineDatetime => Tier::MachineDatetime,
            StrategySource::IsoEpochSeconds => Tier::EpochSeconds,
            StrategySource::RelativeTitleAttribute
            | StrategySource::RelativeAriaLabel
            | StrategySource::RelativeFreeText => Tier::RelativeText,
            StrategySource::OcrRelative => Tier::Ocr,
        }
    }

    /// The candidate kind behind this tag. `None` for OCR, which has no candidate.
    pub fn candidate_kind(&self) -> Option<CandidateKind> {
        match self {
            StrategySource::IsoMachineDatetime => Some(CandidateKind::MachineDatetime),
            StrategySource::IsoEpochSeconds => Some(CandidateKind::EpochSeconds),
            StrategySource::RelativeTitleAttribute => Some(CandidateKind::TitleAttribute),
            StrategySource::RelativeAriaLabel => Some(CandidateKind::AriaLabel),
            StrategySource::RelativeFreeText => Some(CandidateKind::FreeText),
            StrategySource::OcrRelative => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategySource::IsoMachineDatetime => "iso:machine_datetime",
            StrategySource::IsoEpochSeconds => "iso:epoch_seconds",
            StrategySource::RelativeTitleAttribute => "relative:title_attribute",
            StrategySource::RelativeAriaLabel => "relative:aria_label",
            StrategySource::RelativeFreeText => "relative:free_text",
            StrategySource::OcrRelative => "ocr:relative",
        }
    }
}

impl std::fmt::Display for StrategySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [StrategySource; 6] = [
        StrategySource::IsoMachineDatetime,
        StrategySource::IsoEpochSeconds,
        StrategySource::RelativeTitleAttribute,
        StrategySource::RelativeAriaLabel,
        StrategySource::RelativeFreeText,
        StrategySource::OcrRelative,
    ];

    #[test]
    fn test_serde_matches_as_str() {
        for source in ALL {
            let json = serde_json::to_value(source).unwrap();
            assert_eq!(json, source.as_str());
        }
    }

    #[test]
    fn test_tags_are_unique() {
        let mut tags: Vec<_> = ALL.iter().map(|s| s.as_str()).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), ALL.len());
    }

    #[test]
    fn test_candidate_mapping_round_trips() {
        for kind in [
            CandidateKind::MachineDatetime,
            CandidateKind::EpochSeconds,
            CandidateKind::TitleAttribute,
            CandidateKind::AriaLabel,
            CandidateKind::FreeText,
        ] {
            assert_eq!(StrategySource::for_candidate(kind).candidate_kind(), Some(kind));
        }
        assert_eq!(StrategySource::OcrRelative.candidate_kind(), None);
    }

    #[test]
    fn test_tier_order() {
        assert!(Tier::MachineDatetime < Tier::EpochSeconds);
        assert!(Tier::EpochSeconds < Tier::RelativeText);
        assert!(Tier::RelativeText < Tier::Ocr);
        assert_eq!(StrategySource::RelativeAriaLabel.tier(), Tier::RelativeText);
    }
}
