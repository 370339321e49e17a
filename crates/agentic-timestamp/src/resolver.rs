//! Strategy pipeline: resolve a harvested candidate list to one instant.
//!
//! Tiers run in fixed priority order and the first success wins:
//!
//! 1. `MachineDatetime` candidates through the ISO normalizer.
//! 2. `EpochSeconds` candidates through the ISO normalizer.
//! 3. `TitleAttribute` / `AriaLabel` / `FreeText` candidates through the
//!    relative date parser, in harvested order.
//! 4. OCR of a host-supplied image region, fed back into the relative parser.
//!
//! Within a tier candidates are scanned in the order the harvester returned
//! them. Results from different tiers are never merged. Only the first
//! `harvest_cap` candidates are ever looked at.
//!
//! The resolver holds no per-target state, so one instance may serve many
//! targets concurrently.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, ReferenceClock};
use crate::config::ResolverConfig;
use crate::iso::{normalize_epoch, normalize_iso};
use crate::ocr::{clean_recognized_text, recognize_with_timeout, OcrCapability, OcrImage};
use crate::provenance::StrategySource;
use crate::relative::{parse_relative_match, DateRule};
use crate::types::{Candidate, CandidateKind, Resolution, ResolvedTimestamp};

/// One target to resolve in a batch.
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub candidates: Vec<Candidate>,
    pub image: Option<OcrImage>,
}

/// The timestamp strategy pipeline.
#[derive(Clone)]
pub struct Resolver {
    config: ResolverConfig,
    ocr: Option<Arc<dyn OcrCapability>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl Resolver {
    /// Create a resolver with no OCR capability.
    pub fn new(config: ResolverConfig) -> Self {
        Self { config, ocr: None }
    }

    /// Attach an OCR capability for the last-resort tier.
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrCapability>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// Run every tier against an explicitly injected reference clock.
    pub async fn resolve(
        &self,
        candidates: &[Candidate],
        image: Option<&OcrImage>,
        clock: ReferenceClock,
    ) -> Resolution {
        if let Some(ts) = self.resolve_candidates(candidates, &clock) {
            return Resolution::Resolved(ts);
        }
        match self.resolve_ocr(image, &clock).await {
            Some(ts) => Resolution::Resolved(ts),
            None => {
                tracing::debug!(candidates = candidates.len(), "all tiers exhausted; unresolved");
                Resolution::Unresolved
            }
        }
    }

    /// Resolve against a clock sampled from `source` at the moment this
    /// target's resolution begins.
    pub async fn resolve_with_clock(
        &self,
        candidates: &[Candidate],
        image: Option<&OcrImage>,
        source: &dyn Clock,
    ) -> Resolution {
        let clock = source.now();
        self.resolve(candidates, image, clock).await
    }

    /// Resolve against the system wall clock, sampled now.
    pub async fn resolve_now(&self, candidates: &[Candidate], image: Option<&OcrImage>) -> Resolution {
        self.resolve(candidates, image, ReferenceClock::now()).await
    }

    /// Resolve targets in order, sampling a fresh clock for each one.
    pub async fn resolve_batch(&self, targets: &[Target], source: &dyn Clock) -> Vec<Resolution> {
        let mut out = Vec::with_capacity(targets.len());
        for target in targets {
            out.push(
                self.resolve_with_clock(&target.candidates, target.image.as_ref(), source)
                    .await,
            );
        }
        out
    }

    /// Tiers 1-3 only: the DOM-derived candidates, without OCR.
    pub fn resolve_candidates(
        &self,
        candidates: &[Candidate],
        clock: &ReferenceClock,
    ) -> Option<ResolvedTimestamp> {
        let capped = self.capped(candidates);

        scan_tier(capped, |k| k == CandidateKind::MachineDatetime, |raw| {
            normalize_iso(raw, clock.offset()).map(|i| (i, None))
        })
        .or_else(|| {
            scan_tier(capped, |k| k == CandidateKind::EpochSeconds, |raw| {
                normalize_epoch(raw).map(|i| (i, None))
            })
        })
        .or_else(|| {
            scan_tier(capped, |k| k.is_text(), |raw| {
                parse_relative_match(raw, clock).map(|m| (m.instant, Some(m.rule)))
            })
        })
    }

    fn capped<'a>(&self, candidates: &'a [Candidate]) -> &'a [Candidate] {
        let cap = self.config.harvest_cap;
        if candidates.len() > cap {
            tracing::debug!(
                total = candidates.len(),
                cap,
                "candidate list exceeds harvest cap; ignoring the tail"
            );
            &candidates[..cap]
        } else {
            candidates
        }
    }

    async fn resolve_ocr(
        &self,
        image: Option<&OcrImage>,
        clock: &ReferenceClock,
    ) -> Option<ResolvedTimestamp> {
        let ocr = self.ocr.as_ref()?;
        let Some(image) = image else {
            tracing::debug!("no image region supplied; skipping OCR tier");
            return None;
        };

        let bytes = match image.prepare() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("OCR tier skipped, image region unusable: {e}");
                return None;
            }
        };

        let recognized = recognize_with_timeout(
            &**ocr,
            &bytes,
            &self.config.ocr_language,
            self.config.ocr_timeout_ms,
        )
        .await;
        let text = match recognized {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("OCR tier failed via {}: {e}", ocr.name());
                return None;
            }
        };

        let cleaned = clean_recognized_text(&text);
        let found = parse_relative_match(&cleaned, clock);
        if found.is_none() {
            tracing::debug!(text = %cleaned, "OCR text did not parse as a timestamp");
        }
        found.map(|m| {
            ResolvedTimestamp::new(m.instant, StrategySource::OcrRelative, Some(m.rule), None)
        })
    }
}

/// Scan one tier: the first candidate of an accepted kind that parses wins.
fn scan_tier(
    candidates: &[Candidate],
    accepts: impl Fn(CandidateKind) -> bool,
    parse: impl Fn(&str) -> Option<(DateTime<Utc>, Option<DateRule>)>,
) -> Option<ResolvedTimestamp> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| accepts(c.kind))
        .find_map(|(index, c)| {
            let (instant, rule) = parse(&c.raw_value)?;
            let source = StrategySource::for_candidate(c.kind);
            tracing::debug!(index, source = source.as_str(), "candidate resolved");
            Some(ResolvedTimestamp::new(instant, source, rule, Some(index)))
        })
}
