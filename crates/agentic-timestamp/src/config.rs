//! Resolver configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ocr::DEFAULT_LANGUAGE;
use crate::types::{Resolution, ResolvedTimestamp, TimestampError, TimestampResult};

/// Default maximum number of candidates considered per target.
pub const DEFAULT_HARVEST_CAP: usize = 50;

/// Default OCR time budget in milliseconds.
pub const DEFAULT_OCR_TIMEOUT_MS: u64 = 15_000;

/// How callers treat a target that could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Keep the record, with a null timestamp.
    #[default]
    NullField,
    /// Fail the record.
    Error,
}

impl UnresolvedPolicy {
    /// Apply the policy: `Ok(None)` is a kept record with no timestamp.
    pub fn apply(&self, resolution: Resolution) -> TimestampResult<Option<ResolvedTimestamp>> {
        match (self, resolution) {
            (_, Resolution::Resolved(ts)) => Ok(Some(ts)),
            (UnresolvedPolicy::NullField, Resolution::Unresolved) => Ok(None),
            (UnresolvedPolicy::Error, Resolution::Unresolved) => Err(TimestampError::Unresolved),
        }
    }
}

/// Tunables for the strategy pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum number of harvested candidates considered.
    pub harvest_cap: usize,
    /// Time budget for one OCR call.
    pub ocr_timeout_ms: u64,
    /// Language hint passed to the OCR capability.
    pub ocr_language: String,
    pub unresolved_policy: UnresolvedPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            harvest_cap: DEFAULT_HARVEST_CAP,
            ocr_timeout_ms: DEFAULT_OCR_TIMEOUT_MS,
            ocr_language: DEFAULT_LANGUAGE.to_string(),
            unresolved_policy: UnresolvedPolicy::default(),
        }
    }
}

impl ResolverConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> TimestampResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `AGENTIC_TIMESTAMP_*` environment overrides.
    pub fn with_env_overrides(self) -> TimestampResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> TimestampResult<Self> {
        if let Some(v) = lookup("AGENTIC_TIMESTAMP_HARVEST_CAP") {
            self.harvest_cap = v.trim().parse().map_err(|_| {
                TimestampError::Config(format!("AGENTIC_TIMESTAMP_HARVEST_CAP: invalid value '{v}'"))
            })?;
        }
        if let Some(v) = lookup("AGENTIC_TIMESTAMP_OCR_TIMEOUT_MS") {
            self.ocr_timeout_ms = v.trim().parse().map_err(|_| {
                TimestampError::Config(format!(
                    "AGENTIC_TIMESTAMP_OCR_TIMEOUT_MS: invalid value '{v}'"
                ))
            })?;
        }
        if let Some(v) = lookup("AGENTIC_TIMESTAMP_OCR_LANG") {
            self.ocr_language = v.trim().to_string();
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> TimestampResult<()> {
        if self.harvest_cap == 0 {
            return Err(TimestampError::Config(
                "harvest_cap must be at least 1".to_string(),
            ));
        }
        if self.ocr_language.is_empty() {
            return Err(TimestampError::Config(
                "ocr_language must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
