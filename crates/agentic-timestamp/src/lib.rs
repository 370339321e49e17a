//! AgenticTimestamp — resolve harvested page timestamp signals into a single absolute instant.
//!
//! Machine-readable attributes win over epoch values, which win over relative
//! text, with OCR of a screenshot region as the last resort. See [`resolver`]
//! for the tier order.

pub mod clock;
pub mod config;
pub mod harvest;
pub mod iso;
pub mod ocr;
pub mod provenance;
pub mod relative;
pub mod resolver;
pub mod types;

pub use clock::{Clock, FixedClock, ReferenceClock, SystemClock};
pub use config::{ResolverConfig, UnresolvedPolicy, DEFAULT_HARVEST_CAP};
pub use harvest::harvest_candidates;
pub use iso::{normalize_epoch, normalize_epoch_seconds, normalize_iso};
pub use ocr::{recognize_with_timeout, NoopOcr, OcrCapability, OcrError, OcrImage, TesseractOcr};
pub use provenance::{StrategySource, Tier};
pub use relative::{parse_relative, parse_relative_match, DateRule, RelativeMatch};
pub use resolver::{Resolver, Target};
pub use types::*;
