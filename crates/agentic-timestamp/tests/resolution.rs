//! End-to-end resolution tests through the public API.
//!
//! Covers tier priority, OCR gating, determinism, the harvest cap, per-target
//! clocks in batches and the harvester-to-resolver hand-off.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use agentic_timestamp::*;

// ─────────────────────── helpers ───────────────────────

/// OCR stub that records how often it was invoked.
struct CountingOcr {
    reply: String,
    calls: AtomicUsize,
}

impl CountingOcr {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrCapability for CountingOcr {
    async fn recognize(&self, _image: &[u8], _language: &str) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Clock that advances one hour every time it is sampled.
struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    samples: AtomicUsize,
}

impl Clock for SteppingClock {
    fn now(&self) -> ReferenceClock {
        self.samples.fetch_add(1, Ordering::SeqCst);
        let mut next = self.next.lock().unwrap();
        let current = *next;
        *next = current + Duration::hours(1);
        ReferenceClock::from(current)
    }
}

fn clock() -> ReferenceClock {
    ReferenceClock::parse_rfc3339("2025-09-13T12:00:00+08:00").unwrap()
}

fn screenshot() -> OcrImage {
    OcrImage::new(vec![0x89, b'P', b'N', b'G'])
}

fn unparsable() -> Vec<Candidate> {
    vec![
        Candidate::machine("not-a-date"),
        Candidate::title("Shared with Public"),
        Candidate::aria("Comment"),
        Candidate::text("Like · Reply"),
    ]
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn test_epoch_beats_text_and_never_calls_ocr() {
    let ocr = CountingOcr::new("Just now");
    let resolver = Resolver::default().with_ocr(ocr.clone());

    let mut candidates = unparsable();
    candidates.insert(2, Candidate::epoch("1757745240"));

    let res = resolver
        .resolve(&candidates, Some(&screenshot()), clock())
        .await;
    let ts = res.as_resolved().expect("epoch candidate should resolve");
    assert_eq!(ts.source(), StrategySource::IsoEpochSeconds);
    assert_eq!(ts.instant().to_rfc3339(), "2025-09-13T06:34:00+00:00");
    assert_eq!(ocr.calls(), 0);
}

#[tokio::test]
async fn test_ocr_only_when_dom_tiers_fail() {
    let ocr = CountingOcr::new("  September 13\n at 2:34 PM ");
    let resolver = Resolver::default().with_ocr(ocr.clone());

    let res = resolver
        .resolve(&unparsable(), Some(&screenshot()), clock())
        .await;
    assert_eq!(ocr.calls(), 1);
    let ts = res.as_resolved().unwrap();
    assert_eq!(ts.source(), StrategySource::OcrRelative);
    assert_eq!(ts.rule(), Some(DateRule::MonthDay));
    assert_eq!(ts.instant().to_rfc3339(), "2025-09-13T06:34:00+00:00");
}

#[tokio::test]
async fn test_exhausted_tiers_are_unresolved_not_epoch() {
    let resolver = Resolver::default().with_ocr(Arc::new(NoopOcr));
    let res = resolver
        .resolve(&unparsable(), Some(&screenshot()), clock())
        .await;
    assert_eq!(res, Resolution::Unresolved);
    assert!(res.instant().is_none());

    let json = serde_json::to_value(&res).unwrap();
    assert!(json["instant"].is_null());
}

#[tokio::test]
async fn test_resolution_is_deterministic() {
    let resolver = Resolver::default();
    let candidates = vec![
        Candidate::text("Share"),
        Candidate::title("Yesterday at 3:45 PM"),
        Candidate::aria("5m"),
    ];
    let a = resolver.resolve(&candidates, None, clock()).await;
    let b = resolver.resolve(&candidates, None, clock()).await;
    assert_eq!(a, b);
    let (a, b) = (a.as_resolved().unwrap(), b.as_resolved().unwrap());
    assert_eq!(a.instant(), b.instant());
    assert_eq!(a.provenance_tag(), b.provenance_tag());
    assert_eq!(a.provenance_tag(), "relative:title_attribute/yesterday_at");
    assert_eq!(
        a.instant(),
        DateTime::parse_from_rfc3339("2025-09-12T15:45:00+08:00").unwrap()
    );
}

#[tokio::test]
async fn test_out_of_cap_entry_is_never_considered() {
    let ocr = CountingOcr::new("garbage");
    let resolver = Resolver::default().with_ocr(ocr.clone());
    let cap = resolver.config().harvest_cap;
    assert_eq!(cap, DEFAULT_HARVEST_CAP);

    let mut candidates = vec![Candidate::text("Reply"); cap];
    candidates.push(Candidate::machine("2025-09-01T00:00:00Z"));

    let res = resolver
        .resolve(&candidates, Some(&screenshot()), clock())
        .await;
    assert_eq!(res, Resolution::Unresolved);
    assert_eq!(ocr.calls(), 1);

    // Within the cap, the same entry wins.
    candidates.remove(0);
    let res = resolver.resolve(&candidates, None, clock()).await;
    assert_eq!(
        res.as_resolved().unwrap().source(),
        StrategySource::IsoMachineDatetime
    );
}

#[tokio::test]
async fn test_batch_samples_clock_per_target() {
    let source = SteppingClock {
        next: Mutex::new(clock().utc()),
        samples: AtomicUsize::new(0),
    };
    let targets = vec![
        Target {
            candidates: vec![Candidate::text("Just now")],
            image: None,
        },
        Target {
            candidates: vec![Candidate::text("Just now")],
            image: None,
        },
        Target::default(),
    ];

    let out = Resolver::default().resolve_batch(&targets, &source).await;
    assert_eq!(source.samples.load(Ordering::SeqCst), 3);
    assert_eq!(out[0].instant(), Some(clock().utc()));
    assert_eq!(out[1].instant(), Some(clock().utc() + Duration::hours(1)));
    assert_eq!(out[2], Resolution::Unresolved);
}

#[test]
fn test_fixed_clock_source() {
    let resolver = Resolver::default();
    let res = tokio_test::block_on(resolver.resolve_with_clock(
        &[Candidate::text("3d")],
        None,
        &FixedClock(clock()),
    ));
    assert_eq!(res.instant(), Some(clock().utc() - Duration::days(3)));
}

#[tokio::test]
async fn test_harvest_then_resolve() {
    let html = r#"
    <div class="post">
      <a href="/story" aria-label="Yesterday at 9:05 PM"><span>Yesterday</span></a>
      <abbr data-utime="1757682300" title="Friday, September 12, 2025 at 9:05 PM">21h</abbr>
    </div>
    "#;
    let candidates = harvest_candidates(html, Some(".post"), DEFAULT_HARVEST_CAP).unwrap();
    assert!(candidates.iter().any(|c| c.kind == CandidateKind::EpochSeconds));

    let res = Resolver::default().resolve(&candidates, None, clock()).await;
    let ts = res.as_resolved().unwrap();
    assert_eq!(ts.source(), StrategySource::IsoEpochSeconds);
    assert_eq!(
        ts.instant(),
        DateTime::parse_from_rfc3339("2025-09-12T21:05:00+08:00").unwrap()
    );
}

#[test]
fn test_policy_is_uniform() {
    let policy = UnresolvedPolicy::Error;
    assert!(policy.apply(Resolution::Unresolved).is_err());
    assert!(UnresolvedPolicy::NullField
        .apply(Resolution::Unresolved)
        .unwrap()
        .is_none());
}
