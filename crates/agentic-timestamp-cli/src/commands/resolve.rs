//! `agentic-timestamp resolve` — run the full strategy pipeline for one target.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use agentic_timestamp::{
    harvest_candidates, Candidate, OcrImage, Rect, ReferenceClock, Resolution, Resolver,
    ResolverConfig, TesseractOcr,
};

/// Inputs for one resolve run.
#[derive(Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Rendered HTML snapshot to harvest.
    pub html: Option<PathBuf>,
    /// Pre-harvested candidate list (JSON array).
    pub candidates: Option<PathBuf>,
    /// CSS selector limiting harvesting to one post.
    pub scope: Option<String>,
    /// Reference clock override (RFC 3339).
    pub now: Option<String>,
    /// Screenshot for the OCR tier.
    pub ocr_image: Option<PathBuf>,
    /// `x,y,w,h` region of the screenshot.
    pub ocr_region: Option<String>,
    /// Explicit Tesseract binary.
    pub tesseract: Option<PathBuf>,
    pub no_ocr: bool,
}

#[derive(Debug, Serialize)]
pub struct ResolveOutcome {
    pub now: ReferenceClock,
    pub candidates: usize,
    pub resolution: Resolution,
}

/// Run the resolve command. `Unresolved` is an error only under
/// [`UnresolvedPolicy::Error`](agentic_timestamp::UnresolvedPolicy::Error).
pub async fn run(args: &ResolveArgs, config: &ResolverConfig) -> Result<ResolveOutcome> {
    let candidates = load_candidates(args, config.harvest_cap)?;
    let image = load_image(args)?;

    let mut resolver = Resolver::new(config.clone());
    if image.is_some() && !args.no_ocr {
        let ocr = match &args.tesseract {
            Some(path) => TesseractOcr::with_binary(path),
            None => TesseractOcr::detect(),
        };
        if !ocr.is_available() {
            tracing::warn!("tesseract not found; OCR tier will be skipped");
        }
        resolver = resolver.with_ocr(Arc::new(ocr));
    }

    // Sampled per target, right before resolution starts.
    let clock = super::reference_clock(args.now.as_deref())?;
    let resolution = resolver.resolve(&candidates, image.as_ref(), clock).await;

    config
        .unresolved_policy
        .apply(resolution.clone())
        .context("no tier produced a timestamp")?;

    Ok(ResolveOutcome {
        now: clock,
        candidates: candidates.len(),
        resolution,
    })
}

fn load_candidates(args: &ResolveArgs, cap: usize) -> Result<Vec<Candidate>> {
    match (&args.html, &args.candidates) {
        (Some(_), Some(_)) => bail!("pass either --html or --candidates, not both"),
        (Some(html), None) => {
            let source = std::fs::read_to_string(html)
                .with_context(|| format!("failed to read HTML: {}", html.display()))?;
            Ok(harvest_candidates(&source, args.scope.as_deref(), cap)?)
        }
        (None, Some(path)) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read candidates: {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("invalid candidate list: {}", path.display()))
        }
        (None, None) => Ok(Vec::new()),
    }
}

fn load_image(args: &ResolveArgs) -> Result<Option<OcrImage>> {
    let Some(path) = &args.ocr_image else {
        if args.ocr_region.is_some() {
            bail!("--ocr-region requires --ocr-image");
        }
        return Ok(None);
    };
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image: {}", path.display()))?;
    let mut image = OcrImage::new(bytes);
    if let Some(region) = &args.ocr_region {
        image = image.with_region(parse_region(region)?);
    }
    Ok(Some(image))
}

/// Parse `x,y,w,h`.
pub fn parse_region(raw: &str) -> Result<Rect> {
    let parts: Vec<u32> = raw
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("region must be x,y,w,h, got '{raw}'"))?;
    match parts.as_slice() {
        [x, y, w, h] => Ok(Rect {
            x: *x,
            y: *y,
            w: *w,
            h: *h,
        }),
        _ => bail!("region must have four components, got '{raw}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() {
        let r = parse_region("10, 20,300,40").unwrap();
        assert_eq!((r.x, r.y, r.w, r.h), (10, 20, 300, 40));
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("a,b,c,d").is_err());
    }

    #[test]
    fn test_region_without_image_rejected() {
        let args = ResolveArgs {
            ocr_region: Some("0,0,1,1".to_string()),
            ..ResolveArgs::default()
        };
        assert!(load_image(&args).is_err());
    }
}
