//! Harvest timestamp candidates from a rendered HTML snapshot.
//!
//! This is the impure edge of the engine: it walks a document and turns
//! attributes and short texts into plain [`Candidate`] records. The resolver
//! never touches the document itself.
//!
//! Elements are visited once, in document order. For each element the
//! signals are emitted in a fixed order: `datetime`, epoch data attributes,
//! `title`, `aria-label`, then short visible text. Harvesting stops as soon
//! as `cap` candidates have been collected.

use scraper::{ElementRef, Html, Selector};

use crate::types::{Candidate, CandidateKind, TimestampError, TimestampResult};

/// Data attributes that carry Unix epoch seconds.
const EPOCH_ATTRIBUTES: &[&str] = &["data-utime", "data-timestamp", "data-epoch", "data-time"];

/// Elements whose text is harvested regardless of content.
const TIME_ELEMENTS: &[&str] = &["time", "abbr"];

/// Elements whose leaf text is harvested when it looks like a timestamp.
const TEXT_ELEMENTS: &[&str] = &["a", "span"];

/// Longest attribute value worth considering.
const MAX_ATTRIBUTE_LEN: usize = 200;

/// Longest visible text worth considering.
const MAX_TEXT_LEN: usize = 64;

const TIMESTAMP_WORDS: &[&str] = &[
    "now", "ago", "yesterday", "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep",
    "oct", "nov", "dec",
];

/// Harvest up to `cap` candidates from `html`.
///
/// When `scope` is given, only the first element matching that CSS selector
/// (and its descendants) is traversed; a scope that matches nothing yields an
/// empty list.
pub fn harvest_candidates(html: &str, scope: Option<&str>, cap: usize) -> TimestampResult<Vec<Candidate>> {
    let document = Html::parse_document(html);
    let all = Selector::parse("*").map_err(|e| TimestampError::InvalidInput(e.to_string()))?;

    let mut out = Vec::new();
    if cap == 0 {
        return Ok(out);
    }

    match scope {
        Some(scope) => {
            let scope_sel = Selector::parse(scope).map_err(|e| {
                TimestampError::InvalidInput(format!("invalid scope selector '{scope}': {e}"))
            })?;
            let Some(root) = document.select(&scope_sel).next() else {
                tracing::debug!("scope '{scope}' matched nothing");
                return Ok(out);
            };
            if harvest_element(&root, cap, &mut out) {
                for el in root.select(&all) {
                    if !harvest_element(&el, cap, &mut out) {
                        break;
                    }
                }
            }
        }
        None => {
            for el in document.select(&all) {
                if !harvest_element(&el, cap, &mut out) {
                    break;
                }
            }
        }
    }

    tracing::debug!(count = out.len(), cap, "harvested timestamp candidates");
    Ok(out)
}

/// Emit the candidates of one element. Returns `false` once the cap is hit.
fn harvest_element(el: &ElementRef<'_>, cap: usize, out: &mut Vec<Candidate>) -> bool {
    let value = el.value();

    if let Some(dt) = value.attr("datetime") {
        if !push(out, cap, CandidateKind::MachineDatetime, dt) {
            return false;
        }
    }

    for attr in EPOCH_ATTRIBUTES {
        if let Some(raw) = value.attr(attr) {
            let raw = raw.trim();
            if is_numeric(raw) && !push(out, cap, CandidateKind::EpochSeconds, raw) {
                return false;
            }
        }
    }

    if let Some(title) = value.attr("title") {
        if !push(out, cap, CandidateKind::TitleAttribute, title) {
            return false;
        }
    }

    if let Some(label) = value.attr("aria-label") {
        if !push(out, cap, CandidateKind::AriaLabel, label) {
            return false;
        }
    }

    let name = value.name();
    let harvest_text = if TIME_ELEMENTS.contains(&name) {
        true
    } else {
        TEXT_ELEMENTS.contains(&name) && is_leaf(el)
    };
    if harvest_text {
        let text = element_text(el);
        let wanted = TIME_ELEMENTS.contains(&name) || looks_like_timestamp(&text);
        if wanted && text.len() <= MAX_TEXT_LEN && !push(out, cap, CandidateKind::FreeText, &text) {
            return false;
        }
    }

    out.len() < cap
}

/// Push a non-empty value. Returns `false` if the cap was already reached.
fn push(out: &mut Vec<Candidate>, cap: usize, kind: CandidateKind, raw: &str) -> bool {
    if out.len() >= cap {
        return false;
    }
    let raw = raw.trim();
    if !raw.is_empty() && raw.len() <= MAX_ATTRIBUTE_LEN {
        out.push(Candidate::new(kind, raw));
    }
    out.len() < cap
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_leaf(el: &ElementRef<'_>) -> bool {
    !el.children().any(|c| c.value().is_element())
}

fn is_numeric(raw: &str) -> bool {
    !raw.is_empty() && raw.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

fn looks_like_timestamp(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    if text.chars().any(|c| c.is_ascii_digit()) {
        return true;
    }
    let lower = text.to_lowercase();
    TIMESTAMP_WORDS.iter().any(|w| lower.contains(w))
}
