//! `agentic-timestamp harvest --html <file>` — list the capped candidate list.

use std::path::Path;

use anyhow::{Context, Result};

use agentic_timestamp::{harvest_candidates, Candidate};

/// Run the harvest command.
pub fn run(html: &Path, scope: Option<&str>, cap: usize) -> Result<Vec<Candidate>> {
    let source = std::fs::read_to_string(html)
        .with_context(|| format!("failed to read HTML: {}", html.display()))?;
    let candidates = harvest_candidates(&source, scope, cap)?;
    tracing::info!("harvested {} candidate(s) from {}", candidates.len(), html.display());
    Ok(candidates)
}
