//! Configuration loading and resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};

use agentic_timestamp::ResolverConfig;

/// Resolve the config file path, if any.
///
/// Precedence: explicit `--config` > `AGENTIC_TIMESTAMP_CONFIG` >
/// `./.agentic-timestamp/config.json`.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var("AGENTIC_TIMESTAMP_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    let cwd_config = PathBuf::from(".agentic-timestamp/config.json");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    None
}

/// Load the resolver config: file (if any), then environment overrides.
pub fn load_config(explicit: Option<&str>) -> Result<ResolverConfig> {
    let base = match resolve_config_path(explicit) {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            ResolverConfig::from_file(&path)
                .with_context(|| format!("failed to load config: {}", path.display()))?
        }
        None => ResolverConfig::default(),
    };
    base.with_env_overrides()
        .context("invalid AGENTIC_TIMESTAMP_* environment override")
}
