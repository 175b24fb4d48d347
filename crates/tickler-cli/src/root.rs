use anyhow::Context;
use std::path::{Path, PathBuf};
use tickler_core::config::{Config, CONFIG_FILE};

/// Resolve the config file to use.
///
/// Priority:
/// 1. `--config` flag / `TICKLER_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `start` looking for `.tickler.yaml`
/// 3. None: built-in defaults apply
pub fn resolve_config(explicit: Option<&Path>, start: &Path) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}

/// Load the effective config and report which file it came from.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, Option<PathBuf>)> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match resolve_config(explicit, &cwd) {
        Some(path) => {
            let config = Config::load(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok((config, Some(path)))
        }
        None => Ok((Config::default(), None)),
    }
}
