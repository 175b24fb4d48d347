use crate::error::{Result, TicklerError};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = ".tickler.yaml";

// ---------------------------------------------------------------------------
// LabelConfig
// ---------------------------------------------------------------------------

/// Names of the status labels the due-date path applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    #[serde(default = "default_todo_label")]
    pub todo: String,
    #[serde(default = "default_due_label")]
    pub due: String,
}

fn default_todo_label() -> String {
    "todo".to_string()
}

fn default_due_label() -> String {
    "due".to_string()
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            todo: default_todo_label(),
            due: default_due_label(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecurrenceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// How far back an occurrence may lie and still be cloned. Should match
    /// the interval between runs.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
}

fn default_window_hours() -> u32 {
    24
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
        }
    }
}

// ---------------------------------------------------------------------------
// DirectiveConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectiveConfig {
    /// Also read `RRULE:` / `Due:` / `Labels:` prefix lines when a body has
    /// no trailing directive block.
    #[serde(default)]
    pub legacy_prefix_lines: bool,
}

// ---------------------------------------------------------------------------
// GithubConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Only consider open issues carrying all of these labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            labels: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
    #[serde(default)]
    pub directives: DirectiveConfig,
    #[serde(default)]
    pub github: GithubConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("labels.todo", &self.labels.todo), ("labels.due", &self.labels.due)] {
            if value.trim().is_empty() {
                return Err(TicklerError::Config(format!("{field} must not be empty")));
            }
        }
        if self.recurrence.window_hours == 0 {
            return Err(TicklerError::Config(
                "recurrence.window_hours must be at least 1".to_string(),
            ));
        }
        if self.github.api_base.trim().is_empty() {
            return Err(TicklerError::Config(
                "github.api_base must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.labels.todo, "todo");
        assert_eq!(cfg.recurrence.window_hours, 24);
        assert!(!cfg.directives.legacy_prefix_lines);
        assert_eq!(cfg.github.api_base, "https://api.github.com");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "labels:\n  due: urgent\ngithub:\n  labels: [recurring]\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.labels.todo, "todo");
        assert_eq!(cfg.labels.due, "urgent");
        assert_eq!(cfg.github.labels, vec!["recurring"]);
        assert_eq!(cfg.github.timeout_secs, 30);
    }

    #[test]
    fn load_from_disk_and_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "recurrence:\n  window_hours: 12\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.recurrence.window_hours, 12);

        let parsed: Config = serde_yaml::from_str(&cfg.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.recurrence.window_hours = 0;
        assert!(matches!(cfg.validate(), Err(TicklerError::Config(_))));

        let mut cfg = Config::default();
        cfg.labels.todo = "  ".to_string();
        assert!(matches!(cfg.validate(), Err(TicklerError::Config(_))));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, TicklerError::Io(_)));
    }
}
