//! Per-target sync settings, loaded from YAML in the target tree.
//!
//! The settings file lives at `.github/template-sync-settings.yml` under
//! the target root. A missing file means defaults; a malformed filter
//! record is skipped with a warning rather than failing the run.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Location of the settings file relative to the target root.
pub const SETTINGS_PATH: &str = ".github/template-sync-settings.yml";

/// Parsed settings file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Extra ignore patterns, merged with the built-in defaults.
    #[serde(default)]
    pub ignore_list: Vec<String>,
    /// Raw filter records; validated into rules by the filter layer.
    #[serde(default)]
    pub filters: Vec<RawFilter>,
}

/// One filter record as written in YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFilter {
    /// File or directory the filter applies to, relative to the roots.
    pub filepath: Option<String>,
    /// Pattern: a literal, or a regex when wrapped in `/.../`.
    pub filter: Option<String>,
    /// Literal must equal the whole trimmed edit, not just occur in it.
    #[serde(default)]
    pub strict: bool,
    /// How many occurrences to suppress across the whole run.
    pub count: Option<usize>,
}

impl Settings {
    /// Loads settings from `target_root`, falling back to defaults when the
    /// file does not exist.
    pub fn load(target_root: &Path) -> Result<Self> {
        let path = target_root.join(SETTINGS_PATH);
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let text = tsync_fs::read_text(&path)?;
        Self::parse(&text, &path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|source| Error::Settings {
            path: path.to_path_buf(),
            source,
        })
    }
}
