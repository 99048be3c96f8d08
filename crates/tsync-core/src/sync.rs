//! Per-file synchronization pipeline and run reporting.
//!
//! For every template file the engine either copies it (absent from the
//! target), leaves it (identical or fully suppressed), or merges it:
//! line-encode both versions, diff the token strings, decode, semantic
//! cleanup, filter suppression, then patch the target fuzzily. A file is
//! only written when every hunk applies; partial merges are reported as
//! failures and the target is left untouched.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use tsync_diff::chars::{to_chars, to_string};
use tsync_diff::{DiffMatchPatch, Op, chars_to_lines, cleanup_semantic, lines_to_chars};

use crate::error::Result;
use crate::filter::{FilterRule, apply_filters, build_rules};
use crate::settings::Settings;
use crate::walk::TemplateWalker;

/// Run-level switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute and report everything, write nothing.
    pub dry_run: bool,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Target rewritten with the merged content.
    Patched,
    /// Template file copied verbatim; it did not exist in the target.
    Copied,
    /// Nothing to do: identical, or every edit was suppressed.
    Unchanged,
    /// Merge failed; the target was not modified.
    Failed { reason: String },
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patched => write!(f, "patched"),
            Self::Copied => write!(f, "copied"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Per-file outcome with its relative path.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Aggregated outcomes for a whole run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub files: Vec<FileReport>,
}

impl SyncReport {
    pub fn success(&self) -> bool {
        !self
            .files
            .iter()
            .any(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
    }

    pub fn changed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Patched | FileOutcome::Copied))
            .count()
    }
}

/// Synchronizes a template tree into a target tree.
#[derive(Debug)]
pub struct SyncEngine {
    dmp: DiffMatchPatch,
    rules: Vec<FilterRule>,
    walker: TemplateWalker,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(settings: &Settings, options: SyncOptions) -> Result<Self> {
        Ok(Self {
            dmp: DiffMatchPatch::default(),
            rules: build_rules(&settings.filters),
            walker: TemplateWalker::new(&settings.ignore_list)?,
            options,
        })
    }

    /// Runs the sync. Per-file problems are recorded in the report; only
    /// setup-level failures (unreadable tree) abort the run.
    pub fn sync(&mut self, template_root: &Path, target_root: &Path) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        for rel in self.walker.files(template_root)? {
            let outcome = self.sync_file(&rel, template_root, target_root);
            match &outcome {
                FileOutcome::Failed { reason } => {
                    warn!(path = %rel.display(), reason, "sync failed");
                }
                outcome => debug!(path = %rel.display(), %outcome, "synced"),
            }
            report.files.push(FileReport { path: rel, outcome });
        }
        info!(
            files = report.files.len(),
            changed = report.changed(),
            success = report.success(),
            dry_run = self.options.dry_run,
            "sync complete"
        );
        Ok(report)
    }

    fn sync_file(&mut self, rel: &Path, template_root: &Path, target_root: &Path) -> FileOutcome {
        let template_path = template_root.join(rel);
        let target_path = target_root.join(rel);

        if !target_path.exists() {
            // New file: adopt the template version outright.
            if self.options.dry_run {
                return FileOutcome::Copied;
            }
            return match tsync_fs::copy_file(&template_path, &target_path) {
                Ok(()) => FileOutcome::Copied,
                Err(e) => FileOutcome::Failed {
                    reason: e.to_string(),
                },
            };
        }

        let template_text = match tsync_fs::read_text(&template_path) {
            Ok(text) => text,
            Err(e) => {
                return FileOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };
        let target_text = match tsync_fs::read_text(&target_path) {
            Ok(text) => text,
            Err(e) => {
                return FileOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };
        if template_text == target_text {
            return FileOutcome::Unchanged;
        }

        // Line-first diff: token strings keep the diff line-shaped, which
        // is both faster and what the filters expect.
        let (chars1, chars2, line_array) = lines_to_chars(&target_text, &template_text);
        let mut diffs = self.dmp.diff_chars(&chars1, &chars2, false);
        chars_to_lines(&mut diffs, &line_array);
        cleanup_semantic(&mut diffs);
        apply_filters(&mut diffs, &mut self.rules, rel);

        if diffs.iter().all(|edit| edit.op == Op::Equal) {
            // Every change was suppressed.
            return FileOutcome::Unchanged;
        }

        let target_chars = to_chars(&target_text);
        let patches = self.dmp.patch_make(&target_chars, &diffs);
        if patches.is_empty() {
            return FileOutcome::Unchanged;
        }
        let (patched, results) = match self.dmp.patch_apply(&patches, &target_chars) {
            Ok(applied) => applied,
            Err(e) => {
                return FileOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };
        let failed = results.iter().filter(|&&ok| !ok).count();
        if failed > 0 {
            return FileOutcome::Failed {
                reason: format!("{failed} of {} hunks did not apply", results.len()),
            };
        }

        if self.options.dry_run {
            return FileOutcome::Patched;
        }
        match tsync_fs::write_atomic(&target_path, &to_string(&patched)) {
            Ok(()) => FileOutcome::Patched,
            Err(e) => FileOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}
