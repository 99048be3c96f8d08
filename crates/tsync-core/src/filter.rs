//! Edit suppression rules.
//!
//! A filter keeps a target-local line alive against the template: when an
//! incoming Insert edit matches a rule, the insert is dropped, and if the
//! insert was one half of a replacement pair the paired Delete is demoted
//! to an Equal, so the target's own line survives the patch. Each rule
//! carries a run-wide budget of suppressions.
//!
//! Filters match inserted content only: deletes describe the target's
//! current text, and suppressing those would drop target content the rule
//! was meant to protect.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};
use tsync_diff::{Edit, EditScript, Op};

use crate::settings::RawFilter;

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Regex(Regex),
}

/// A validated suppression rule with its remaining budget.
#[derive(Debug, Clone)]
pub struct FilterRule {
    file_path: PathBuf,
    matcher: Matcher,
    strict: bool,
    max_count: usize,
    count: usize,
}

impl FilterRule {
    /// Validates a raw settings record. Incomplete records and bad regexes
    /// are dropped with a warning.
    pub fn from_raw(raw: &RawFilter) -> Option<Self> {
        let (Some(filepath), Some(filter)) = (&raw.filepath, &raw.filter) else {
            warn!(?raw, "skipping filter record missing filepath or filter");
            return None;
        };
        // Edits are matched trimmed; the pattern gets the same treatment.
        let filter = filter.trim();
        let matcher = if filter.len() > 2 && filter.starts_with('/') && filter.ends_with('/') {
            match Regex::new(&filter[1..filter.len() - 1]) {
                Ok(re) => Matcher::Regex(re),
                Err(error) => {
                    warn!(filter, %error, "skipping filter with invalid regex");
                    return None;
                }
            }
        } else {
            Matcher::Literal(filter.to_string())
        };
        Some(Self {
            file_path: PathBuf::from(filepath),
            matcher,
            strict: raw.strict,
            max_count: raw.count.unwrap_or(1),
            count: 0,
        })
    }

    /// Whether this rule covers `rel_path` (exact file or directory prefix).
    pub fn applies_to(&self, rel_path: &Path) -> bool {
        rel_path.starts_with(&self.file_path)
    }

    fn exhausted(&self) -> bool {
        self.count >= self.max_count
    }

    fn matches(&self, trimmed: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(re) => re.is_match(trimmed),
            Matcher::Literal(lit) if self.strict => trimmed == lit,
            Matcher::Literal(lit) => trimmed.contains(lit.as_str()),
        }
    }
}

/// Builds rules from settings records, dropping invalid ones.
pub fn build_rules(raw: &[RawFilter]) -> Vec<FilterRule> {
    raw.iter().filter_map(FilterRule::from_raw).collect()
}

/// Applies every rule covering `rel_path` to the script, in place.
///
/// The script is first re-granularized: replacement blocks are split into
/// per-line delete/insert pairs so a rule suppresses one line, not a whole
/// block. Suppression nulls the matching Insert, demotes a bind-flagged
/// paired Delete to Equal, and compacts; no further cleanup runs, so the
/// surviving structure reaches the patch builder as-is.
pub fn apply_filters(diffs: &mut EditScript, rules: &mut [FilterRule], rel_path: &Path) {
    let applicable: Vec<usize> = rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.applies_to(rel_path))
        .map(|(i, _)| i)
        .collect();
    if applicable.is_empty() {
        return;
    }

    let mut aligned = align_replacements(diffs);
    let mut removed = vec![false; aligned.len()];
    for i in 0..aligned.len() {
        if aligned[i].op != Op::Insert {
            continue;
        }
        let text = aligned[i].text_string();
        let trimmed = text.trim();
        for &ri in &applicable {
            let rule = &mut rules[ri];
            if rule.exhausted() || !rule.matches(trimmed) {
                continue;
            }
            rule.count += 1;
            removed[i] = true;
            if i > 0
                && !removed[i - 1]
                && aligned[i - 1].op == Op::Delete
                && aligned[i - 1].bind
            {
                // The suppressed insert replaced this delete's text; keep
                // the target's line instead.
                aligned[i - 1].op = Op::Equal;
                aligned[i - 1].bind = false;
            }
            debug!(
                path = %rel_path.display(),
                line = trimmed,
                used = rule.count,
                budget = rule.max_count,
                "suppressed edit"
            );
            break;
        }
    }

    *diffs = aligned
        .into_iter()
        .zip(removed)
        .filter(|&(_, gone)| !gone)
        .map(|(edit, _)| edit)
        .collect();
}

/// Splits adjacent delete/insert blocks into per-line bind-linked pairs,
/// and standalone inserts into per-line inserts. Images are unchanged;
/// only granularity differs.
fn align_replacements(diffs: &EditScript) -> EditScript {
    let mut out = Vec::new();
    let mut i = 0;
    while i < diffs.len() {
        if diffs[i].op == Op::Delete && i + 1 < diffs.len() && diffs[i + 1].op == Op::Insert {
            let del_lines = split_lines(&diffs[i].text);
            let ins_lines = split_lines(&diffs[i + 1].text);
            let pairs = del_lines.len().min(ins_lines.len());
            for k in 0..pairs {
                out.push(Edit::bound(Op::Delete, del_lines[k].clone()));
                out.push(Edit::bound(Op::Insert, ins_lines[k].clone()));
            }
            for line in del_lines.into_iter().skip(pairs) {
                out.push(Edit::new(Op::Delete, line));
            }
            for line in ins_lines.into_iter().skip(pairs) {
                out.push(Edit::new(Op::Insert, line));
            }
            i += 2;
        } else if diffs[i].op == Op::Insert {
            for line in split_lines(&diffs[i].text) {
                out.push(Edit::new(Op::Insert, line));
            }
            i += 1;
        } else {
            out.push(diffs[i].clone());
            i += 1;
        }
    }
    out
}

/// Line split keeping terminators; a trailing fragment without a newline is
/// its own line.
fn split_lines(text: &[char]) -> Vec<Vec<char>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &ch) in text.iter().enumerate() {
        if ch == '\n' {
            lines.push(text[start..=i].to_vec());
            start = i + 1;
        }
    }
    if start < text.len() {
        lines.push(text[start..].to_vec());
    }
    lines
}
