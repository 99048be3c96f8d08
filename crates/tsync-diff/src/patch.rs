//! Hunk construction and text rendering.
//!
//! `patch_make` cuts an edit script into context-carrying hunks: small
//! equalities are absorbed into the current hunk, large ones close it.
//! `add_context` then grows each hunk's surround until its pre-image
//! pattern is unique in the source text, bounded so the pattern still fits
//! the Bitap bit vector at apply time.

use std::fmt;

use crate::chars::{index_of, last_index_of};
use crate::diff::{DiffMatchPatch, Edit, EditScript, MATCH_MAX_BITS, Op};

/// One hunk: an edit script fragment plus its coordinates in the pre- and
/// post-image.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    pub diffs: EditScript,
    pub start1: usize,
    pub start2: usize,
    pub length1: usize,
    pub length2: usize,
}

impl DiffMatchPatch {
    /// Cuts a full-text edit script into hunks against `text1`, the
    /// script's pre-image.
    pub fn patch_make(&self, text1: &[char], diffs: &EditScript) -> Vec<Patch> {
        if diffs.is_empty() {
            return Vec::new();
        }
        let mut patches = Vec::new();
        let mut patch = Patch::default();
        let mut char_count1 = 0; // cursor in the pre-image
        let mut char_count2 = 0; // cursor in the post-image
        // Text representations as the script is replayed; prepatch is the
        // state recent hunks were contextualized against.
        let mut prepatch_text: Vec<char> = text1.to_vec();
        let mut postpatch_text: Vec<char> = text1.to_vec();
        for (x, diff) in diffs.iter().enumerate() {
            if patch.diffs.is_empty() && diff.op != Op::Equal {
                // New hunk begins here.
                patch.start1 = char_count1;
                patch.start2 = char_count2;
            }
            match diff.op {
                Op::Insert => {
                    patch.length2 += diff.text.len();
                    patch.diffs.push(diff.clone());
                    postpatch_text.splice(char_count2..char_count2, diff.text.iter().copied());
                }
                Op::Delete => {
                    patch.length1 += diff.text.len();
                    patch.diffs.push(diff.clone());
                    postpatch_text.drain(char_count2..char_count2 + diff.text.len());
                }
                Op::Equal => {
                    if diff.text.len() <= 2 * self.patch_margin
                        && !patch.diffs.is_empty()
                        && x + 1 != diffs.len()
                    {
                        // Small equality inside a hunk: absorb as context.
                        patch.length1 += diff.text.len();
                        patch.length2 += diff.text.len();
                        patch.diffs.push(diff.clone());
                    } else if diff.text.len() >= 2 * self.patch_margin && !patch.diffs.is_empty() {
                        // Large equality: close the hunk.
                        self.add_context(&mut patch, &prepatch_text);
                        patches.push(std::mem::take(&mut patch));
                        // Rebase context onto the text as patched so far, so
                        // later hunks see earlier insertions.
                        prepatch_text = postpatch_text.clone();
                        char_count1 = char_count2;
                    }
                }
            }
            if diff.op != Op::Insert {
                char_count1 += diff.text.len();
            }
            if diff.op != Op::Delete {
                char_count2 += diff.text.len();
            }
        }
        if !patch.diffs.is_empty() {
            self.add_context(&mut patch, &prepatch_text);
            patches.push(patch);
        }
        patches
    }

    /// Pads a hunk with context from `text` until its pre-image pattern is
    /// unique, then a final margin on top.
    pub(crate) fn add_context(&self, patch: &mut Patch, text: &[char]) {
        if text.is_empty() {
            return;
        }
        let clamp = |start: usize, len: usize| -> &[char] {
            let end = (start + len).min(text.len());
            let start = start.min(end);
            &text[start..end]
        };
        let mut pattern = clamp(patch.start2, patch.length1);
        let mut padding = 0;
        // Grow until unique, while the eventual pattern still fits Bitap.
        while index_of(text, pattern, 0) != last_index_of(text, pattern, text.len())
            && pattern.len() < MATCH_MAX_BITS - 2 * self.patch_margin
        {
            padding += self.patch_margin;
            let start = patch.start2.saturating_sub(padding);
            pattern = clamp(start, patch.start2 - start + patch.length1 + padding);
        }
        // One extra margin of safety.
        padding += self.patch_margin;

        let prefix_start = patch.start2.saturating_sub(padding);
        let prefix = &text[prefix_start..patch.start2.min(text.len())];
        if !prefix.is_empty() {
            patch.diffs.insert(0, Edit::equal(prefix));
        }
        let suffix = clamp(patch.start2 + patch.length1, padding);
        if !suffix.is_empty() {
            patch.diffs.push(Edit::equal(suffix));
        }

        patch.start1 -= prefix.len();
        patch.start2 -= prefix.len();
        patch.length1 += prefix.len() + suffix.len();
        patch.length2 += prefix.len() + suffix.len();
    }
}

impl fmt::Display for Patch {
    /// Renders the hunk in unified-diff style with percent-escaped bodies.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coords1 = render_coords(self.start1, self.length1);
        let coords2 = render_coords(self.start2, self.length2);
        writeln!(f, "@@ -{coords1} +{coords2} @@")?;
        for diff in &self.diffs {
            let op = match diff.op {
                Op::Insert => '+',
                Op::Delete => '-',
                Op::Equal => ' ',
            };
            writeln!(f, "{}{}", op, encode_uri(&diff.text))?;
        }
        Ok(())
    }
}

// Header coordinates are one-based; a length of one is implied, a length
// of zero keeps its explicit ",0".
fn render_coords(start: usize, length: usize) -> String {
    match length {
        0 => format!("{},0", start + 1),
        1 => format!("{}", start + 1),
        n => format!("{},{}", start + 1, n),
    }
}

// encodeURI-compatible escaping, with the space kept literal for
// readability.
fn encode_uri(text: &[char]) -> String {
    let mut out = String::new();
    let mut buf = [0u8; 4];
    for &ch in text {
        if ch.is_ascii_alphanumeric() || ";,/?:@&=+$-_.!~*'()# ".contains(ch) {
            out.push(ch);
        } else {
            for byte in ch.encode_utf8(&mut buf).as_bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    out
}
