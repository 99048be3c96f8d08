//! Edit model and the core diff engine.
//!
//! `diff_main` produces a minimal edit script between two texts using the
//! Myers O(ND) bisect, fronted by the usual shortcuts: equality, common
//! prefix/suffix trimming, containment, single-character, half-match, and
//! line-mode chunking for large inputs. A configurable deadline bounds the
//! bisect; on expiry the remaining region degrades to a coarse
//! delete-plus-insert rather than an error.

use std::time::{Duration, Instant};

use crate::chars::{index_of, to_chars, to_string};
use crate::cleanup::{cleanup_merge, cleanup_semantic};
use crate::lines::{chars_to_lines, lines_to_chars};
use crate::scan::{common_prefix, common_suffix};

/// Edit operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Delete,
    Insert,
    Equal,
}

/// One edit: an operation applied to a run of text.
///
/// `bind` is transient cleanup metadata: it marks an edit that was merged
/// from several raw edits and has not been reconciled with its neighbor.
/// The filter layer uses it to demote a suppressed replacement's
/// counterpart; it carries no meaning once a script is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub op: Op,
    pub text: Vec<char>,
    pub bind: bool,
}

impl Edit {
    pub fn new(op: Op, text: Vec<char>) -> Self {
        Self {
            op,
            text,
            bind: false,
        }
    }

    /// An edit carrying the merged-and-unreconciled marker.
    pub fn bound(op: Op, text: Vec<char>) -> Self {
        Self {
            op,
            text,
            bind: true,
        }
    }

    pub fn delete(text: &[char]) -> Self {
        Self::new(Op::Delete, text.to_vec())
    }

    pub fn insert(text: &[char]) -> Self {
        Self::new(Op::Insert, text.to_vec())
    }

    pub fn equal(text: &[char]) -> Self {
        Self::new(Op::Equal, text.to_vec())
    }

    pub fn text_string(&self) -> String {
        to_string(&self.text)
    }
}

/// An ordered sequence of edits. Concatenating Equal and Delete texts in
/// order reproduces the pre-image; Equal and Insert the post-image.
pub type EditScript = Vec<Edit>;

/// Pre-image of a script (source text the script transforms).
pub fn pre_image(diffs: &EditScript) -> Vec<char> {
    let mut text = Vec::new();
    for edit in diffs {
        if edit.op != Op::Insert {
            text.extend_from_slice(&edit.text);
        }
    }
    text
}

/// Post-image of a script (text the script produces).
pub fn post_image(diffs: &EditScript) -> Vec<char> {
    let mut text = Vec::new();
    for edit in diffs {
        if edit.op != Op::Delete {
            text.extend_from_slice(&edit.text);
        }
    }
    text
}

/// Translates a pre-image offset into the equivalent post-image offset.
///
/// An offset inside a deleted run maps to the position the run collapsed to.
pub fn x_index(diffs: &EditScript, loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut hit: Option<&Edit> = None;
    for edit in diffs {
        if edit.op != Op::Insert {
            chars1 += edit.text.len();
        }
        if edit.op != Op::Delete {
            chars2 += edit.text.len();
        }
        if chars1 > loc {
            hit = Some(edit);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }
    if let Some(edit) = hit {
        if edit.op == Op::Delete {
            return last_chars2;
        }
    }
    last_chars2 + (loc - last_chars1)
}

/// Levenshtein distance implied by a script: the larger leg of each
/// delete/insert block, summed across blocks.
pub fn levenshtein(diffs: &EditScript) -> usize {
    let mut distance = 0;
    let mut insertions = 0;
    let mut deletions = 0;
    for edit in diffs {
        match edit.op {
            Op::Insert => insertions += edit.text.len(),
            Op::Delete => deletions += edit.text.len(),
            Op::Equal => {
                distance += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }
    distance + insertions.max(deletions)
}

/// Width of the Bitap bit vector; patterns longer than this cannot be
/// fuzzy-matched and force exact or chunked matching upstream.
pub const MATCH_MAX_BITS: usize = 32;

/// Diff / match / patch engine with its tuning knobs.
#[derive(Debug, Clone)]
pub struct DiffMatchPatch {
    /// Seconds to spend on a diff before degrading; 0 means unlimited
    /// (which also disables the speculative half-match heuristic).
    pub diff_timeout: f32,
    /// Bitap acceptance threshold; 0.0 demands exactness, 1.0 matches
    /// anything.
    pub match_threshold: f32,
    /// Distance penalty scale: how far from the expected location a match
    /// may stray before the threshold consumes it. 0 demands exact
    /// locations.
    pub match_distance: usize,
    /// When a big hunk's pre-image needs a full re-diff, reject the hunk if
    /// the implied rewrite exceeds this fraction of its length.
    pub patch_delete_threshold: f32,
    /// Context characters kept around each hunk.
    pub patch_margin: usize,
}

impl Default for DiffMatchPatch {
    fn default() -> Self {
        Self {
            diff_timeout: 1.0,
            match_threshold: 0.5,
            match_distance: 1000,
            patch_delete_threshold: 0.5,
            patch_margin: 4,
        }
    }
}

impl DiffMatchPatch {
    /// Diffs two strings, producing a merged edit script.
    pub fn diff_main(&self, text1: &str, text2: &str) -> EditScript {
        self.diff_chars(&to_chars(text1), &to_chars(text2), true)
    }

    /// Diffs two codepoint buffers. `check_lines` enables the line-mode
    /// chunking pass for large inputs; callers that pre-encode lines
    /// themselves pass `false`.
    pub fn diff_chars(&self, text1: &[char], text2: &[char], check_lines: bool) -> EditScript {
        let deadline = if self.diff_timeout <= 0.0 {
            None
        } else {
            Some(Instant::now() + Duration::from_secs_f32(self.diff_timeout))
        };
        self.diff_inner(text1, text2, check_lines, deadline)
    }

    fn diff_inner(
        &self,
        text1: &[char],
        text2: &[char],
        check_lines: bool,
        deadline: Option<Instant>,
    ) -> EditScript {
        if text1 == text2 {
            if text1.is_empty() {
                return Vec::new();
            }
            return vec![Edit::equal(text1)];
        }

        let prefix_len = common_prefix(text1, text2);
        let common_prefix_text = &text1[..prefix_len];
        let text1 = &text1[prefix_len..];
        let text2 = &text2[prefix_len..];

        let suffix_len = common_suffix(text1, text2);
        let common_suffix_text = &text1[text1.len() - suffix_len..];
        let text1 = &text1[..text1.len() - suffix_len];
        let text2 = &text2[..text2.len() - suffix_len];

        let mut diffs = self.diff_compute(text1, text2, check_lines, deadline);

        if !common_prefix_text.is_empty() {
            diffs.insert(0, Edit::equal(common_prefix_text));
        }
        if !common_suffix_text.is_empty() {
            diffs.push(Edit::equal(common_suffix_text));
        }
        cleanup_merge(&mut diffs);
        diffs
    }

    /// Diffs two non-equal texts that share no common prefix or suffix.
    fn diff_compute(
        &self,
        text1: &[char],
        text2: &[char],
        check_lines: bool,
        deadline: Option<Instant>,
    ) -> EditScript {
        if text1.is_empty() {
            return vec![Edit::insert(text2)];
        }
        if text2.is_empty() {
            return vec![Edit::delete(text1)];
        }

        let (longtext, shorttext) = if text1.len() > text2.len() {
            (text1, text2)
        } else {
            (text2, text1)
        };
        if let Some(i) = index_of(longtext, shorttext, 0) {
            // Shorter text sits inside the longer text.
            let op = if text1.len() > text2.len() {
                Op::Delete
            } else {
                Op::Insert
            };
            return vec![
                Edit::new(op, longtext[..i].to_vec()),
                Edit::equal(shorttext),
                Edit::new(op, longtext[i + shorttext.len()..].to_vec()),
            ];
        }
        if shorttext.len() == 1 {
            // Single char on one side: after the earlier equality check it
            // cannot match anything on the other side.
            return vec![Edit::delete(text1), Edit::insert(text2)];
        }

        if let Some(hm) = self.half_match(text1, text2) {
            let mut diffs = self.diff_inner(&hm.prefix1, &hm.prefix2, check_lines, deadline);
            diffs.push(Edit::new(Op::Equal, hm.common));
            let mut diffs_b = self.diff_inner(&hm.suffix1, &hm.suffix2, check_lines, deadline);
            diffs.append(&mut diffs_b);
            return diffs;
        }

        if check_lines && text1.len() > 100 && text2.len() > 100 {
            return self.line_mode(text1, text2, deadline);
        }

        self.bisect(text1, text2, deadline)
    }

    /// Line-mode: hash whole lines to single chars, diff the token strings,
    /// then re-diff each changed block character by character.
    fn line_mode(&self, text1: &[char], text2: &[char], deadline: Option<Instant>) -> EditScript {
        let s1 = to_string(text1);
        let s2 = to_string(text2);
        let (chars1, chars2, line_array) = lines_to_chars(&s1, &s2);
        let mut diffs = self.diff_inner(&chars1, &chars2, false, deadline);
        chars_to_lines(&mut diffs, &line_array);
        cleanup_semantic(&mut diffs);

        // Re-diff the delete/insert blocks at char granularity.
        diffs.push(Edit::equal(&[]));
        let mut pointer = 0;
        let mut count_delete = 0;
        let mut count_insert = 0;
        let mut text_delete: Vec<char> = Vec::new();
        let mut text_insert: Vec<char> = Vec::new();
        while pointer < diffs.len() {
            match diffs[pointer].op {
                Op::Insert => {
                    count_insert += 1;
                    text_insert.extend_from_slice(&diffs[pointer].text);
                }
                Op::Delete => {
                    count_delete += 1;
                    text_delete.extend_from_slice(&diffs[pointer].text);
                }
                Op::Equal => {
                    if count_delete >= 1 && count_insert >= 1 {
                        let sub = self.diff_inner(&text_delete, &text_insert, false, deadline);
                        let start = pointer - count_delete - count_insert;
                        diffs.splice(start..pointer, sub.iter().cloned());
                        pointer = start + sub.len();
                    }
                    count_insert = 0;
                    count_delete = 0;
                    text_delete.clear();
                    text_insert.clear();
                }
            }
            pointer += 1;
        }
        diffs.pop();
        diffs
    }

    /// Speculative split: if the two texts share a substring at least half
    /// the length of the longer text, split around it. Only used when a
    /// timeout is set, since the result is not guaranteed minimal.
    fn half_match(&self, text1: &[char], text2: &[char]) -> Option<HalfMatch> {
        if self.diff_timeout <= 0.0 {
            return None;
        }
        let (longtext, shorttext) = if text1.len() > text2.len() {
            (text1, text2)
        } else {
            (text2, text1)
        };
        if longtext.len() < 4 || shorttext.len() * 2 < longtext.len() {
            return None;
        }

        // Check second quarter and midpoint seeds, keep the better hit.
        let hm1 = half_match_i(longtext, shorttext, longtext.len().div_ceil(4));
        let hm2 = half_match_i(longtext, shorttext, longtext.len().div_ceil(2));
        let hm = match (hm1, hm2) {
            (None, None) => return None,
            (Some(hm1), None) => hm1,
            (None, Some(hm2)) => hm2,
            (Some(hm1), Some(hm2)) => {
                if hm1.common.len() > hm2.common.len() {
                    hm1
                } else {
                    hm2
                }
            }
        };

        if text1.len() > text2.len() {
            Some(hm)
        } else {
            Some(HalfMatch {
                prefix1: hm.prefix2,
                suffix1: hm.suffix2,
                prefix2: hm.prefix1,
                suffix2: hm.suffix1,
                common: hm.common,
            })
        }
    }

    /// Myers bisect: walk the forward and reverse edit-distance fronts until
    /// they overlap, then split and recurse. On deadline expiry the region
    /// degrades to delete-all plus insert-all.
    fn bisect(&self, text1: &[char], text2: &[char], deadline: Option<Instant>) -> EditScript {
        let text1_length = text1.len() as isize;
        let text2_length = text2.len() as isize;
        let max_d = (text1_length + text2_length + 1) / 2;
        let v_offset = max_d;
        let v_length = 2 * max_d;
        let mut v1 = vec![-1isize; (v_length + 2) as usize];
        let mut v2 = vec![-1isize; (v_length + 2) as usize];
        v1[(v_offset + 1) as usize] = 0;
        v2[(v_offset + 1) as usize] = 0;
        let delta = text1_length - text2_length;
        // With an odd delta the fronts can only overlap while stepping the
        // forward path; with an even delta only on the reverse path.
        let front = delta % 2 != 0;
        let mut k1start = 0isize;
        let mut k1end = 0isize;
        let mut k2start = 0isize;
        let mut k2end = 0isize;
        for d in 0..max_d {
            if let Some(deadline) = deadline {
                if Instant::now() > deadline {
                    break;
                }
            }
            let mut k1 = -d + k1start;
            while k1 <= d - k1end {
                let k1_offset = (v_offset + k1) as usize;
                let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                    v1[k1_offset + 1]
                } else {
                    v1[k1_offset - 1] + 1
                };
                let mut y1 = x1 - k1;
                while x1 < text1_length
                    && y1 < text2_length
                    && text1[x1 as usize] == text2[y1 as usize]
                {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_offset] = x1;
                if x1 > text1_length {
                    // Ran off the right of the graph.
                    k1end += 2;
                } else if y1 > text2_length {
                    // Ran off the bottom of the graph.
                    k1start += 2;
                } else if front {
                    let k2_offset = v_offset + delta - k1;
                    if k2_offset >= 0 && k2_offset < v_length && v2[k2_offset as usize] != -1 {
                        // Mirror x2 onto the top-left coordinate system.
                        let x2 = text1_length - v2[k2_offset as usize];
                        if x1 >= x2 {
                            return self.bisect_split(text1, text2, x1, y1, deadline);
                        }
                    }
                }
                k1 += 2;
            }

            let mut k2 = -d + k2start;
            while k2 <= d - k2end {
                let k2_offset = (v_offset + k2) as usize;
                let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                    v2[k2_offset + 1]
                } else {
                    v2[k2_offset - 1] + 1
                };
                let mut y2 = x2 - k2;
                while x2 < text1_length
                    && y2 < text2_length
                    && text1[(text1_length - x2 - 1) as usize]
                        == text2[(text2_length - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_offset] = x2;
                if x2 > text1_length {
                    k2end += 2;
                } else if y2 > text2_length {
                    k2start += 2;
                } else if !front {
                    let k1_offset = v_offset + delta - k2;
                    if k1_offset >= 0 && k1_offset < v_length && v1[k1_offset as usize] != -1 {
                        let x1 = v1[k1_offset as usize];
                        let y1 = v_offset + x1 - k1_offset;
                        let x2 = text1_length - x2;
                        if x1 >= x2 {
                            return self.bisect_split(text1, text2, x1, y1, deadline);
                        }
                    }
                }
                k2 += 2;
            }
        }
        // No commonality at all, or the deadline fired.
        vec![Edit::delete(text1), Edit::insert(text2)]
    }

    fn bisect_split(
        &self,
        text1: &[char],
        text2: &[char],
        x: isize,
        y: isize,
        deadline: Option<Instant>,
    ) -> EditScript {
        let (x, y) = (x as usize, y as usize);
        let mut diffs = self.diff_inner(&text1[..x], &text2[..y], false, deadline);
        let mut diffs_b = self.diff_inner(&text1[x..], &text2[y..], false, deadline);
        diffs.append(&mut diffs_b);
        diffs
    }
}

struct HalfMatch {
    prefix1: Vec<char>,
    suffix1: Vec<char>,
    prefix2: Vec<char>,
    suffix2: Vec<char>,
    common: Vec<char>,
}

/// Seeds a half-match search with the quarter-length substring of
/// `longtext` starting at `i`.
fn half_match_i(longtext: &[char], shorttext: &[char], i: usize) -> Option<HalfMatch> {
    let seed = &longtext[i..i + longtext.len() / 4];
    let mut best_common: Vec<char> = Vec::new();
    let mut best_longtext_a: Vec<char> = Vec::new();
    let mut best_longtext_b: Vec<char> = Vec::new();
    let mut best_shorttext_a: Vec<char> = Vec::new();
    let mut best_shorttext_b: Vec<char> = Vec::new();
    let mut j = index_of(shorttext, seed, 0);
    while let Some(j_pos) = j {
        let prefix_length = common_prefix(&longtext[i..], &shorttext[j_pos..]);
        let suffix_length = common_suffix(&longtext[..i], &shorttext[..j_pos]);
        if best_common.len() < suffix_length + prefix_length {
            best_common = shorttext[j_pos - suffix_length..j_pos + prefix_length].to_vec();
            best_longtext_a = longtext[..i - suffix_length].to_vec();
            best_longtext_b = longtext[i + prefix_length..].to_vec();
            best_shorttext_a = shorttext[..j_pos - suffix_length].to_vec();
            best_shorttext_b = shorttext[j_pos + prefix_length..].to_vec();
        }
        j = index_of(shorttext, seed, j_pos + 1);
    }
    if best_common.len() * 2 >= longtext.len() {
        Some(HalfMatch {
            prefix1: best_longtext_a,
            suffix1: best_longtext_b,
            prefix2: best_shorttext_a,
            suffix2: best_shorttext_b,
            common: best_common,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::to_chars;
    use pretty_assertions::assert_eq;

    fn c(s: &str) -> Vec<char> {
        to_chars(s)
    }

    fn script(parts: &[(Op, &str)]) -> EditScript {
        parts
            .iter()
            .map(|&(op, text)| Edit::new(op, to_chars(text)))
            .collect()
    }

    fn ops(diffs: &EditScript) -> Vec<(Op, String)> {
        diffs.iter().map(|e| (e.op, e.text_string())).collect()
    }

    #[test]
    fn test_diff_identity_is_single_equal() {
        let dmp = DiffMatchPatch::default();
        assert_eq!(
            ops(&dmp.diff_main("abc", "abc")),
            vec![(Op::Equal, "abc".to_string())]
        );
        assert_eq!(dmp.diff_main("", ""), Vec::new());
    }

    #[test]
    fn test_diff_pure_insert_and_delete() {
        let dmp = DiffMatchPatch::default();
        assert_eq!(
            ops(&dmp.diff_main("abc", "abxyzc")),
            vec![
                (Op::Equal, "ab".to_string()),
                (Op::Insert, "xyz".to_string()),
                (Op::Equal, "c".to_string()),
            ]
        );
        assert_eq!(
            ops(&dmp.diff_main("a123bc", "abc")),
            vec![
                (Op::Equal, "a".to_string()),
                (Op::Delete, "123".to_string()),
                (Op::Equal, "bc".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_disjoint_texts_degrade_to_replace() {
        let dmp = DiffMatchPatch::default();
        assert_eq!(
            ops(&dmp.diff_main("abc", "xyz")),
            vec![
                (Op::Delete, "abc".to_string()),
                (Op::Insert, "xyz".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_round_trips_images() {
        let dmp = DiffMatchPatch::default();
        let a = "The quick brown fox jumps over the lazy dog.";
        let b = "That quick brown fox jumped over a lazy dog.";
        let diffs = dmp.diff_main(a, b);
        assert_eq!(to_string(&pre_image(&diffs)), a);
        assert_eq!(to_string(&post_image(&diffs)), b);
    }

    #[test]
    fn test_diff_handles_supplementary_plane() {
        let dmp = DiffMatchPatch::default();
        let diffs = dmp.diff_main("a\u{1F600}b", "a\u{1F601}b");
        assert_eq!(to_string(&pre_image(&diffs)), "a\u{1F600}b");
        assert_eq!(to_string(&post_image(&diffs)), "a\u{1F601}b");
    }

    #[test]
    fn test_bisect_finds_the_split() {
        let dmp = DiffMatchPatch::default();
        let diffs = dmp.bisect(&c("cat"), &c("map"), None);
        assert_eq!(
            ops(&diffs),
            vec![
                (Op::Delete, "c".to_string()),
                (Op::Insert, "m".to_string()),
                (Op::Equal, "a".to_string()),
                (Op::Delete, "t".to_string()),
                (Op::Insert, "p".to_string()),
            ]
        );
    }

    #[test]
    fn test_bisect_expired_deadline_degrades() {
        let dmp = DiffMatchPatch::default();
        let past = Some(Instant::now() - Duration::from_secs(1));
        let diffs = dmp.bisect(&c("cat"), &c("map"), past);
        assert_eq!(
            ops(&diffs),
            vec![
                (Op::Delete, "cat".to_string()),
                (Op::Insert, "map".to_string()),
            ]
        );
    }

    #[test]
    fn test_half_match_requires_timeout() {
        let mut dmp = DiffMatchPatch::default();
        let t1 = c("1234567890");
        let t2 = c("a345678z");
        assert!(dmp.half_match(&t1, &t2).is_some());
        dmp.diff_timeout = 0.0;
        assert!(dmp.half_match(&t1, &t2).is_none());
    }

    #[test]
    fn test_half_match_splits_around_common_middle() {
        let dmp = DiffMatchPatch::default();
        let hm = dmp
            .half_match(&c("1234567890"), &c("a345678z"))
            .unwrap_or_else(|| panic!("expected a half match"));
        assert_eq!(to_string(&hm.prefix1), "12");
        assert_eq!(to_string(&hm.suffix1), "90");
        assert_eq!(to_string(&hm.prefix2), "a");
        assert_eq!(to_string(&hm.suffix2), "z");
        assert_eq!(to_string(&hm.common), "345678");
    }

    #[test]
    fn test_x_index_translation() {
        // Deletion shifts the post-image left.
        let diffs = script(&[(Op::Delete, "a"), (Op::Insert, "1234"), (Op::Equal, "xyz")]);
        assert_eq!(x_index(&diffs, 2), 5);
        // An offset inside a deleted run lands at the collapse point.
        let diffs = script(&[(Op::Equal, "a"), (Op::Delete, "1234"), (Op::Equal, "xyz")]);
        assert_eq!(x_index(&diffs, 3), 1);
    }

    #[test]
    fn test_levenshtein() {
        let trailing = script(&[(Op::Delete, "abc"), (Op::Insert, "1234"), (Op::Equal, "xyz")]);
        assert_eq!(levenshtein(&trailing), 4);
        let leading = script(&[(Op::Equal, "xyz"), (Op::Delete, "abc"), (Op::Insert, "1234")]);
        assert_eq!(levenshtein(&leading), 4);
        let middle = script(&[(Op::Delete, "abc"), (Op::Equal, "xyz"), (Op::Insert, "1234")]);
        assert_eq!(levenshtein(&middle), 7);
    }

    #[test]
    fn test_line_mode_matches_char_mode() {
        let dmp = DiffMatchPatch::default();
        let a = "1234567890\n".repeat(13);
        let b = "abcdefghij\n".repeat(13);
        let line = dmp.diff_chars(&to_chars(&a), &to_chars(&b), true);
        let char_only = dmp.diff_chars(&to_chars(&a), &to_chars(&b), false);
        assert_eq!(to_string(&post_image(&line)), to_string(&post_image(&char_only)));
        assert_eq!(to_string(&pre_image(&line)), to_string(&pre_image(&char_only)));
    }
}
