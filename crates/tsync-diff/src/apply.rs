//! Fuzzy patch application.
//!
//! Each hunk is located in the live text with `match_main`, drifting by the
//! accumulated delta of earlier hunks. If the found region differs from the
//! hunk's pre-image, the two are re-diffed and each edit is translated
//! through the re-diff before splicing. Hunks that cannot be located, or
//! whose re-diff implies rewriting more than the delete threshold allows,
//! are reported as failed without touching the text.

use crate::diff::{DiffMatchPatch, Edit, EditScript, MATCH_MAX_BITS, Op, levenshtein, post_image, pre_image, x_index};
use crate::error::Result;
use crate::patch::Patch;

impl DiffMatchPatch {
    /// Applies `patches` to `text`. Returns the patched text and a per-hunk
    /// success flag; the text reflects only the hunks that succeeded.
    pub fn patch_apply(
        &self,
        patches: &[Patch],
        text: &[char],
    ) -> Result<(Vec<char>, Vec<bool>)> {
        if patches.is_empty() {
            return Ok((text.to_vec(), Vec::new()));
        }

        // Work on copies; the padding and splitting below are destructive.
        let mut patches = patches.to_vec();
        let null_padding = self.add_padding(&mut patches);
        let mut text: Vec<char> = null_padding
            .iter()
            .chain(text.iter())
            .chain(null_padding.iter())
            .copied()
            .collect();
        self.split_max(&mut patches);

        // Cumulative offset between expected and actual hunk positions.
        let mut delta: isize = 0;
        let mut results = vec![false; patches.len()];
        for (x, patch) in patches.iter().enumerate() {
            let expected_loc = (patch.start2 as isize + delta).max(0) as usize;
            let text1 = pre_image(&patch.diffs);
            let mut end_loc: Option<usize> = None;
            let start_loc = if text1.len() > MATCH_MAX_BITS {
                // Oversized pre-image (monster delete): anchor by its head
                // and tail instead.
                let head = self.match_main(&text, &text1[..MATCH_MAX_BITS], expected_loc)?;
                if let Some(start) = head {
                    end_loc = self.match_main(
                        &text,
                        &text1[text1.len() - MATCH_MAX_BITS..],
                        expected_loc + text1.len() - MATCH_MAX_BITS,
                    )?;
                    match end_loc {
                        Some(end) if start < end => Some(start),
                        // Can't find valid trailing context, drop this patch.
                        _ => None,
                    }
                } else {
                    None
                }
            } else {
                self.match_main(&text, &text1, expected_loc)?
            };

            let Some(start_loc) = start_loc else {
                // No match: subtract the delta this hunk would have caused.
                delta -= patch.length2 as isize - patch.length1 as isize;
                continue;
            };

            results[x] = true;
            delta = start_loc as isize - expected_loc as isize;
            let text2: Vec<char> = match end_loc {
                Some(end) => text[start_loc..(end + MATCH_MAX_BITS).min(text.len())].to_vec(),
                None => text[start_loc..(start_loc + text1.len()).min(text.len())].to_vec(),
            };
            if text1 == text2 {
                // Perfect match: splice the post-image straight in.
                let replacement = post_image(&patch.diffs);
                text.splice(start_loc..start_loc + text1.len(), replacement);
            } else {
                // Imperfect match: re-diff the found region against the
                // pre-image and translate each edit through it.
                let diffs = self.diff_chars(&text1, &text2, false);
                if text1.len() > MATCH_MAX_BITS
                    && levenshtein(&diffs) as f32 / text1.len() as f32
                        > self.patch_delete_threshold
                {
                    // The end points match, but the content is unacceptably bad.
                    results[x] = false;
                } else {
                    apply_translated(&mut text, &patch.diffs, &diffs, start_loc);
                }
            }
        }
        // Strip the padding off.
        let text = text[null_padding.len()..text.len() - null_padding.len()].to_vec();
        Ok((text, results))
    }

    /// Adds the `\x01..\x04` sentinel run to both ends of every patch's
    /// context so edits at the text boundaries have something to anchor on.
    /// Returns the padding string.
    pub(crate) fn add_padding(&self, patches: &mut [Patch]) -> Vec<char> {
        let padding_length = self.patch_margin;
        let null_padding: Vec<char> = (1..=padding_length as u32)
            .filter_map(char::from_u32)
            .collect();

        for patch in patches.iter_mut() {
            patch.start1 += padding_length;
            patch.start2 += padding_length;
        }

        // Lead-in: bump the first hunk's context out to the padding.
        if let Some(patch) = patches.first_mut() {
            let needs_full = patch
                .diffs
                .first()
                .map(|d| d.op != Op::Equal)
                .unwrap_or(true);
            if needs_full {
                patch.diffs.insert(0, Edit::equal(&null_padding));
                patch.start1 -= padding_length;
                patch.start2 -= padding_length;
                patch.length1 += padding_length;
                patch.length2 += padding_length;
            } else if padding_length > patch.diffs[0].text.len() {
                // Grow first equality backward into the padding.
                let extra = padding_length - patch.diffs[0].text.len();
                let mut text = null_padding[patch.diffs[0].text.len()..].to_vec();
                text.extend_from_slice(&patch.diffs[0].text);
                patch.diffs[0].text = text;
                patch.start1 -= extra;
                patch.start2 -= extra;
                patch.length1 += extra;
                patch.length2 += extra;
            }
        }

        // Lead-out: same for the last hunk.
        if let Some(patch) = patches.last_mut() {
            let needs_full = patch
                .diffs
                .last()
                .map(|d| d.op != Op::Equal)
                .unwrap_or(true);
            if needs_full {
                patch.diffs.push(Edit::equal(&null_padding));
                patch.length1 += padding_length;
                patch.length2 += padding_length;
            } else {
                // Grow last equality forward into the padding.
                let last = patch.diffs.len() - 1;
                if padding_length > patch.diffs[last].text.len() {
                    let extra = padding_length - patch.diffs[last].text.len();
                    patch.diffs[last]
                        .text
                        .extend_from_slice(&null_padding[..extra]);
                    patch.length1 += extra;
                    patch.length2 += extra;
                }
            }
        }

        null_padding
    }

    /// Splits any hunk whose pre-image exceeds the Bitap width into smaller
    /// chained hunks. A delete longer than twice the width rides through
    /// whole, trusting its surrounding context.
    pub(crate) fn split_max(&self, patches: &mut Vec<Patch>) {
        let patch_size = MATCH_MAX_BITS;
        let margin = self.patch_margin;
        let mut result: Vec<Patch> = Vec::with_capacity(patches.len());
        for mut bigpatch in patches.drain(..) {
            if bigpatch.length1 <= patch_size {
                result.push(bigpatch);
                continue;
            }
            let mut start1 = bigpatch.start1;
            let mut start2 = bigpatch.start2;
            let mut precontext: Vec<char> = Vec::new();
            while !bigpatch.diffs.is_empty() {
                let mut patch = Patch {
                    start1: start1 - precontext.len(),
                    start2: start2 - precontext.len(),
                    ..Patch::default()
                };
                let mut empty = true;
                if !precontext.is_empty() {
                    patch.length1 = precontext.len();
                    patch.length2 = precontext.len();
                    patch.diffs.push(Edit::equal(&precontext));
                }
                while !bigpatch.diffs.is_empty() && patch.length1 < patch_size - margin {
                    let diff_type = bigpatch.diffs[0].op;
                    if diff_type == Op::Insert {
                        // Insertions are harmless.
                        let edit = bigpatch.diffs.remove(0);
                        patch.length2 += edit.text.len();
                        start2 += edit.text.len();
                        patch.diffs.push(edit);
                        empty = false;
                    } else if diff_type == Op::Delete
                        && patch.diffs.len() == 1
                        && patch.diffs[0].op == Op::Equal
                        && bigpatch.diffs[0].text.len() > 2 * patch_size
                    {
                        // This is a large deletion.  Let it pass in one chunk.
                        let edit = bigpatch.diffs.remove(0);
                        patch.length1 += edit.text.len();
                        start1 += edit.text.len();
                        patch.diffs.push(edit);
                        empty = false;
                    } else {
                        // Deletion or equality; only take as much as fits.
                        let take = (patch_size - patch.length1 - margin)
                            .min(bigpatch.diffs[0].text.len());
                        let diff_text: Vec<char> = bigpatch.diffs[0].text[..take].to_vec();
                        patch.length1 += take;
                        start1 += take;
                        if diff_type == Op::Equal {
                            patch.length2 += take;
                            start2 += take;
                        } else {
                            empty = false;
                        }
                        if take == bigpatch.diffs[0].text.len() {
                            patch.diffs.push(bigpatch.diffs.remove(0));
                        } else {
                            patch.diffs.push(Edit::new(diff_type, diff_text));
                            bigpatch.diffs[0].text.drain(..take);
                        }
                    }
                }
                // Compute the head context for the next patch.
                let post = post_image(&patch.diffs);
                precontext = post[post.len().saturating_sub(margin)..].to_vec();
                // Append the end context for this patch.
                let pre_rest = pre_image(&bigpatch.diffs);
                let postcontext: Vec<char> = pre_rest[..pre_rest.len().min(margin)].to_vec();
                if !postcontext.is_empty() {
                    patch.length1 += postcontext.len();
                    patch.length2 += postcontext.len();
                    match patch.diffs.last_mut() {
                        Some(last) if last.op == Op::Equal => {
                            last.text.extend_from_slice(&postcontext);
                        }
                        _ => patch.diffs.push(Edit::equal(&postcontext)),
                    }
                }
                if !empty {
                    result.push(patch);
                }
            }
        }
        *patches = result;
    }
}

/// Replays a hunk's edits onto `text` at `start_loc`, translating offsets
/// through `diffs`, the re-diff of pre-image versus found region.
fn apply_translated(text: &mut Vec<char>, mods: &EditScript, diffs: &EditScript, start_loc: usize) {
    let mut diffs = diffs.clone();
    crate::cleanup::cleanup_semantic_lossless(&mut diffs);
    let mut index1 = 0;
    for m in mods {
        if m.op != Op::Equal {
            let index2 = x_index(&diffs, index1);
            if m.op == Op::Insert {
                text.splice(
                    start_loc + index2..start_loc + index2,
                    m.text.iter().copied(),
                );
            } else {
                let end = x_index(&diffs, index1 + m.text.len());
                text.drain(start_loc + index2..start_loc + end);
            }
        }
        if m.op != Op::Delete {
            index1 += m.text.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chars::{to_chars, to_string};
    use pretty_assertions::assert_eq;

    fn c(s: &str) -> Vec<char> {
        to_chars(s)
    }

    fn make(dmp: &DiffMatchPatch, text1: &str, text2: &str) -> Vec<Patch> {
        let diffs = dmp.diff_main(text1, text2);
        dmp.patch_make(&c(text1), &diffs)
    }

    #[test]
    fn test_apply_exact() {
        let dmp = DiffMatchPatch::default();
        let patches = make(
            &dmp,
            "The quick brown fox jumps over the lazy dog.",
            "That quick brown fox jumped over a lazy dog.",
        );
        let (out, results) = dmp
            .patch_apply(&patches, &c("The quick brown fox jumps over the lazy dog."))
            .unwrap();
        assert_eq!(
            to_string(&out),
            "That quick brown fox jumped over a lazy dog."
        );
        assert!(results.iter().all(|&r| r));
    }

    #[test]
    fn test_apply_fuzzy_against_drifted_text() {
        let dmp = DiffMatchPatch::default();
        let patches = make(
            &dmp,
            "The quick brown fox jumps over the lazy dog.",
            "That quick brown fox jumped over a lazy dog.",
        );
        let (out, results) = dmp
            .patch_apply(
                &patches,
                &c("The quick red rabbit jumps over the tired tiger."),
            )
            .unwrap();
        assert_eq!(
            to_string(&out),
            "That quick red rabbit jumped over a tired tiger."
        );
        assert!(results.iter().all(|&r| r));
    }

    #[test]
    fn test_apply_reports_failed_hunks() {
        let dmp = DiffMatchPatch::default();
        let patches = make(
            &dmp,
            "The quick brown fox jumps over the lazy dog.",
            "That quick brown fox jumped over a lazy dog.",
        );
        let (out, results) = dmp
            .patch_apply(&patches, &c("I am the very model of a modern major general."))
            .unwrap();
        assert_eq!(to_string(&out), "I am the very model of a modern major general.");
        assert!(results.iter().all(|&r| !r));
    }

    #[test]
    fn test_apply_empty_patch_list_is_identity() {
        let dmp = DiffMatchPatch::default();
        let (out, results) = dmp.patch_apply(&[], &c("hello")).unwrap();
        assert_eq!(to_string(&out), "hello");
        assert!(results.is_empty());
    }

    #[test]
    fn test_apply_does_not_mutate_input_patches() {
        let dmp = DiffMatchPatch::default();
        let patches = make(&dmp, "abcdef", "abcdxyzef");
        let rendered: String = patches.iter().map(Patch::to_string).collect();
        let _ = dmp.patch_apply(&patches, &c("abcdef")).unwrap();
        let rendered_after: String = patches.iter().map(Patch::to_string).collect();
        assert_eq!(rendered, rendered_after);
    }

    #[test]
    fn test_apply_edge_insertions_use_padding() {
        let dmp = DiffMatchPatch::default();
        let patches = make(&dmp, "abcdef", "XXXabcdefYYY");
        let (out, results) = dmp.patch_apply(&patches, &c("abcdef")).unwrap();
        assert_eq!(to_string(&out), "XXXabcdefYYY");
        assert!(results.iter().all(|&r| r));
    }

    #[test]
    fn test_apply_big_delete_small_change() {
        let dmp = DiffMatchPatch::default();
        let text1 = format!("x{}x", "1234567890".repeat(10));
        let patches = make(&dmp, &text1, "xabcx");
        // One substitution inside the doomed region still applies cleanly.
        let altered = text1.replacen("345678", "3x5678", 1);
        let (out, results) = dmp.patch_apply(&patches, &c(&altered)).unwrap();
        assert_eq!(to_string(&out), "xabcx");
        assert!(results.iter().all(|&r| r));
    }

    #[test]
    fn test_apply_big_delete_unmatched_fails() {
        let dmp = DiffMatchPatch::default();
        let text1 = format!("x{}x", "1234567890".repeat(10));
        let patches = make(&dmp, &text1, "xabcx");
        let garbage = format!("x{}x", "abcdefghij".repeat(10));
        let (out, results) = dmp.patch_apply(&patches, &c(&garbage)).unwrap();
        // The oversized delete cannot anchor its head in unrelated text.
        assert!(!results[0]);
        assert_ne!(to_string(&out), "xabcx");
    }

    #[test]
    fn test_split_max_bounds_hunk_width() {
        let dmp = DiffMatchPatch::default();
        let mut patches = make(
            &dmp,
            "abcdefghijklmnopqrstuvwxyz01234567890",
            "XabXcdXefXghXijXklXmnXopXqrXstXuvXwxXyzX01X23X45X67X89X0",
        );
        dmp.split_max(&mut patches);
        for patch in &patches {
            assert!(patch.length1 <= MATCH_MAX_BITS);
        }
    }

    #[test]
    fn test_add_padding_wraps_edgy_patches() {
        let dmp = DiffMatchPatch::default();
        let mut patches = make(&dmp, "", "test");
        assert_eq!(patches[0].to_string(), "@@ -1,0 +1,4 @@\n+test\n");
        dmp.add_padding(&mut patches);
        assert_eq!(
            patches[0].to_string(),
            "@@ -1,8 +1,12 @@\n %01%02%03%04\n+test\n %01%02%03%04\n"
        );
    }
}
