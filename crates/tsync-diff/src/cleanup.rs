//! Edit-script cleanup passes.
//!
//! `cleanup_merge` is the structural normalizer: it coalesces adjacent edits
//! of the same kind, factors common prefixes/suffixes out of delete/insert
//! blocks, and slides single edits between equalities. `cleanup_semantic`
//! then trades minimality for human-meaningful hunks by eliminating short
//! coincidental equalities and realigning edits to lexical boundaries.

use crate::diff::{Edit, EditScript, Op};
use crate::scan::{common_overlap, common_prefix, common_suffix};

/// Reorders and merges like edit sections, factoring out commonalities.
/// Any edit it merges is flagged `bind` until a later pass reconciles it.
pub fn cleanup_merge(diffs: &mut EditScript) {
    diffs.push(Edit::equal(&[])); // sentinel
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
                pointer += 1;
            }
            Op::Delete => {
                count_delete += 1;
                text_delete.extend_from_slice(&diffs[pointer].text);
                pointer += 1;
            }
            Op::Equal => {
                // Upon reaching an equality, check for prior redundancies.
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        // Factor out any common prefix.
                        let commonlength = common_prefix(&text_insert, &text_delete);
                        if commonlength != 0 {
                            let block_start = pointer - count_delete - count_insert;
                            if block_start > 0 && diffs[block_start - 1].op == Op::Equal {
                                let prefix = text_insert[..commonlength].to_vec();
                                diffs[block_start - 1].text.extend_from_slice(&prefix);
                            } else {
                                diffs.insert(0, Edit::equal(&text_insert[..commonlength]));
                                pointer += 1;
                            }
                            text_insert.drain(..commonlength);
                            text_delete.drain(..commonlength);
                        }
                        // Factor out any common suffix.
                        let commonlength = common_suffix(&text_insert, &text_delete);
                        if commonlength != 0 {
                            let mut suffix =
                                text_insert[text_insert.len() - commonlength..].to_vec();
                            suffix.extend_from_slice(&diffs[pointer].text);
                            diffs[pointer].text = suffix;
                            text_insert.truncate(text_insert.len() - commonlength);
                            text_delete.truncate(text_delete.len() - commonlength);
                        }
                    }
                    // Replace the raw run with the merged edits.
                    pointer -= count_delete + count_insert;
                    diffs.drain(pointer..pointer + count_delete + count_insert);
                    if !text_delete.is_empty() {
                        diffs.insert(pointer, Edit::bound(Op::Delete, text_delete.clone()));
                        pointer += 1;
                    }
                    if !text_insert.is_empty() {
                        diffs.insert(pointer, Edit::bound(Op::Insert, text_insert.clone()));
                        pointer += 1;
                    }
                    pointer += 1;
                } else if pointer != 0 && diffs[pointer - 1].op == Op::Equal {
                    // Merge this equality with the previous one.
                    let text = diffs.remove(pointer).text;
                    diffs[pointer - 1].text.extend_from_slice(&text);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }
    if let Some(last) = diffs.last() {
        if last.text.is_empty() {
            diffs.pop();
        }
    }

    // Second pass: slide single edits sandwiched between equalities either
    // direction to eliminate one of the equalities.
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Op::Equal && diffs[pointer + 1].op == Op::Equal {
            let prev_len = diffs[pointer - 1].text.len();
            let next_len = diffs[pointer + 1].text.len();
            let edit_len = diffs[pointer].text.len();
            if edit_len >= prev_len
                && diffs[pointer].text[edit_len - prev_len..] == *diffs[pointer - 1].text
            {
                // Shift the edit over the previous equality.
                let mut text = diffs[pointer - 1].text.clone();
                text.extend_from_slice(&diffs[pointer].text[..edit_len - prev_len]);
                diffs[pointer].text = text;
                let mut next_text = diffs[pointer - 1].text.clone();
                next_text.extend_from_slice(&diffs[pointer + 1].text);
                diffs[pointer + 1].text = next_text;
                diffs.remove(pointer - 1);
                changes = true;
            } else if edit_len >= next_len
                && diffs[pointer].text[..next_len] == *diffs[pointer + 1].text
            {
                // Shift the edit over the next equality.
                let next_text = diffs[pointer + 1].text.clone();
                diffs[pointer - 1].text.extend_from_slice(&next_text);
                let mut text = diffs[pointer].text[next_len..].to_vec();
                text.extend_from_slice(&next_text);
                diffs[pointer].text = text;
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    // An eliminated equality can expose further merge opportunities.
    if changes {
        cleanup_merge(diffs);
    }
}

/// Reduces the number of edits by eliminating semantically trivial
/// equalities, then realigns boundaries and extracts edit overlaps.
pub fn cleanup_semantic(diffs: &mut EditScript) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<char>> = None;
    let mut pointer: isize = 0;
    // Lengths of the change runs on either side of the candidate equality.
    let mut length_insertions1 = 0;
    let mut length_deletions1 = 0;
    let mut length_insertions2 = 0;
    let mut length_deletions2 = 0;
    while (pointer as usize) < diffs.len() {
        let idx = pointer as usize;
        if diffs[idx].op == Op::Equal {
            equalities.push(idx);
            length_insertions1 = length_insertions2;
            length_deletions1 = length_deletions2;
            length_insertions2 = 0;
            length_deletions2 = 0;
            last_equality = Some(diffs[idx].text.clone());
        } else {
            if diffs[idx].op == Op::Insert {
                length_insertions2 += diffs[idx].text.len();
            } else {
                length_deletions2 += diffs[idx].text.len();
            }
            // An equality smaller than the edits on both sides of it is
            // noise: convert it to a delete plus insert.
            if let Some(ref equality) = last_equality {
                if equality.len() <= length_insertions1.max(length_deletions1)
                    && equality.len() <= length_insertions2.max(length_deletions2)
                {
                    let eq_idx = equalities[equalities.len() - 1];
                    diffs.insert(eq_idx, Edit::delete(equality));
                    diffs[eq_idx + 1].op = Op::Insert;
                    equalities.pop();
                    // The previous equality may now be eligible too.
                    equalities.pop();
                    pointer = match equalities.last() {
                        Some(&idx) => idx as isize,
                        None => -1,
                    };
                    length_insertions1 = 0;
                    length_deletions1 = 0;
                    length_insertions2 = 0;
                    length_deletions2 = 0;
                    last_equality = None;
                    changes = true;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
    cleanup_semantic_lossless(diffs);

    // Extract overlaps between neighboring delete/insert pairs:
    // abcxxx + xxxdef keeps xxx as an equality between them.
    let mut pointer = 1;
    while pointer < diffs.len() {
        if diffs[pointer - 1].op == Op::Delete && diffs[pointer].op == Op::Insert {
            let deletion = diffs[pointer - 1].text.clone();
            let insertion = diffs[pointer].text.clone();
            let overlap_length1 = common_overlap(&deletion, &insertion);
            let overlap_length2 = common_overlap(&insertion, &deletion);
            if overlap_length1 >= overlap_length2 {
                if overlap_length1 * 2 >= deletion.len() || overlap_length1 * 2 >= insertion.len()
                {
                    diffs.insert(pointer, Edit::equal(&insertion[..overlap_length1]));
                    diffs[pointer - 1].text = deletion[..deletion.len() - overlap_length1].to_vec();
                    diffs[pointer + 1].text = insertion[overlap_length1..].to_vec();
                    pointer += 1;
                }
            } else if overlap_length2 * 2 >= deletion.len() || overlap_length2 * 2 >= insertion.len()
            {
                // Reverse overlap: the insertion's tail is the deletion's head.
                diffs.insert(pointer, Edit::equal(&deletion[..overlap_length2]));
                diffs[pointer - 1] = Edit::insert(&insertion[..insertion.len() - overlap_length2]);
                diffs[pointer + 1] = Edit::delete(&deletion[overlap_length2..]);
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Slides edits sideways to align them with lexical boundaries: word edges,
/// line breaks, blank lines. Keeps the script's images intact.
pub fn cleanup_semantic_lossless(diffs: &mut EditScript) {
    let mut pointer: isize = 1;
    while pointer >= 1 && (pointer as usize) + 1 < diffs.len() {
        let idx = pointer as usize;
        if diffs[idx - 1].op == Op::Equal && diffs[idx + 1].op == Op::Equal {
            let mut equality1 = diffs[idx - 1].text.clone();
            let mut edit = diffs[idx].text.clone();
            let mut equality2 = diffs[idx + 1].text.clone();

            // First, shift the edit as far left as possible.
            let common_offset = common_suffix(&equality1, &edit);
            if common_offset != 0 {
                let common_string = edit[edit.len() - common_offset..].to_vec();
                equality1.truncate(equality1.len() - common_offset);
                let mut shifted = common_string.clone();
                shifted.extend_from_slice(&edit[..edit.len() - common_offset]);
                edit = shifted;
                let mut shifted2 = common_string;
                shifted2.extend_from_slice(&equality2);
                equality2 = shifted2;
            }

            // Then step right one character at a time, keeping the best
            // scoring split.
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score =
                semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                equality1.push(edit[0]);
                edit.rotate_left(1);
                let last = edit.len() - 1;
                edit[last] = equality2[0];
                equality2.remove(0);
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                // >= favors trailing boundaries over leading ones.
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if diffs[idx - 1].text != best_equality1 {
                // A better split was found.
                if !best_equality1.is_empty() {
                    diffs[idx - 1].text = best_equality1;
                } else {
                    diffs.remove(idx - 1);
                    pointer -= 1;
                }
                diffs[pointer as usize].text = best_edit;
                if !best_equality2.is_empty() {
                    diffs[pointer as usize + 1].text = best_equality2;
                } else {
                    diffs.remove(pointer as usize + 1);
                    pointer -= 1;
                }
            }
        }
        pointer += 1;
    }
}

/// Scores a split point between two texts: 6 (best, at an edge) down to 0
/// (worst, mid-word).
fn semantic_score(one: &[char], two: &[char]) -> u32 {
    if one.is_empty() || two.is_empty() {
        return 6;
    }
    let char1 = one[one.len() - 1];
    let char2 = two[0];
    let non_alnum1 = !char1.is_alphanumeric();
    let non_alnum2 = !char2.is_alphanumeric();
    let whitespace1 = non_alnum1 && char1.is_whitespace();
    let whitespace2 = non_alnum2 && char2.is_whitespace();
    let line_break1 = whitespace1 && (char1 == '\n' || char1 == '\r');
    let line_break2 = whitespace2 && (char2 == '\n' || char2 == '\r');
    let blank_line1 = line_break1 && ends_with_blank_line(one);
    let blank_line2 = line_break2 && starts_with_blank_line(two);

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !whitespace1 && whitespace2 {
        // End of sentence.
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

// \n\r?\n at the end
fn ends_with_blank_line(text: &[char]) -> bool {
    let n = text.len();
    (n >= 2 && text[n - 2] == '\n' && text[n - 1] == '\n')
        || (n >= 3 && text[n - 3] == '\n' && text[n - 2] == '\r' && text[n - 1] == '\n')
}

// \r?\n\r?\n at the start
fn starts_with_blank_line(text: &[char]) -> bool {
    let mut i = 0;
    if text.get(i) == Some(&'\r') {
        i += 1;
    }
    if text.get(i) != Some(&'\n') {
        return false;
    }
    i += 1;
    if text.get(i) == Some(&'\r') {
        i += 1;
    }
    text.get(i) == Some(&'\n')
}
