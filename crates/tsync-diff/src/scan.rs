//! Common prefix, suffix, and overlap scans.
//!
//! Prefix and suffix use a binary search over the candidate length with a
//! slice-equality probe per step, which beats a linear scan on long shared
//! runs and is never worse than O(log n) probes.

use crate::chars::index_of;

/// Length of the common prefix of two buffers.
pub fn common_prefix(text1: &[char], text2: &[char]) -> usize {
    if text1.is_empty() || text2.is_empty() || text1[0] != text2[0] {
        return 0;
    }
    let mut pointer_min = 0;
    let mut pointer_max = text1.len().min(text2.len());
    let mut pointer_mid = pointer_max;
    let mut pointer_start = 0;
    while pointer_min < pointer_mid {
        if text1[pointer_start..pointer_mid] == text2[pointer_start..pointer_mid] {
            pointer_min = pointer_mid;
            pointer_start = pointer_min;
        } else {
            pointer_max = pointer_mid;
        }
        pointer_mid = (pointer_max - pointer_min) / 2 + pointer_min;
    }
    pointer_mid
}

/// Length of the common suffix of two buffers.
pub fn common_suffix(text1: &[char], text2: &[char]) -> usize {
    if text1.is_empty() || text2.is_empty() || text1[text1.len() - 1] != text2[text2.len() - 1] {
        return 0;
    }
    let mut pointer_min = 0;
    let mut pointer_max = text1.len().min(text2.len());
    let mut pointer_mid = pointer_max;
    let mut pointer_end = 0;
    while pointer_min < pointer_mid {
        if text1[text1.len() - pointer_mid..text1.len() - pointer_end]
            == text2[text2.len() - pointer_mid..text2.len() - pointer_end]
        {
            pointer_min = pointer_mid;
            pointer_end = pointer_min;
        } else {
            pointer_max = pointer_mid;
        }
        pointer_mid = (pointer_max - pointer_min) / 2 + pointer_min;
    }
    pointer_mid
}

/// Length of the longest suffix of `text1` that is a prefix of `text2`.
///
/// Seed-and-grow: probe with a one-char suffix, jump ahead by wherever the
/// probe is found, and confirm the full candidate before recording it.
pub fn common_overlap(text1: &[char], text2: &[char]) -> usize {
    if text1.is_empty() || text2.is_empty() {
        return 0;
    }
    // Truncate to a shared window length.
    let text1 = if text1.len() > text2.len() {
        &text1[text1.len() - text2.len()..]
    } else {
        text1
    };
    let text2 = if text2.len() > text1.len() {
        &text2[..text1.len()]
    } else {
        text2
    };
    let text_length = text1.len();
    if text1 == text2 {
        return text_length;
    }

    let mut best = 0;
    let mut length = 1;
    loop {
        if length > text_length {
            return best;
        }
        let pattern = &text1[text_length - length..];
        let Some(found) = index_of(text2, pattern, 0) else {
            return best;
        };
        length += found;
        if found == 0
            || (length <= text_length && text1[text_length - length..] == text2[..length])
        {
            best = length;
            length += 1;
        }
    }
}
