//! Fuzzy location of a pattern inside a text.
//!
//! Exact containment is tried first; otherwise a Bitap scan weighs edit
//! errors against distance from the expected location. Patterns wider than
//! the bit vector ([`MATCH_MAX_BITS`]) cannot be scanned and are a hard
//! error; callers that may hold longer pre-images chunk them beforehand.

use std::collections::HashMap;

use crate::chars::{index_of, last_index_of};
use crate::diff::{DiffMatchPatch, MATCH_MAX_BITS};
use crate::error::{Error, Result};

impl DiffMatchPatch {
    /// Locates the best instance of `pattern` in `text` near `loc`.
    pub fn match_main(&self, text: &[char], pattern: &[char], loc: usize) -> Result<Option<usize>> {
        let loc = loc.min(text.len());
        if text == pattern {
            // Shortcut (potentially not guaranteed by the algorithm).
            return Ok(Some(0));
        }
        if text.is_empty() {
            return Ok(None);
        }
        if loc + pattern.len() <= text.len() && text[loc..loc + pattern.len()] == *pattern {
            // Perfect match at the perfect spot.
            return Ok(Some(loc));
        }
        self.match_bitap(text, pattern, loc)
    }

    /// Bitap scan, expanding the error level until the score threshold is
    /// exhausted.
    fn match_bitap(&self, text: &[char], pattern: &[char], loc: usize) -> Result<Option<usize>> {
        if pattern.len() > MATCH_MAX_BITS {
            return Err(Error::PatternTooLong {
                length: pattern.len(),
                max: MATCH_MAX_BITS,
            });
        }

        let s = match_alphabet(pattern);
        let mut score_threshold = f64::from(self.match_threshold);

        // Exact matches anywhere seed a tighter threshold.
        if let Some(best_loc) = index_of(text, pattern, loc) {
            score_threshold = self.bitap_score(0, best_loc as isize, loc, pattern.len())
                .min(score_threshold);
            if let Some(best_loc) = last_index_of(text, pattern, loc + pattern.len()) {
                score_threshold = self.bitap_score(0, best_loc as isize, loc, pattern.len())
                    .min(score_threshold);
            }
        }

        let matchmask = 1u32 << (pattern.len() - 1);
        let mut best_loc: Option<usize> = None;

        let mut bin_max = pattern.len() + text.len();
        let mut last_rd: Vec<u32> = Vec::new();
        for d in 0..pattern.len() {
            // Find the widest window at this error level that still scores
            // under the threshold.
            let mut bin_min = 0;
            let mut bin_mid = bin_max;
            while bin_min < bin_mid {
                if self.bitap_score(d, (loc + bin_mid) as isize, loc, pattern.len())
                    <= score_threshold
                {
                    bin_min = bin_mid;
                } else {
                    bin_max = bin_mid;
                }
                bin_mid = (bin_max - bin_min) / 2 + bin_min;
            }
            // This result narrows the next iteration's ceiling.
            bin_max = bin_mid;

            let mut start = 1.max(loc as isize - bin_mid as isize + 1) as usize;
            let finish = (loc + bin_mid).min(text.len()) + pattern.len();

            let mut rd = vec![0u32; finish + 2];
            rd[finish + 1] = (1u32 << d) - 1;
            let mut j = finish;
            while j >= start {
                let char_match = if j > text.len() {
                    // Out of range.
                    0
                } else {
                    s.get(&text[j - 1]).copied().unwrap_or(0)
                };
                rd[j] = if d == 0 {
                    // First pass: exact matches only.
                    ((rd[j + 1] << 1) | 1) & char_match
                } else {
                    // Subsequent passes: fold in substitutions, insertions,
                    // and deletions from the previous error level.
                    let prev_j1 = last_rd.get(j + 1).copied().unwrap_or(0);
                    let prev_j = last_rd.get(j).copied().unwrap_or(0);
                    (((rd[j + 1] << 1) | 1) & char_match) | (((prev_j1 | prev_j) << 1) | 1) | prev_j1
                };
                if rd[j] & matchmask != 0 {
                    let score = self.bitap_score(d, j as isize - 1, loc, pattern.len());
                    // Ties favor earlier passes (fewer errors).
                    if score <= score_threshold {
                        score_threshold = score;
                        best_loc = Some(j - 1);
                        if j - 1 > loc {
                            // Ahead of the expected location: the window can
                            // still shrink toward loc from the left.
                            start = 1.max(2 * loc as isize - (j as isize - 1)) as usize;
                        } else {
                            // Behind it; no better score remains leftward.
                            break;
                        }
                    }
                }
                j -= 1;
            }
            // No point entering the next error level if its floor already
            // exceeds the threshold.
            if self.bitap_score(d + 1, loc as isize, loc, pattern.len()) > score_threshold {
                break;
            }
            last_rd = rd;
        }
        Ok(best_loc)
    }

    /// Score for a candidate match: error rate plus distance penalty.
    /// 0.0 is perfect, 1.0 is no match at all.
    fn bitap_score(&self, errors: usize, x: isize, loc: usize, pattern_len: usize) -> f64 {
        let accuracy = errors as f64 / pattern_len as f64;
        let proximity = (loc as isize - x).unsigned_abs() as f64;
        if self.match_distance == 0 {
            // Dodge divide by zero.
            return if proximity == 0.0 { accuracy } else { 1.0 };
        }
        accuracy + proximity / self.match_distance as f64
    }
}

/// Bitmask per pattern character: bit i is set where the character occurs
/// at position `len - 1 - i`.
fn match_alphabet(pattern: &[char]) -> HashMap<char, u32> {
    let mut s: HashMap<char, u32> = HashMap::with_capacity(pattern.len());
    for (i, &ch) in pattern.iter().enumerate() {
        *s.entry(ch).or_insert(0) |= 1u32 << (pattern.len() - i - 1);
    }
    s
}
