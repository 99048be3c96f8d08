//! Line hashing: compresses whole lines to single-codepoint tokens so the
//! diff engine can work line-at-a-time, then expands token runs back to
//! text.
//!
//! Token 0 is reserved, so real lines start at 1. Token values skip the
//! UTF-16 surrogate gap (0xD800..0xE000), which `char` cannot represent;
//! indices at or past the gap shift up by 0x800.

use std::collections::HashMap;

use crate::diff::EditScript;

/// Line budget while hashing the first text. Leaves room for the second
/// text to introduce its own lines below the overall cap.
const MAX_LINES_TEXT1: usize = 40_000;
/// Overall table cap. Texts with more distinct lines get their remainder
/// folded into one oversized final line.
const MAX_LINES_TOTAL: usize = 65_535;

fn token_for(index: usize) -> char {
    let cp = if index >= 0xD800 { index + 0x800 } else { index };
    char::from_u32(cp as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn index_for(token: char) -> usize {
    let cp = token as usize;
    if cp >= 0xE000 { cp - 0x800 } else { cp }
}

/// Encodes both texts as token buffers sharing one line table.
pub fn lines_to_chars(text1: &str, text2: &str) -> (Vec<char>, Vec<char>, Vec<String>) {
    let mut line_array: Vec<String> = vec![String::new()]; // slot 0 reserved
    let mut line_hash: HashMap<String, usize> = HashMap::new();
    let chars1 = munge(text1, &mut line_array, &mut line_hash, MAX_LINES_TEXT1);
    let chars2 = munge(text2, &mut line_array, &mut line_hash, MAX_LINES_TOTAL);
    (chars1, chars2, line_array)
}

/// Splits `text` into lines (terminators included) and encodes each as one
/// token, interning new lines until `max_lines` is reached.
fn munge(
    text: &str,
    line_array: &mut Vec<String>,
    line_hash: &mut HashMap<String, usize>,
    max_lines: usize,
) -> Vec<char> {
    let mut chars = Vec::new();
    let mut line_start = 0;
    while line_start < text.len() {
        let mut line_end = match text[line_start..].find('\n') {
            Some(i) => line_start + i + 1,
            None => text.len(),
        };
        let mut line = &text[line_start..line_end];
        match line_hash.get(line) {
            Some(&index) => chars.push(token_for(index)),
            None => {
                if line_array.len() == max_lines {
                    // Table full: the rest of the text becomes one line.
                    line = &text[line_start..];
                    line_end = text.len();
                }
                let index = line_array.len();
                line_hash.insert(line.to_string(), index);
                line_array.push(line.to_string());
                chars.push(token_for(index));
            }
        }
        line_start = line_end;
    }
    chars
}

/// Rehydrates each edit's token run back into line text.
pub fn chars_to_lines(diffs: &mut EditScript, line_array: &[String]) {
    for edit in diffs.iter_mut() {
        let mut text = String::new();
        for &token in &edit.text {
            text.push_str(&line_array[index_for(token)]);
        }
        edit.text = text.chars().collect();
    }
}
