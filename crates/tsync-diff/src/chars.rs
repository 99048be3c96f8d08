//! Codepoint buffer helpers.
//!
//! The engine operates on `&[char]` throughout so that every Unicode scalar
//! value, including supplementary-plane characters, counts as exactly one
//! unit for indexing, slicing, and Bitap masks. Conversion happens once at
//! the API boundary.

/// Converts a string into a codepoint buffer.
pub fn to_chars(text: &str) -> Vec<char> {
    text.chars().collect()
}

/// Rebuilds a string from a codepoint buffer.
pub fn to_string(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Finds the first occurrence of `needle` in `haystack` at or after `from`.
///
/// An empty needle matches at `from` (clamped to the buffer length).
pub fn index_of(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    let from = from.min(haystack.len());
    if needle.is_empty() {
        return Some(from);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Finds the last occurrence of `needle` starting at or before `from`.
pub fn last_index_of(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    let upper = from.min(haystack.len() - needle.len());
    (0..=upper)
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn c(s: &str) -> Vec<char> {
        to_chars(s)
    }

    #[test]
    fn test_round_trip_preserves_supplementary_plane() {
        let text = "a\u{1F600}b";
        let chars = to_chars(text);
        assert_eq!(chars.len(), 3);
        assert_eq!(to_string(&chars), text);
    }

    #[test]
    fn test_index_of_basic() {
        assert_eq!(index_of(&c("abcabc"), &c("bc"), 0), Some(1));
        assert_eq!(index_of(&c("abcabc"), &c("bc"), 2), Some(4));
        assert_eq!(index_of(&c("abcabc"), &c("zz"), 0), None);
    }

    #[test]
    fn test_index_of_empty_needle_matches_at_anchor() {
        assert_eq!(index_of(&c("abc"), &c(""), 2), Some(2));
        assert_eq!(index_of(&c("abc"), &c(""), 9), Some(3));
    }

    #[test]
    fn test_last_index_of() {
        assert_eq!(last_index_of(&c("abcabc"), &c("abc"), 5), Some(3));
        assert_eq!(last_index_of(&c("abcabc"), &c("abc"), 2), Some(0));
        assert_eq!(last_index_of(&c("abcabc"), &c("zz"), 5), None);
        // anchor past the end clamps
        assert_eq!(last_index_of(&c("abcabc"), &c("abc"), 99), Some(3));
    }
}
