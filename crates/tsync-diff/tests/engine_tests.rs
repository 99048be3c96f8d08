//! End-to-end engine behavior across the diff, patch, and match layers.

use pretty_assertions::assert_eq;
use tsync_diff::chars::{to_chars, to_string};
use tsync_diff::{DiffMatchPatch, Op, post_image, pre_image};

#[test]
fn test_diff_of_identical_texts_is_a_single_equality() {
    let dmp = DiffMatchPatch::default();
    let diffs = dmp.diff_main("same\ntext\n", "same\ntext\n");
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].op, Op::Equal);
    assert!(dmp.diff_main("", "").is_empty());
}

#[test]
fn test_diff_patch_round_trip() {
    let dmp = DiffMatchPatch::default();
    let a = "Le Roi est mort, vive le Roi!\nThe King is dead.\n";
    let b = "Le Roi est mort, vive la Reine!\nLong live the Queen.\n";
    let diffs = dmp.diff_main(a, b);
    assert_eq!(to_string(&pre_image(&diffs)), a);
    assert_eq!(to_string(&post_image(&diffs)), b);
    let patches = dmp.patch_make(&to_chars(a), &diffs);
    let (out, results) = dmp.patch_apply(&patches, &to_chars(a)).unwrap();
    assert_eq!(to_string(&out), b);
    assert!(results.iter().all(|&r| r));
}

#[test]
fn test_round_trip_with_surrogate_pair_content() {
    let dmp = DiffMatchPatch::default();
    let a = "list: \u{1F600} \u{1F601}\n";
    let b = "list: \u{1F600} \u{1F602} \u{1F601}\n";
    let patches = dmp.patch_make(&to_chars(a), &dmp.diff_main(a, b));
    let (out, results) = dmp.patch_apply(&patches, &to_chars(a)).unwrap();
    assert_eq!(to_string(&out), b);
    assert!(results.iter().all(|&r| r));
}

#[test]
fn test_zero_timeout_still_terminates() {
    let mut dmp = DiffMatchPatch::default();
    dmp.diff_timeout = 0.0;
    let a = "abcdef".repeat(40);
    let b = "uvwxyz".repeat(40);
    let diffs = dmp.diff_main(&a, &b);
    assert_eq!(to_string(&pre_image(&diffs)), a);
    assert_eq!(to_string(&post_image(&diffs)), b);
}

#[test]
fn test_tiny_timeout_degrades_but_stays_correct() {
    let mut dmp = DiffMatchPatch::default();
    dmp.diff_timeout = 0.000_001;
    let a: String = (0..2000).map(|i| format!("{i}\n")).collect();
    let b: String = (0..2000).rev().map(|i| format!("{i}\n")).collect();
    let diffs = dmp.diff_main(&a, &b);
    // Degraded output is coarser, never wrong.
    assert_eq!(to_string(&pre_image(&diffs)), a);
    assert_eq!(to_string(&post_image(&diffs)), b);
}

#[test]
fn test_patch_survives_unrelated_edits_in_target() {
    let dmp = DiffMatchPatch::default();
    let base = "one two three four five six seven eight nine ten\n";
    let updated = "one two THREE four five six seven eight NINE ten\n";
    let drifted = "zero one two three four five six seven eight nine ten\n";
    let patches = dmp.patch_make(&to_chars(base), &dmp.diff_main(base, updated));
    let (out, results) = dmp.patch_apply(&patches, &to_chars(drifted)).unwrap();
    assert_eq!(
        to_string(&out),
        "zero one two THREE four five six seven eight NINE ten\n"
    );
    assert!(results.iter().all(|&r| r));
}
