//! Diff, fuzzy match, and patch engine.
//!
//! A self-contained implementation of the classic diff-match-patch trio
//! over codepoint buffers:
//!
//! - **diff** — Myers O(ND) bisect with equality/prefix/suffix shortcuts,
//!   half-match speculation, and line-mode chunking, followed by structural
//!   and semantic cleanup passes.
//! - **match** — Bitap fuzzy search weighing edit errors against distance
//!   from an expected location.
//! - **patch** — context-carrying hunks that survive drift in the target
//!   text, with per-hunk success reporting.
//!
//! ```
//! use tsync_diff::DiffMatchPatch;
//! use tsync_diff::chars::{to_chars, to_string};
//!
//! let dmp = DiffMatchPatch::default();
//! let diffs = dmp.diff_main("good dog", "bad dog");
//! let patches = dmp.patch_make(&to_chars("good dog"), &diffs);
//! let (patched, ok) = dmp.patch_apply(&patches, &to_chars("good dog")).unwrap();
//! assert_eq!(to_string(&patched), "bad dog");
//! assert!(ok.iter().all(|&r| r));
//! ```

pub mod apply;
pub mod chars;
pub mod cleanup;
pub mod diff;
pub mod error;
pub mod lines;
pub mod matcher;
pub mod patch;
pub mod scan;

pub use cleanup::{cleanup_merge, cleanup_semantic, cleanup_semantic_lossless};
pub use diff::{
    DiffMatchPatch, Edit, EditScript, MATCH_MAX_BITS, Op, levenshtein, post_image, pre_image,
    x_index,
};
pub use error::{Error, Result};
pub use lines::{chars_to_lines, lines_to_chars};
pub use patch::Patch;
