//! Template synchronization: settings, tree traversal, edit suppression,
//! and the per-file merge pipeline built on `tsync-diff`.

pub mod error;
pub mod filter;
pub mod settings;
pub mod sync;
pub mod walk;

pub use error::{Error, Result};
pub use filter::{FilterRule, apply_filters, build_rules};
pub use settings::{RawFilter, SETTINGS_PATH, Settings};
pub use sync::{FileOutcome, FileReport, SyncEngine, SyncOptions, SyncReport};
pub use walk::{DEFAULT_IGNORES, TemplateWalker};
