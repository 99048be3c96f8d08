//! Text file IO with atomic, lock-guarded writes.
//!
//! Writes go to a temp file in the destination directory, held under an
//! exclusive advisory lock, and land via rename so readers never observe a
//! half-written file.

use std::fs;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

/// Reads a file as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| Error::NotUtf8 {
        path: path.to_path_buf(),
    })
}

/// Writes `content` to `path` atomically, creating parent directories as
/// needed.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.as_file().lock_exclusive().map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

/// Copies a file byte-for-byte, creating the destination's parents.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    let copy_err = |source| Error::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(copy_err)?;
        }
    }
    fs::copy(from, to).map_err(copy_err)?;
    debug!(from = %from.display(), to = %to.display(), "copied file");
    Ok(())
}
