//! Filesystem collaborator: UTF-8 reads, atomic locked writes, and plain
//! copies.

pub mod error;
pub mod io;

pub use error::{Error, Result};
pub use io::{copy_file, read_text, write_atomic};
