//! Error handling for the watcheye-dump binary.

use std::{io, result};

use thiserror::Error;

/// Convenient result type for watcheye-dump operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while running the dumper.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrapper for standard I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Errors surfaced by the watcher library.
    #[error("{0}")]
    Watch(#[from] watcheye::Error),
    /// The command needs a platform feature this build lacks.
    #[error("`{0}` is only supported on macOS")]
    Unsupported(&'static str),
}
