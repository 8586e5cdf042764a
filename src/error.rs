use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors surfaced by logger construction and spawning.
#[derive(Debug, Error)]
pub enum Error {
    /// `spawn` was handed an empty child name. Distinct from any I/O or
    /// delegate error so callers can match on it.
    #[error("empty child name")]
    EmptyChildName,

    /// The log directory could not be created.
    #[error("unable to create log directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The path carries no UTF-8 file-name component to derive from.
    #[error("path has no usable file name: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Opening or resolving the log file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}
