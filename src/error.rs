use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// A path segment does not exist in the repository tree.
    #[error("file {0} not found")]
    NotFound(String),

    /// A directory was required but the path names a file.
    #[error("{0} is not a directory")]
    NotADirectory(String),

    /// A file was required but the path names a directory.
    #[error("{0} is a directory")]
    NotAFile(String),

    /// Navigation would leave the repository root.
    #[error("{0} is outside the repository")]
    OutOfBounds(String),

    /// The remote tree listing contains an inconsistent path.
    #[error("malformed tree entry: {0}")]
    MalformedEntry(String),

    /// The remote API request failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Reading or writing the local cache failed.
    #[error("cache error at {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O errors from the terminal or process plumbing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or event errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// The `owner/repo` argument could not be parsed.
    #[error("Invalid repository: {0}")]
    InvalidRepo(String),

    /// An external command could not be started.
    #[error("cannot run command: {0}")]
    Exec(String),

    /// A shell command was missing a required argument.
    #[error("{0}")]
    Usage(String),
}

impl AppError {
    /// Wrap an I/O error that happened at a cache path.
    pub fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::CacheIo {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Fetch(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Fetch(format!("unexpected response body: {}", err))
    }
}
