use std::path::PathBuf;

use thiserror::Error;

/// Main error type for concordia operations.
///
/// Only store-level and I/O failures surface here; per-node and
/// per-alignment problems are logged and absorbed by the pipeline so that a
/// partially-alignable testament still yields a usable dataset.
#[derive(Error, Debug)]
pub enum Error {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unknown book id: {0}")]
    UnknownBook(String),

    #[error("source directory not found: {0}")]
    MissingSource(PathBuf),

    #[error("unsupported lexicon code: {0}")]
    UnsupportedLexiconCode(String),
}

/// Result type alias for concordia operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownBook("xyz".to_string());
        assert_eq!(err.to_string(), "unknown book id: xyz");
    }
}
