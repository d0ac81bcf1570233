//! Error types for bookbinder.
//!
//! Library crates use [`BookbinderError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all bookbinder operations.
///
/// Every variant is fatal: the pipeline has no local recovery, no
/// partial-output mode, and no retry at any stage.
#[derive(Debug, thiserror::Error)]
pub enum BookbinderError {
    /// Configuration loading or credential resolution error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input file could not be opened or read.
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input bytes are not valid under the declared encoding (UTF-8).
    #[error("cannot decode {path:?} as UTF-8: {message}")]
    Decode { path: PathBuf, message: String },

    /// Annotation service call failure (auth, quota, transport, or a
    /// malformed response).
    #[error("annotation error: {0}")]
    Annotation(String),

    /// EPUB serialization or output write failure.
    #[error("write error: {message}")]
    Write { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BookbinderError>;

impl BookbinderError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` from an input read with the offending path.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a decoding error for an input file.
    pub fn decode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create an annotation error from any displayable message.
    pub fn annotation(msg: impl Into<String>) -> Self {
        Self::Annotation(msg.into())
    }

    /// Create a write error from any displayable message.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = BookbinderError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = BookbinderError::annotation("HTTP 401: invalid key");
        assert!(err.to_string().contains("HTTP 401"));
    }

    #[test]
    fn read_error_carries_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = BookbinderError::read("/tmp/missing.txt", io);
        let msg = err.to_string();
        assert!(msg.contains("missing.txt"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn decode_error_carries_path() {
        let err = BookbinderError::decode("/tmp/latin1.txt", "invalid utf-8 sequence");
        assert!(err.to_string().contains("latin1.txt"));
    }
}
