//! Error types for tw-incremental

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for build operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Error types for build operations
///
/// Stat failures while tracking dependencies are never reported here; they
/// are folded into the tracker as "changed". A style sheet that turns out not
/// to be a root is a normal outcome, not an error.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The explicit `source(…)` root does not resolve to a directory
    #[error(
        "The path given to `source(…)` must be a directory but got `source({})` instead.",
        path.display()
    )]
    InvalidSourceRoot { path: PathBuf },

    /// The compiler could not be constructed from a style sheet
    #[error("Failed to compile '{path}': {reason}")]
    Compile { path: String, reason: String },

    /// File could not be opened or read
    #[error("Cannot open file '{path}': {reason}")]
    FileNotFound { path: String, reason: String },

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A source pattern is not a valid glob
    #[error("Invalid source pattern: {0}")]
    Glob(String),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_source_root_message() {
        let err = BuildError::InvalidSourceRoot {
            path: PathBuf::from("/project/missing"),
        };
        assert_eq!(
            err.to_string(),
            "The path given to `source(…)` must be a directory but got `source(/project/missing)` instead."
        );
    }
}
