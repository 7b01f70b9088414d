use std::path::PathBuf;

/// Errors surfaced by split generation and label conversion.
///
/// Individual malformed annotation records are never errors; they are logged
/// and skipped by the converter.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Frame id {0:?} is not a usable file name")]
    InvalidFrameId(String),

    #[error("Split metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PrepError {
    /// Wrap an `io::Error` together with the path that produced it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrepError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
