//! Error types for the word-cloud pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or capturing a word cloud
#[derive(Error, Debug)]
pub enum Error {
    /// The words argument has a shape the normalizer does not accept
    #[error("Invalid input type: {0}")]
    InvalidInputType(String),

    /// A pre-tallied weight is negative, NaN or infinite
    #[error("Invalid weight {weight} for word '{word}'")]
    InvalidWeight { word: String, weight: f64 },

    /// Invalid render options
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to start the rendering environment
    #[error("Failed to launch rendering environment: {0}")]
    LaunchError(String),

    /// Failed to load the generated document
    #[error("Failed to load document: {0}")]
    LoadError(String),

    /// The page reported an error before the layout finished
    #[error("Layout failed: {0}")]
    LayoutError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Failed to serialize the data embedded in the document
    #[error("Failed to serialize document data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Screenshot capture failed
    #[error("Capture failed: {0}")]
    CaptureError(String),

    /// Writing the captured image to disk failed
    #[error("Failed to write image to {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse error categories, one per stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied words that cannot be normalized
    InvalidInput,
    /// Caller supplied options that cannot be rendered
    Config,
    /// The rendering environment could not be started
    Launch,
    /// The document did not load or its layout never completed
    DocumentLoad,
    /// The screenshot or the file write failed
    Capture,
}

impl Error {
    /// The pipeline stage this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInputType(_) | Error::InvalidWeight { .. } => ErrorKind::InvalidInput,
            Error::ConfigError(_) => ErrorKind::Config,
            Error::LaunchError(_) => ErrorKind::Launch,
            Error::LoadError(_)
            | Error::LayoutError(_)
            | Error::Timeout(_)
            | Error::Serialization(_) => ErrorKind::DocumentLoad,
            Error::CaptureError(_) | Error::WriteError { .. } => ErrorKind::Capture,
        }
    }
}

// Lets infallible `From` conversions flow through the same `TryInto` bound as
// fallible ones.
impl From<std::convert::Infallible> for Error {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
