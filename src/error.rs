//! Error types for the edit session core.

/// Errors that can occur while preparing or running a generation attempt.
///
/// Every variant collapses into a plain failure message at the
/// [`ImageGenerator`](crate::ImageGenerator) boundary; the session never
/// distinguishes between them.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// The input resource could not be read, or produced no data.
    #[error("failed to read image data: {0}")]
    Read(String),

    /// API key missing at build time.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        message: String,
    },

    /// The model answered with text instead of an image.
    #[error("model returned text instead of an image: \"{0}\"")]
    Refusal(String),

    /// The response carried no image and no text at all.
    #[error("no image data received from the model")]
    EmptyResponse,

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (e.g., loading the input file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for edit session operations.
pub type Result<T> = std::result::Result<T, EditError>;
