//! Generation outcome type and the generator seam.

use crate::encode::EncodedPart;
use async_trait::async_trait;

/// Result of a generation attempt.
///
/// Exactly one variant is ever produced. Every error condition — transport
/// faults, malformed responses, model refusals — collapses into `Failure`;
/// a generator never panics and never leaves an attempt pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The model produced an edited image.
    Success {
        /// `data:` URI (`data:<mime>;base64,<payload>`), ready for display.
        image: String,
    },
    /// The attempt failed.
    Failure {
        /// Human-readable failure description.
        message: String,
    },
}

impl GenerationOutcome {
    /// Returns true for the `Success` variant.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Trait for services that turn an encoded image plus an edit instruction
/// into a [`GenerationOutcome`].
///
/// One outbound call per invocation, no automatic retries; retry is a caller
/// decision.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Runs one generation attempt against the remote service.
    async fn generate(&self, image: &EncodedPart, instruction: &str) -> GenerationOutcome;
}

/// Builds a `data:` URI from a mime type and base64 payload.
pub(crate) fn data_uri(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}
