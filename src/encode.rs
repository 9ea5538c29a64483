//! Binary-to-text encoding of the input image for transport.

use crate::error::{EditError, Result};
use base64::Engine;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A transport-safe image payload: base64 content plus its declared media type.
///
/// Produced once per generation attempt and discarded when the attempt
/// completes; never stored on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPart {
    /// Base64-encoded image bytes (standard alphabet, padded).
    pub data: String,
    /// Media type declared by the source resource, carried verbatim.
    pub mime_type: String,
}

/// Reads a file-like resource to completion and base64-encodes its bytes.
///
/// The media type is taken from the resource's declaration, never sniffed
/// from content. Fails with [`EditError::Read`] if the read errors or
/// completes without producing any data.
pub async fn encode<R>(mut resource: R, media_type: impl Into<String>) -> Result<EncodedPart>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    resource
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| EditError::Read(e.to_string()))?;

    if bytes.is_empty() {
        return Err(EditError::Read("resource produced no data".into()));
    }

    Ok(EncodedPart {
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        mime_type: media_type.into(),
    })
}
