//! Gemini-backed image editing client.

use crate::encode::EncodedPart;
use crate::error::{EditError, Result};
use crate::generate::{data_uri, GenerationOutcome, ImageGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Model used for every attempt: the image-editing-capable Gemini variant.
/// Fixed by configuration, never taken from user input.
pub const EDIT_MODEL: &str = "gemini-2.5-flash-image-preview";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// How many characters of a text-only model reply are carried into the
/// failure message.
const REFUSAL_PREFIX_CHARS: usize = 100;

/// Builder for [`GeminiEditor`].
#[derive(Debug, Clone, Default)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the `GEMINI_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builds the editor, resolving the API key.
    pub fn build(self) -> Result<GeminiEditor> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                EditError::Auth("GEMINI_API_KEY not set and no API key provided".into())
            })?;

        Ok(GeminiEditor {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

/// Client for the Gemini `generateContent` endpoint, specialized to editing
/// an image under a natural-language instruction.
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    async fn generate_impl(&self, image: &EncodedPart, instruction: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", API_BASE, EDIT_MODEL);
        let body = EditRequest::new(image, instruction);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(EditError::Api {
                status: status.as_u16(),
                message: body_text,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body_text)?;
        extract_image(parsed)
    }
}

#[async_trait]
impl ImageGenerator for GeminiEditor {
    async fn generate(&self, image: &EncodedPart, instruction: &str) -> GenerationOutcome {
        match self.generate_impl(image, instruction).await {
            Ok(uri) => GenerationOutcome::Success { image: uri },
            Err(err) => {
                tracing::error!("image generation failed: {err}");
                GenerationOutcome::Failure {
                    message: err.to_string(),
                }
            }
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EditRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

/// A part in the outbound payload - inline image data or instruction text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlinePayload,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlinePayload {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

impl EditRequest {
    fn new(image: &EncodedPart, instruction: &str) -> Self {
        // Image part first, instruction second; the model reads them in order.
        let parts = vec![
            RequestPart::InlineData {
                inline_data: InlinePayload {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            },
            RequestPart::Text {
                text: instruction.to_string(),
            },
        ];

        Self {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".into(), "TEXT".into()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// A response content part. The API interleaves image and text parts; the
/// closed variant set keeps the scan in [`extract_image`] a pattern match.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponsePart {
    Image {
        #[serde(rename = "inlineData")]
        inline_data: InlineImage,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineImage {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

/// Scans the first candidate's parts for an image, then for explanatory text.
fn extract_image(response: GenerateContentResponse) -> Result<String> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    for part in &parts {
        if let ResponsePart::Image { inline_data } = part {
            let mime = inline_data.mime_type.as_deref().unwrap_or("image/png");
            return Ok(data_uri(mime, &inline_data.data));
        }
    }

    // No image anywhere: a text part means the model declined or redirected
    // the request, so carry a prefix of its reply in the failure.
    for part in parts {
        if let ResponsePart::Text { text } = part {
            return Err(EditError::Refusal(truncate_chars(
                &text,
                REFUSAL_PREFIX_CHARS,
            )));
        }
    }

    Err(EditError::EmptyResponse)
}

/// Truncates to at most `limit` characters, marking the cut with an ellipsis.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut prefix: String = text.chars().take(limit).collect();
    prefix.push('…');
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFUSAL_TEXT: &str = "Sorry, I can't do that because of policy reasons and more \
                                explanation text padding to exceed one hundred characters \
                                total length here";

    fn parse(json: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_request_orders_image_before_instruction() {
        let part = EncodedPart {
            data: "QUJD".into(),
            mime_type: "image/png".into(),
        };
        let request = EditRequest::new(&part, "add a hat");
        let json = serde_json::to_value(&request).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "QUJD");
        assert_eq!(parts[1]["text"], "add a hat");
    }

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let part = EncodedPart {
            data: "QQ==".into(),
            mime_type: "image/png".into(),
        };
        let request = EditRequest::new(&part, "brighter");
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("generationConfig").is_some());
        assert!(json.get("generation_config").is_none());
        assert!(json["generationConfig"]["responseModalities"].is_array());
    }

    #[test]
    fn test_inline_image_becomes_data_uri() {
        let resp = parse(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": { "mimeType": "image/jpeg", "data": "QQ==" }
                    }]
                }
            }]
        }));

        let uri = extract_image(resp).unwrap();
        assert_eq!(uri, "data:image/jpeg;base64,QQ==");
    }

    #[test]
    fn test_missing_mime_type_defaults_to_png() {
        let resp = parse(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "data": "QQ==" } }] }
            }]
        }));

        let uri = extract_image(resp).unwrap();
        assert_eq!(uri, "data:image/png;base64,QQ==");
    }

    #[test]
    fn test_first_image_part_wins_over_text() {
        let resp = parse(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your edited image" },
                        { "inlineData": { "mimeType": "image/png", "data": "AA==" } }
                    ]
                }
            }]
        }));

        let uri = extract_image(resp).unwrap();
        assert_eq!(uri, "data:image/png;base64,AA==");
    }

    #[test]
    fn test_text_only_response_is_a_truncated_refusal() {
        let resp = parse(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": REFUSAL_TEXT }] }
            }]
        }));

        let err = extract_image(resp).unwrap_err();
        let expected: String = REFUSAL_TEXT.chars().take(100).collect();
        let message = err.to_string();
        assert!(message.contains(&format!("{expected}…")));
        assert!(!message.contains(REFUSAL_TEXT));
        assert!(matches!(err, EditError::Refusal(_)));
    }

    #[test]
    fn test_short_text_is_embedded_whole() {
        let resp = parse(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "I cannot edit this image." }] }
            }]
        }));

        let err = extract_image(resp).unwrap_err();
        assert!(err.to_string().contains("I cannot edit this image."));
        assert!(!err.to_string().contains('…'));
    }

    #[test]
    fn test_no_candidates_is_an_empty_response() {
        let resp = parse(serde_json::json!({}));
        let err = extract_image(resp).unwrap_err();
        assert!(matches!(err, EditError::EmptyResponse));
        assert!(err.to_string().contains("no image data received"));
    }

    #[test]
    fn test_empty_parts_are_an_empty_response() {
        let resp = parse(serde_json::json!({
            "candidates": [{ "content": { "parts": [{}] } }]
        }));
        let err = extract_image(resp).unwrap_err();
        assert!(matches!(err, EditError::EmptyResponse));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc…");
        // Multibyte input truncates on character boundaries
        assert_eq!(truncate_chars("ééééé", 2), "éé…");
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let editor = GeminiEditor::builder().api_key("test-key").build();
        assert!(editor.is_ok());
    }
}
