//! Gemini client — the single point of entry for all generative-model calls.
//!
//! No other module may talk to the Generative Language API directly; the
//! analysis handlers reach it through the [`VisionModel`] trait so tests can
//! substitute a fake backend. One call maps to one upstream request: the
//! caller blocks until the model responds or the client timeout elapses, and
//! no retry or backoff is attempted.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model used when the request does not name one.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,
}

/// The generative-model seam: prompt plus optional inline image in, raw
/// response text out. Carried in `AppState` as `Arc<dyn VisionModel>`.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        image_base64: Option<&str>,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// REST client for the Generative Language API.
///
/// Constructed once at startup; the credential is optional because its
/// absence is a per-request structured error, not a startup failure.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.api_key.as_deref().ok_or(LlmError::MissingApiKey)
    }

    /// Lists the models available to the configured credential, passed
    /// through verbatim from the upstream listing.
    pub async fn list_models(&self) -> Result<serde_json::Value, LlmError> {
        let key = self.api_key()?;
        let url = format!("{GEMINI_API_BASE}/models");

        let response = self.client.get(url).query(&[("key", key)]).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        image_base64: Option<&str>,
    ) -> Result<String, LlmError> {
        let key = self.api_key()?;

        let mut parts = vec![Part::Text { text: prompt }];
        if let Some(data) = image_base64 {
            parts.push(Part::Image {
                inline_data: InlineData {
                    mime_type: "image/jpeg",
                    data,
                },
            });
        }
        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let url = format!("{GEMINI_API_BASE}/models/{model}:generateContent");
        let response = self
            .client
            .post(url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<String>();

        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }

        debug!(model, chars = text.len(), "model call succeeded");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape_with_image() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: "describe" },
                    Part::Image {
                        inline_data: InlineData {
                            mime_type: "image/jpeg",
                            data: "QUJD",
                        },
                    },
                ],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "describe");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/jpeg"
        );
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["data"], "QUJD");
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        assert_eq!(text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_a_structured_error() {
        let client = GeminiClient::new(None);
        let err = client.generate(DEFAULT_MODEL, "prompt", None).await;
        assert!(matches!(err, Err(LlmError::MissingApiKey)));
    }
}
