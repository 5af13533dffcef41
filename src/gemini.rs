//! Thin client for the Gemini REST API.
//!
//! Three capabilities, each a single HTTP call with no retry:
//!
//! * text generation (`generateContent`)
//! * multimodal text generation (prompt + inline PNG)
//! * image generation — `generateContent` with the IMAGE response modality,
//!   plus the Imagen `predict` endpoint used as the caller's fallback path
//!
//! Errors here are plain `Result`s; whether a failed call is fatal or just
//! degrades one section of the document is the caller's decision.

use crate::config::StorytellerConfig;
use crate::error::StorytellerError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client, shared by the narrative and illustration generators.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    text_model: String,
    image_model: String,
    image_fallback_model: String,
}

impl GeminiClient {
    pub fn new(config: &StorytellerConfig) -> Result<Self, StorytellerError> {
        if config.api_key.is_empty() {
            return Err(StorytellerError::MissingApiKey);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| StorytellerError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            image_fallback_model: config.image_fallback_model.clone(),
        })
    }

    /// One prompt → generated text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, StorytellerError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let response: GenerateContentResponse =
            self.post(&self.text_model, "generateContent", &body).await?;
        response
            .first_text()
            .ok_or_else(|| StorytellerError::ApiError {
                message: "model returned no text".into(),
            })
    }

    /// Prompt plus an inline PNG (multimodal) → generated text.
    pub async fn generate_text_with_image(
        &self,
        prompt: &str,
        png_bytes: &[u8],
    ) -> Result<String, StorytellerError> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "inline_data": {
                        "mime_type": "image/png",
                        "data": BASE64.encode(png_bytes),
                    }}
                ]
            }]
        });
        let response: GenerateContentResponse =
            self.post(&self.text_model, "generateContent", &body).await?;
        response
            .first_text()
            .ok_or_else(|| StorytellerError::ApiError {
                message: "model returned no text".into(),
            })
    }

    /// Prompt → raw image bytes via the image-capable Gemini model.
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<Vec<u8>, StorytellerError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": { "aspectRatio": aspect_ratio },
            }
        });
        let response: GenerateContentResponse =
            self.post(&self.image_model, "generateContent", &body).await?;
        let data = response
            .first_inline_data()
            .ok_or_else(|| StorytellerError::ApiError {
                message: "model returned no image".into(),
            })?;
        BASE64
            .decode(data)
            .map_err(|e| StorytellerError::ApiError {
                message: format!("undecodable image payload: {e}"),
            })
    }

    /// Prompt → raw image bytes via the Imagen `predict` endpoint.
    pub async fn generate_image_fallback(
        &self,
        prompt: &str,
    ) -> Result<Vec<u8>, StorytellerError> {
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": { "sampleCount": 1, "outputMimeType": "image/png" }
        });
        let response: PredictResponse = self
            .post(&self.image_fallback_model, "predict", &body)
            .await?;
        let data = response
            .predictions
            .unwrap_or_default()
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded)
            .ok_or_else(|| StorytellerError::ApiError {
                message: "predict returned no image".into(),
            })?;
        BASE64
            .decode(data)
            .map_err(|e| StorytellerError::ApiError {
                message: format!("undecodable image payload: {e}"),
            })
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        model: &str,
        verb: &str,
        body: &serde_json::Value,
    ) -> Result<T, StorytellerError> {
        let url = format!("{API_BASE}/{model}:{verb}");
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| StorytellerError::ApiError {
                message: format!("{model}:{verb} transport: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let excerpt: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(300)
                .collect();
            return Err(StorytellerError::ApiError {
                message: format!("{model}:{verb} HTTP {status}: {excerpt}"),
            });
        }

        response.json().await.map_err(|e| StorytellerError::ApiError {
            message: format!("{model}:{verb} response decode: {e}"),
        })
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: String,
}

impl GenerateContentResponse {
    fn parts(self) -> Vec<Part> {
        self.candidates
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts.unwrap_or_default())
            .collect()
    }

    fn first_text(self) -> Option<String> {
        self.parts()
            .into_iter()
            .find_map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
    }

    fn first_inline_data(self) -> Option<String> {
        self.parts()
            .into_iter()
            .find_map(|p| p.inline_data.map(|d| d.data))
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        let config = StorytellerConfig::default();
        assert!(matches!(
            GeminiClient::new(&config),
            Err(StorytellerError::MissingApiKey)
        ));
    }

    #[test]
    fn response_text_extraction() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.first_text().as_deref(), Some("hello"));
    }

    #[test]
    fn response_inline_data_extraction() {
        let raw = r#"{"candidates":[{"content":{"parts":[
            {"text":"here you go"},
            {"inlineData":{"mimeType":"image/png","data":"QUJD"}}
        ]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.first_inline_data().as_deref(), Some("QUJD"));
    }

    #[test]
    fn empty_candidates_yield_none() {
        let resp: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(resp.first_text().is_none());
    }

    #[test]
    fn predict_response_extraction() {
        let raw = r#"{"predictions":[{"bytesBase64Encoded":"QUJD","mimeType":"image/png"}]}"#;
        let resp: PredictResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            resp.predictions.unwrap()[0].bytes_base64_encoded.as_deref(),
            Some("QUJD")
        );
    }
}
