//! Image-to-text transcription backed by an Ollama vision model.
//!
//! The pipeline consumes transcription through a narrow async trait so tests
//! can substitute a stub. The HTTP adapter posts the image to the runtime's
//! `/api/generate` endpoint as a base64 attachment and returns the model's
//! response without reshaping it.

use crate::config::get_config;
use crate::pipeline::UploadRequest;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const DEFAULT_OCR_URL: &str = "http://127.0.0.1:11434";

const TRANSCRIPTION_PROMPT: &str =
    "Transcribe all text visible in this image. Return only the text, with no commentary.";

/// Errors surfaced while transcribing an image upload.
#[derive(Debug, Error)]
pub enum OcrClientError {
    /// Runtime was unreachable or the endpoint does not exist.
    #[error("OCR provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Runtime returned an error response.
    #[error("Failed to transcribe image: {0}")]
    GenerationFailed(String),
    /// Runtime response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by image text extractors.
#[async_trait]
pub trait ImageTextExtractor: Send + Sync {
    /// Recognize and return the text visible in the uploaded image.
    async fn extract_text(&self, upload: &UploadRequest) -> Result<String, OcrClientError>;
}

/// Build an image text extractor based on configuration.
pub fn get_image_text_extractor() -> Box<dyn ImageTextExtractor + Send + Sync> {
    let config = get_config();
    let base_url = config
        .ocr_url
        .clone()
        .unwrap_or_else(|| DEFAULT_OCR_URL.to_string());
    Box::new(OllamaOcrClient::new(base_url, config.ocr_model.clone()))
}

struct OllamaOcrClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaOcrClient {
    fn new(base_url: String, model: String) -> Self {
        let http = Client::builder()
            .user_agent("docdigest/ocr")
            .build()
            .expect("Failed to construct reqwest::Client for OCR");
        Self {
            http,
            base_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl ImageTextExtractor for OllamaOcrClient {
    async fn extract_text(&self, upload: &UploadRequest) -> Result<String, OcrClientError> {
        let payload = json!({
            "model": self.model,
            "prompt": TRANSCRIPTION_PROMPT,
            "images": [BASE64.encode(&upload.bytes)],
            "stream": false,
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                OcrClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OcrClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            OcrClientError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(OcrClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn test_client(base_url: String) -> OllamaOcrClient {
        OllamaOcrClient {
            http: Client::builder()
                .user_agent("docdigest-test")
                .build()
                .expect("client"),
            base_url,
            model: "moondream".into(),
        }
    }

    fn scan_upload() -> UploadRequest {
        UploadRequest {
            file_name: "scan.png".into(),
            media_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[tokio::test]
    async fn ollama_client_returns_transcription_verbatim() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .body_contains("\"model\":\"moondream\"");
                then.status(200).json_body(json!({
                    "response": "Receipt total: 12.80\n",
                    "done": true
                }));
            })
            .await;

        let text = client
            .extract_text(&scan_upload())
            .await
            .expect("transcription");

        mock.assert();
        assert_eq!(text, "Receipt total: 12.80\n");
    }

    #[tokio::test]
    async fn ollama_client_handles_error_status() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client
            .extract_text(&scan_upload())
            .await
            .expect_err("error response");

        assert!(matches!(error, OcrClientError::GenerationFailed(message) if message.contains("500")));
    }

    #[tokio::test]
    async fn incomplete_response_is_rejected() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "partial",
                    "done": false
                }));
            })
            .await;

        let error = client
            .extract_text(&scan_upload())
            .await
            .expect_err("incomplete response");

        assert!(matches!(error, OcrClientError::InvalidResponse(_)));
    }
}
