//! Client for the external summarization service.
//!
//! The service receives the upload's name, the extracted text, and the
//! requested summary length, and responds with the finished document record.
//! Like the other adapters, the pipeline consumes it through a narrow async
//! trait so tests can substitute a stub.

use crate::config::get_config;
use crate::pipeline::{ProcessedDocument, SummaryLength};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced while requesting a summary.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Service was unreachable or the endpoint does not exist.
    #[error("Summarization service unavailable: {0}")]
    ProviderUnavailable(String),
    /// Service returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Service response could not be parsed.
    #[error("Malformed service response: {0}")]
    InvalidResponse(String),
}

/// Request payload forwarded to the summarization service.
#[derive(Debug, Clone, Serialize)]
pub struct SummarizationRequest {
    /// Display name of the upload.
    pub name: String,
    /// Extracted document text; may be empty.
    pub content: String,
    /// Requested summary length.
    pub summary_length: SummaryLength,
}

/// Interface implemented by summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Produce a processed document for the given request.
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<ProcessedDocument, SummarizationClientError>;
}

/// Build a summarization client pointing at the configured service.
pub fn get_summarization_client() -> Box<dyn SummarizationClient + Send + Sync> {
    let config = get_config();
    Box::new(HttpSummarizationClient::new(config.summarizer_url.clone()))
}

struct HttpSummarizationClient {
    http: Client,
    base_url: String,
}

impl HttpSummarizationClient {
    fn new(base_url: String) -> Self {
        let http = Client::builder()
            .user_agent("docdigest/summarizer")
            .build()
            .expect("Failed to construct reqwest::Client for summarization");
        Self { http, base_url }
    }

    fn endpoint(&self) -> String {
        format!("{}/summarize", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SummarizationClient for HttpSummarizationClient {
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<ProcessedDocument, SummarizationClientError> {
        let response = self
            .http
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach summarization service at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "summarization endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "summarization service returned {status}: {body}"
            )));
        }

        response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode summarization response: {error}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn test_client(base_url: String) -> HttpSummarizationClient {
        HttpSummarizationClient {
            http: Client::builder()
                .user_agent("docdigest-test")
                .build()
                .expect("client"),
            base_url,
        }
    }

    fn request() -> SummarizationRequest {
        SummarizationRequest {
            name: "report.pdf".into(),
            content: "Quarterly results.".into(),
            summary_length: SummaryLength::Long,
        }
    }

    #[tokio::test]
    async fn summarize_decodes_processed_document() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/summarize")
                    .body_contains("\"summary_length\":\"long\"");
                then.status(200).json_body(json!({
                    "name": "report.pdf",
                    "content": "Quarterly results.",
                    "summary": "Revenue grew.",
                    "challenges": ["What drove growth?"]
                }));
            })
            .await;

        let document = client.summarize(request()).await.expect("document");

        mock.assert();
        assert_eq!(document.name, "report.pdf");
        assert_eq!(document.summary, "Revenue grew.");
        assert_eq!(document.challenges, vec!["What drove growth?".to_string()]);
    }

    #[tokio::test]
    async fn missing_endpoint_is_provider_unavailable() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/summarize");
                then.status(404);
            })
            .await;

        let error = client.summarize(request()).await.expect_err("missing endpoint");

        assert!(matches!(
            error,
            SummarizationClientError::ProviderUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start_async().await;
        let client = test_client(server.base_url());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/summarize");
                then.status(200).json_body(json!({ "summary": 3 }));
            })
            .await;

        let error = client.summarize(request()).await.expect_err("bad body");

        assert!(matches!(
            error,
            SummarizationClientError::InvalidResponse(_)
        ));
    }
}
