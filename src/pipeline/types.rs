//! Core data types and error definitions for the upload pipeline.

use crate::extraction::ExtractionError;
use crate::summarizer::SummarizationClientError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A file received from a client, held only until extraction consumes it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Display name reported by the uploader, forwarded verbatim to summarization.
    pub file_name: String,
    /// Declared media type, e.g. `application/pdf` or `image/png`.
    pub media_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// Summary length requested for a submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    /// A couple of sentences.
    Short,
    /// A few paragraphs.
    #[default]
    Medium,
    /// A detailed, sectioned summary.
    Long,
}

impl std::str::FromStr for SummaryLength {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            _ => Err(()),
        }
    }
}

/// Finished document returned by the summarization service.
///
/// Instances are created exclusively by the service and never modified after
/// receipt; each successful submission replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    /// Name of the originating upload.
    pub name: String,
    /// Full text recovered from the upload.
    pub content: String,
    /// Abstractive summary of the content.
    pub summary: String,
    /// Comprehension challenges derived from the content, in service order.
    pub challenges: Vec<String>,
}

/// Pipeline state. Holding the document inside `Ready` makes "processing with
/// a displayed document" unrepresentable.
#[derive(Debug, Clone, Default)]
pub enum PipelineState {
    /// Nothing loaded and nothing running.
    #[default]
    Idle,
    /// A submission is being extracted or summarized.
    Processing,
    /// The latest submission finished; its document is displayed.
    Ready(ProcessedDocument),
}

impl PipelineState {
    /// Payload-free view of the state for reporting surfaces.
    pub fn status(&self) -> PipelineStatus {
        match self {
            Self::Idle => PipelineStatus::Idle,
            Self::Processing => PipelineStatus::Processing,
            Self::Ready(_) => PipelineStatus::Ready,
        }
    }
}

/// Wire representation of the pipeline state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    /// Nothing loaded and nothing running.
    Idle,
    /// A submission is in flight.
    Processing,
    /// A processed document is available.
    Ready,
}

/// Errors produced while turning an upload into a processed document.
///
/// These never escape [`crate::pipeline::UploadPipeline::submit`]; the
/// pipeline converts them into destructive notifications.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Text extraction from the upload failed.
    #[error("Failed to extract document text: {0}")]
    Extraction(#[from] ExtractionError),
    /// Summarization service rejected or failed the request.
    #[error("Failed to summarize document: {0}")]
    Summarization(#[from] SummarizationClientError),
}
