//! Turning uploaded bytes into plain text.
//!
//! Classification happens exactly once per upload: the declared media type is
//! mapped into a closed [`DocumentKind`], and the matching extractor runs.
//! Files that are neither PDFs nor images legitimately produce an empty
//! string; the pipeline still forwards them to summarization.

pub mod ocr;
pub mod pdf;

pub use ocr::{ImageTextExtractor, OcrClientError, get_image_text_extractor};

use crate::pipeline::UploadRequest;
use thiserror::Error;

/// Closed classification of an upload, decided once from its declared media type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    /// Media type is exactly `application/pdf`.
    Pdf,
    /// Media type starts with `image/`.
    Image,
    /// Anything else; extraction yields an empty string.
    Unrecognized,
}

impl DocumentKind {
    /// Classify a declared media type.
    ///
    /// Matching is literal: byte-exact `application/pdf`, prefix `image/`, no
    /// case folding and no parameter stripping.
    pub fn classify(media_type: &str) -> Self {
        if media_type == "application/pdf" {
            Self::Pdf
        } else if media_type.starts_with("image/") {
            Self::Image
        } else {
            Self::Unrecognized
        }
    }
}

/// Errors produced while extracting text from an upload.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Document is encrypted and cannot be read.
    #[error("PDF is encrypted")]
    Encrypted,
    /// Bytes could not be parsed as a PDF document.
    #[error("Failed to parse PDF: {0}")]
    PdfParse(String),
    /// One page's content stream could not be decoded.
    #[error("Failed to extract text from PDF page {page}: {message}")]
    PdfPage {
        /// 1-based page number that failed.
        page: u32,
        /// Parser diagnostic for the failure.
        message: String,
    },
    /// Image transcription call failed.
    #[error("Image transcription failed: {0}")]
    Ocr(#[from] OcrClientError),
}

/// Extract plain text from an upload according to its [`DocumentKind`].
///
/// Image transcriptions are passed through untransformed.
pub async fn extract(
    upload: &UploadRequest,
    images: &dyn ImageTextExtractor,
) -> Result<String, ExtractionError> {
    match DocumentKind::classify(&upload.media_type) {
        DocumentKind::Pdf => pdf::extract_text(&upload.bytes),
        DocumentKind::Image => Ok(images.extract_text(upload).await?),
        DocumentKind::Unrecognized => Ok(String::new()),
    }
}
