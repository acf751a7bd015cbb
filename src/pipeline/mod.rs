//! Upload pipeline: classification, extraction, summarization, and view state.

mod service;
pub mod types;

pub use service::{PipelineApi, UploadPipeline};
pub use types::{
    PipelineError, PipelineState, PipelineStatus, ProcessedDocument, SummaryLength, UploadRequest,
};
