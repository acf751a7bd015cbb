//! Upload pipeline coordinating extraction, summarization, and view state.

use crate::{
    extraction::{self, ImageTextExtractor},
    metrics::{MetricsSnapshot, PipelineMetrics},
    notify::{Notification, NotificationSink},
    pipeline::types::{
        PipelineError, PipelineState, PipelineStatus, ProcessedDocument, SummaryLength,
        UploadRequest,
    },
    summarizer::{SummarizationClient, SummarizationRequest},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Coordinates the full upload pipeline: classification, extraction,
/// summarization, and republishing the outcome as view state.
///
/// The pipeline owns long-lived handles to the extraction and summarization
/// clients plus the notification sink, so the HTTP surface and tests share one
/// implementation. Construct it once near process start and share it through
/// an `Arc`.
pub struct UploadPipeline {
    image_extractor: Box<dyn ImageTextExtractor + Send + Sync>,
    summarizer: Box<dyn SummarizationClient + Send + Sync>,
    notifications: Arc<dyn NotificationSink>,
    state: RwLock<PipelineState>,
    submissions: AtomicU64,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the upload pipeline used by external surfaces (HTTP, tests).
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Run one submission to completion. Failures are reported through
    /// notifications, never returned.
    async fn submit(&self, upload: UploadRequest, summary_length: SummaryLength);

    /// Clear the displayed document, if any.
    fn reset(&self);

    /// Current payload-free pipeline status.
    fn status(&self) -> PipelineStatus;

    /// Currently displayed document, when the pipeline is ready.
    fn active_document(&self) -> Option<ProcessedDocument>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl UploadPipeline {
    /// Build a new pipeline around the given extraction and summarization clients.
    pub fn new(
        image_extractor: Box<dyn ImageTextExtractor + Send + Sync>,
        summarizer: Box<dyn SummarizationClient + Send + Sync>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            image_extractor,
            summarizer,
            notifications,
            state: RwLock::new(PipelineState::Idle),
            submissions: AtomicU64::new(0),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Run one submission end to end.
    ///
    /// Every failure is caught here and converted into a destructive
    /// notification; errors never reach the caller. When submissions overlap,
    /// the most recently started one owns the final state and the outcomes of
    /// older ones are discarded.
    pub async fn submit(&self, upload: UploadRequest, summary_length: SummaryLength) {
        let ticket = self.begin_submission();
        self.notifications.publish(Notification::info(
            "Processing Document...",
            "Extracting content. Please wait...",
        ));
        tracing::info!(
            file = %upload.file_name,
            media_type = %upload.media_type,
            size_bytes = upload.bytes.len(),
            summary_length = ?summary_length,
            "Processing upload"
        );

        match self.run(&upload, summary_length).await {
            Ok(document) => {
                let content_chars = document.content.chars().count() as u64;
                if !self.finish_submission(ticket, PipelineState::Ready(document)) {
                    tracing::debug!(file = %upload.file_name, "Discarding superseded submission");
                    return;
                }
                self.metrics.record_success(content_chars);
                self.notifications.publish(Notification::info(
                    "Processing Complete!",
                    "Your document is ready.",
                ));
                tracing::info!(file = %upload.file_name, "Document ready");
            }
            Err(error) => {
                if !self.finish_submission(ticket, PipelineState::Idle) {
                    tracing::debug!(file = %upload.file_name, "Discarding superseded submission");
                    return;
                }
                self.metrics.record_failure();
                tracing::warn!(file = %upload.file_name, error = %error, "Processing failed");
                self.notifications
                    .publish(Notification::destructive("Processing Failed", failure_message(&error)));
            }
        }
    }

    /// Clear the displayed document.
    ///
    /// `Ready` returns to `Idle`. During `Processing` there is nothing
    /// displayed to clear and in-flight work is not cancelled, so the call
    /// leaves the state alone.
    pub fn reset(&self) {
        let mut state = self.state.write().expect("Pipeline state lock poisoned");
        if matches!(*state, PipelineState::Ready(_)) {
            *state = PipelineState::Idle;
            tracing::info!("Cleared displayed document");
        }
    }

    /// Current payload-free pipeline status.
    pub fn status(&self) -> PipelineStatus {
        self.state
            .read()
            .expect("Pipeline state lock poisoned")
            .status()
    }

    /// Currently displayed document, when the pipeline is ready.
    pub fn active_document(&self) -> Option<ProcessedDocument> {
        match &*self.state.read().expect("Pipeline state lock poisoned") {
            PipelineState::Ready(document) => Some(document.clone()),
            _ => None,
        }
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn run(
        &self,
        upload: &UploadRequest,
        summary_length: SummaryLength,
    ) -> Result<ProcessedDocument, PipelineError> {
        let content = extraction::extract(upload, self.image_extractor.as_ref()).await?;
        tracing::debug!(
            file = %upload.file_name,
            content_chars = content.chars().count(),
            "Extraction finished"
        );
        let document = self
            .summarizer
            .summarize(SummarizationRequest {
                name: upload.file_name.clone(),
                content,
                summary_length,
            })
            .await?;
        Ok(document)
    }

    fn begin_submission(&self) -> u64 {
        let mut state = self.state.write().expect("Pipeline state lock poisoned");
        let ticket = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        *state = PipelineState::Processing;
        ticket
    }

    // Ticket issuance and state writes share the lock, so a stale completion
    // can never land after a newer submission has begun.
    fn finish_submission(&self, ticket: u64, outcome: PipelineState) -> bool {
        let mut state = self.state.write().expect("Pipeline state lock poisoned");
        if self.submissions.load(Ordering::SeqCst) != ticket {
            return false;
        }
        *state = outcome;
        true
    }
}

fn failure_message(error: &PipelineError) -> String {
    let message = error.to_string();
    if message.is_empty() {
        "Unexpected error occurred.".to_string()
    } else {
        message
    }
}

#[async_trait]
impl PipelineApi for UploadPipeline {
    async fn submit(&self, upload: UploadRequest, summary_length: SummaryLength) {
        UploadPipeline::submit(self, upload, summary_length).await;
    }

    fn reset(&self) {
        UploadPipeline::reset(self);
    }

    fn status(&self) -> PipelineStatus {
        UploadPipeline::status(self)
    }

    fn active_document(&self) -> Option<ProcessedDocument> {
        UploadPipeline::active_document(self)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        UploadPipeline::metrics_snapshot(self)
    }
}
