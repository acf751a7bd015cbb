use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_processed: AtomicU64,
    documents_failed: AtomicU64,
    last_document_chars: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed submission and the character count of its extracted content.
    pub fn record_success(&self, content_chars: u64) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.last_document_chars
            .store(content_chars, Ordering::Relaxed);
    }

    /// Record a submission that ended in a failure notification.
    pub fn record_failure(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let documents_processed = self.documents_processed.load(Ordering::Relaxed);
        MetricsSnapshot {
            documents_processed,
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            last_document_chars: (documents_processed > 0)
                .then(|| self.last_document_chars.load(Ordering::Relaxed)),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of submissions that reached the ready state since startup.
    pub documents_processed: u64,
    /// Number of submissions that ended in a failure notification.
    pub documents_failed: u64,
    /// Extracted character count of the most recent successful submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_document_chars: Option<u64>,
}
