#![deny(missing_docs)]

//! Core library for the Doc Digest upload-to-summary server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Media-type classification and text extraction (PDF text layer, image OCR).
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Submission counters and snapshots.
pub mod metrics;
/// Transient notifications and their broadcast fan-out.
pub mod notify;
/// Upload pipeline coordinating extraction, summarization, and view state.
pub mod pipeline;
/// Summarization service client abstraction and HTTP adapter.
pub mod summarizer;
