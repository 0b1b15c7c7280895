//! Error types for the vocab2post library.
//!
//! Two types reflect the two places a failure is observed:
//!
//! * [`Vocab2PostError`]: the error a single stage returns (download failed,
//!   PDF unreadable, model output not parseable, CMS rejected the post).
//!
//! * [`JobFailure`]: the orchestrator's wrapper around a stage error. It
//!   records *which* stage failed and how many posts had already gone out,
//!   so the one log line written for a failed job is enough to diagnose it.
//!
//! Every variant belongs to one family of the pipeline taxonomy, reported by
//! [`Vocab2PostError::kind`] and attached to log records as `error_kind`.

use crate::output::JobStage;
use thiserror::Error;

/// All errors a pipeline stage can return.
#[derive(Debug, Error)]
pub enum Vocab2PostError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The document request failed or the host answered with a non-2xx status.
    #[error("Failed to download '{url}': {reason}")]
    Fetch { url: String, reason: String },

    /// The document download exceeded its timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    FetchTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The downloaded bytes are not a PDF.
    #[error("Document is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// pdfium could not open or read the document.
    #[error("PDF text extraction failed: {detail}")]
    Extraction { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    /// Extraction produced text but no vocabulary words were found in it.
    #[error("No vocabulary words found in the document")]
    NoVocabulary,

    // ── Generative service errors ─────────────────────────────────────────
    /// The generative service could not be reached or returned an error status.
    #[error("Generative service error: {message}")]
    Generation { message: String },

    /// The generative service call exceeded its timeout.
    #[error("Generative service call timed out after {secs}s")]
    GenerationTimeout { secs: u64 },

    /// The model's reply did not contain the expected JSON object.
    #[error("Could not parse model response: {detail}")]
    ResponseParse { detail: String },

    // ── Publish errors ────────────────────────────────────────────────────
    /// The CMS rejected the post or could not be reached.
    #[error("Publishing failed{}: {detail}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Publish { status: Option<u16>, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Vocab2PostError {
    /// Taxonomy family of this error, used as the `error_kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } | Self::FetchTimeout { .. } => "FetchError",
            Self::NotAPdf { .. }
            | Self::Extraction { .. }
            | Self::PdfiumBindingFailed(_)
            | Self::NoVocabulary => "ExtractionError",
            Self::Generation { .. } | Self::GenerationTimeout { .. } => "GenerationError",
            Self::ResponseParse { .. } => "ResponseParseError",
            Self::Publish { .. } => "PublishError",
            Self::InvalidConfig(_) => "ConfigError",
            Self::Internal(_) => "InternalError",
        }
    }
}

/// A job that stopped before reaching [`JobStage::Done`].
///
/// Posts published before the failure are not rolled back; `published`
/// says how many there were.
#[derive(Debug, Error)]
#[error("job for '{url}' failed while {stage} ({published} post(s) already published): {source}")]
pub struct JobFailure {
    pub url: String,
    pub stage: JobStage,
    pub published: usize,
    #[source]
    pub source: Vocab2PostError,
}
