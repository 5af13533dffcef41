//! Error types for the paper-storyteller library.
//!
//! Only *fatal* conditions live in [`StorytellerError`] — the run cannot
//! produce a document at all (unknown paper, missing credential, missing
//! detector model, unreadable PDF). Everything that merely degrades the
//! output — a narrative call failing, an illustration slot staying empty,
//! the Method section not being found — is expressed as `Option`/default
//! values at the call site plus a `tracing::warn!`, so one bad section
//! never costs the whole page.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the paper-storyteller library.
#[derive(Debug, Error)]
pub enum StorytellerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input string contains no recognisable arXiv identifier.
    #[error("Could not extract an arXiv ID from '{input}'\nExpected e.g. 1512.03385 or https://arxiv.org/abs/1512.03385")]
    InvalidArxivId { input: String },

    /// The arXiv catalog has no record for this identifier.
    #[error("Paper not found on arXiv: {arxiv_id}")]
    PaperNotFound { arxiv_id: String },

    /// Metadata fetch or PDF download failed at the transport layer.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// The downloaded file is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// The PDF cannot be opened or parsed.
    #[error("PDF '{path}' could not be opened: {detail}")]
    DocumentIo { path: PathBuf, detail: String },

    /// A page index beyond the document's page count was requested.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium returned an error rendering a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    // ── Detector errors ───────────────────────────────────────────────────
    /// Required layout-model artifacts are missing on disk.
    ///
    /// Raised before any inference is attempted so the user gets a download
    /// instruction instead of an ONNX runtime crash.
    #[error(
        "Layout model files missing from '{model_dir}': {missing:?}\n\
         Download the DocLayout-YOLO ONNX export from HuggingFace and place it there,\n\
         or point --model-dir at an existing copy."
    )]
    ModelUnavailable {
        model_dir: PathBuf,
        missing: Vec<String>,
    },

    /// The ONNX session failed to build or run.
    #[error("Layout detector failure: {0}")]
    Detector(String),

    // ── Generation errors ─────────────────────────────────────────────────
    /// No API credential could be resolved from flag or environment.
    #[error(
        "No API key provided.\n\
         Pass --api-key or set GEMINI_API_KEY (or GOOGLE_API_KEY) in the environment."
    )]
    MissingApiKey,

    /// The generation API rejected a request with a non-transport error.
    #[error("Generation API error: {message}")]
    ApiError { message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
