//! Error types for the gemtracker-extract library.
//!
//! Three distinct error types reflect three distinct failure surfaces:
//!
//! * [`ExtractError`] — **Terminal** for the PDF path: the document yielded
//!   no bid number after every stage of the fallback chain ran, the file
//!   could not be read at all, or the configuration was rejected. Returned
//!   as `Err(ExtractError)` from the top-level `extract*` functions.
//!
//! * [`ScreenshotError`] — the three caller-distinguishable failure modes
//!   of the screenshot path (no credential, aliases exhausted, unparseable
//!   model output). There is no deterministic fallback for images, so these
//!   are terminal for that path.
//!
//! * [`InferenceError`] — a single model call failed. Inside the PDF chain
//!   these are always recovered into a stage report and the chain continues;
//!   the screenshot path maps them onto [`ScreenshotError`] variants.
//!
//! The separation keeps the propagation rule honest: collaborator failures
//! never escape the PDF chain, only the chain's own verdict does.

use std::path::PathBuf;
use thiserror::Error;

/// All terminal errors returned by the PDF extraction path.
///
/// Stage-level failures (a regex miss, a failed model call) are recorded in
/// [`crate::output::StageReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Chain verdict ─────────────────────────────────────────────────────
    /// Every stage ran and none produced a bid number.
    #[error(
        "Could not extract a bid number from '{file}'.\n\
         The document matched no label pattern, AI extraction was skipped or \
         found nothing, and the file name does not start with 'GEM'.\n\
         Rename the file to its bid number (e.g. GEM_2025_B_1234567.pdf) or \
         configure an API key for AI extraction."
    )]
    Unparseable { file: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The document could not be read from disk before the chain started.
    #[error(
        "Failed to read PDF file '{}': {source}\nCheck the path exists and is readable.",
        path.display()
    )]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure modes of the screenshot path.
///
/// Each variant is meaningful to the caller: a missing credential is a
/// deployment problem, exhausted aliases a service outage, a malformed
/// response a model-quality problem. An HTTP layer would map them to
/// distinct status codes.
#[derive(Debug, Error)]
pub enum ScreenshotError {
    /// No inference client could be resolved; the screenshot path has no
    /// deterministic fallback to fall through to.
    #[error(
        "No inference credential configured for screenshot analysis.\n\
         Set GEMINI_API_KEY (or GOOGLE_API_KEY) or pass an explicit api_key."
    )]
    MissingCredential,

    /// Every configured model alias failed or answered with empty text.
    #[error(
        "Screenshot analysis failed: all {models_tried} model aliases exhausted.\n\
         Last error: {detail}"
    )]
    ServiceUnavailable { models_tried: usize, detail: String },

    /// The model answered, but the reply was not a JSON array of bid records.
    #[error("Screenshot analysis returned an unparseable response: {detail}")]
    MalformedResponse { detail: String },
}

/// An error from a single inference call against one model alias.
///
/// Recovered inside the PDF chain; surfaced (mapped) by the screenshot path.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The endpoint answered with a non-success status code.
    #[error("Model '{model}' returned HTTP {status}: {detail}")]
    Http {
        model: String,
        status: u16,
        detail: String,
    },

    /// The request never completed (DNS, TLS, timeout, connection reset).
    #[error("Transport error calling model '{model}': {source}")]
    Transport {
        model: String,
        #[source]
        source: reqwest::Error,
    },

    /// The call succeeded but the candidate text was empty.
    #[error("Model '{model}' returned an empty response")]
    EmptyResponse { model: String },

    /// The whole alias list was walked without a usable response.
    #[error("All {attempts} model aliases failed; last error: {last}")]
    Exhausted { attempts: usize, last: String },
}
