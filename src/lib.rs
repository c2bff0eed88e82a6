//! # gemtracker-extract
//!
//! Extract structured bid metadata from GeM (Government e-Marketplace)
//! tender documents and portal screenshots.
//!
//! ## Why this crate?
//!
//! GeM bid sheets are generated PDFs with a stable bilingual header block,
//! so most of the time a handful of label patterns recover the bid number,
//! end date and item category for free. But real uploads are messy:
//! scanned copies, re-exported files, renamed downloads. Instead of giving
//! up on those, a fallback chain keeps going — model-backed extraction
//! when the patterns miss, and the portal's own file-naming convention as
//! a last resort — and tells you exactly which stage produced what.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Pages     read leading-page text via lopdf (never fails)
//!  ├─ 2. Pattern   bilingual label regexes: bid no. / end date / category
//!  ├─ 3. Inference Gemini generateContent, only if the bid no. is missing
//!  ├─ 4. Filename  GEM-prefixed file stem as the bid number, last resort
//!  └─ 5. Output    fields + ten-word subject + 28-item checklist + stage log
//! ```
//!
//! A portal screenshot takes the short path: prompt + inline image to the
//! model, reply parsed into [`ScreenshotBid`] records. No fallback exists
//! for images, so its three failure modes stay distinct and typed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gemtracker_extract::{extract, ExtractorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential auto-detected from GEMINI_API_KEY / GOOGLE_API_KEY;
//!     // without one the chain still runs its deterministic stages.
//!     let config = ExtractorConfig::default();
//!     let out = extract("GEM_2025_B_6477908.pdf", &config).await?;
//!     println!("bid:      {}", out.fields.bid_number.as_deref().unwrap_or("-"));
//!     println!("subject:  {}", out.fields.subject.as_deref().unwrap_or("-"));
//!     println!("checklist entries: {}", out.checklist.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gem-extract` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! gemtracker-extract = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod checklist;
pub mod config;
pub mod error;
pub mod extract;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod screenshot;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use checklist::{checklist_catalog, ChecklistEntry, ChecklistItem, CHECKLIST_CATALOG};
pub use config::{ExtractorConfig, ExtractorConfigBuilder, DEFAULT_MODEL_ALIASES};
pub use error::{ExtractError, InferenceError, ScreenshotError};
pub use extract::{extract, extract_batch, extract_from_bytes};
pub use inference::{
    generate_with_fallback, GeminiClient, InferenceClient, InferenceRequest, InlineImage,
};
pub use output::{
    BatchReport, DocumentOutcome, EvaluationStage, ExtractedFields, FieldKind, ScreenshotBid,
    SkipReason, Stage, StageOutcome, StageReport, TenderExtraction, BID_DATE_FORMAT,
};
pub use screenshot::extract_from_screenshot;
