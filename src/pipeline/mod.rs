//! Pipeline stages for tender field extraction.
//!
//! Each submodule implements exactly one step. Keeping stages separate
//! makes each independently testable and lets the orchestrator reorder or
//! gate them without any stage knowing about the chain it runs in.
//!
//! ## Data Flow
//!
//! ```text
//! bytes ──▶ pages ──▶ patterns ──▶ ai ──▶ (filename) ──▶ subject
//!           (lopdf)   (regex)      (Gemini)  in extract    (≤10 words)
//! ```
//!
//! 1. [`pages`]    — read the leading pages' text; runs in `spawn_blocking`
//!    because PDF parsing is CPU-bound; never fails the caller
//! 2. [`patterns`] — deterministic bilingual label rules; the primary stage
//! 3. [`ai`]       — model-backed extraction of the same three fields; the
//!    only stage with network I/O; gated on a missing bid number and a
//!    resolvable client
//! 4. [`subject`]  — derive the ten-word subject from the category
//! 5. [`fence`]    — unwrap code-fenced model replies before JSON parsing
//!    (shared with the screenshot path)
//!
//! The filename heuristic has no module of its own; it is three lines in
//! the orchestrator (`crate::extract`).

pub mod ai;
pub mod fence;
pub mod pages;
pub mod patterns;
pub mod subject;
