//! The PDF extraction chain.
//!
//! ## Chain Overview
//!
//! ```text
//! bytes ──▶ pages ──▶ PATTERN ──▶ INFERENCE ──▶ FILENAME ──▶ verdict
//!                     (always)    (gated)       (gated)
//! ```
//!
//! The deterministic, free stages run first; the model call happens only
//! when the patterns failed to find a bid number and a client could be
//! resolved. Each later stage is additionally gated on the bid number
//! still being unset, and [`ExtractedFields::merge_from`] guarantees no
//! stage overwrites an earlier stage's values.
//!
//! Collaborator failures (a corrupt PDF, a model outage) never escape the
//! chain; they become [`StageOutcome`] entries and the chain falls
//! through. The only failure a caller sees is the chain's own verdict:
//! no stage produced a bid number ⇒ [`ExtractError::Unparseable`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::checklist::checklist_catalog;
use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::inference;
use crate::output::{
    BatchReport, DocumentOutcome, ExtractedFields, FieldKind, SkipReason, Stage, StageOutcome,
    StageReport, TenderExtraction,
};
use crate::pipeline::{ai, pages, patterns, subject};

/// Extract tender fields from a PDF file on disk.
///
/// Reads the file and delegates to [`extract_from_bytes`] with the path's
/// file name (which the FILENAME stage may need). An unreadable path is a
/// pre-chain error, not an unparseable document.
pub async fn extract(
    path: impl AsRef<Path>,
    config: &ExtractorConfig,
) -> Result<TenderExtraction, ExtractError> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ExtractError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    extract_from_bytes(&bytes, &file_name, config).await
}

/// Extract tender fields from an in-memory PDF (upload-shaped input).
///
/// `file_name` is the document's base name as uploaded; the FILENAME stage
/// reads the bid number off it when everything else misses.
pub async fn extract_from_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &ExtractorConfig,
) -> Result<TenderExtraction, ExtractError> {
    let started = Instant::now();
    info!(file = %file_name, bytes = bytes.len(), "starting tender extraction");

    // ── Step 1: Leading-page text ─────────────────────────────────────────
    let page_text = pages::read_leading_pages(bytes.to_vec(), config.page_limit).await;

    let mut fields = ExtractedFields::default();
    let mut stages = Vec::with_capacity(3);

    // ── Step 2: Pattern stage ─────────────────────────────────────────────
    let applied = fields.merge_from(patterns::extract_fields(&page_text));
    stages.push(applied_or_miss(Stage::Pattern, applied));

    // ── Step 3: Inference stage, gated on a missing bid number ────────────
    if fields.bid_number.is_some() {
        stages.push(StageReport::skipped(Stage::Inference, SkipReason::BidAlreadySet));
    } else {
        match inference::resolve_client(config) {
            None => {
                debug!("no inference credential, skipping model stage");
                stages.push(StageReport::skipped(
                    Stage::Inference,
                    SkipReason::MissingCredential,
                ));
            }
            Some(client) => {
                match ai::infer_fields(
                    client.as_ref(),
                    &config.model_aliases,
                    &page_text,
                    config.max_prompt_chars,
                )
                .await
                {
                    Ok(candidate) => {
                        let applied = fields.merge_from(candidate);
                        stages.push(applied_or_miss(Stage::Inference, applied));
                    }
                    Err(e) => {
                        warn!(error = %e, "model stage failed, falling through");
                        stages.push(StageReport::failed(Stage::Inference, e.to_string()));
                    }
                }
            }
        }
    }

    // ── Step 4: Filename stage, the last resort ───────────────────────────
    if fields.bid_number.is_some() {
        stages.push(StageReport::skipped(Stage::Filename, SkipReason::BidAlreadySet));
    } else {
        match bid_number_from_file_name(file_name) {
            Some(bid) => {
                debug!(bid = %bid, "bid number recovered from file name");
                fields.bid_number = Some(bid);
                stages.push(StageReport::applied(Stage::Filename, vec![FieldKind::BidNumber]));
            }
            None => stages.push(StageReport::miss(Stage::Filename)),
        }
    }

    // ── Step 5: Derive the subject, then deliver the verdict ──────────────
    if fields.subject.is_none() {
        if let Some(category) = &fields.item_category {
            fields.subject = Some(subject::summarize(category));
        }
    }

    if fields.bid_number.is_none() {
        warn!(file = %file_name, "no bid number after all stages");
        return Err(ExtractError::Unparseable {
            file: file_name.to_owned(),
        });
    }

    info!(
        file = %file_name,
        bid = fields.bid_number.as_deref().unwrap_or_default(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "tender extraction complete"
    );

    Ok(TenderExtraction {
        source: file_name.to_owned(),
        fields,
        checklist: checklist_catalog(),
        stages,
    })
}

/// Run the full chain over many documents, bounded by `config.concurrency`.
///
/// Every document gets an outcome; one unparseable or unreadable file never
/// aborts the rest. Outcomes come back in input order regardless of
/// completion order.
pub async fn extract_batch(paths: &[PathBuf], config: &ExtractorConfig) -> BatchReport {
    info!(
        documents = paths.len(),
        concurrency = config.concurrency,
        "starting batch extraction"
    );

    let mut indexed: Vec<(usize, DocumentOutcome)> =
        stream::iter(paths.iter().enumerate().map(|(index, path)| async move {
            let file = path.display().to_string();
            let result = extract(path, config).await;
            (index, DocumentOutcome { file, result })
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    // buffer_unordered yields in completion order.
    indexed.sort_by_key(|(index, _)| *index);

    let report = BatchReport {
        outcomes: indexed.into_iter().map(|(_, outcome)| outcome).collect(),
    };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch extraction complete"
    );
    report
}

fn applied_or_miss(stage: Stage, applied: Vec<FieldKind>) -> StageReport {
    if applied.is_empty() {
        StageReport::miss(stage)
    } else {
        StageReport::applied(stage, applied)
    }
}

/// `GEM`-prefixed uploads are conventionally named after their bid number;
/// the stem (final extension stripped) is taken verbatim.
fn bid_number_from_file_name(file_name: &str) -> Option<String> {
    if !file_name.starts_with("GEM") {
        return None;
    }
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}
