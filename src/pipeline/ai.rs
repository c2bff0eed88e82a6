//! Model-backed field extraction (the inference stage).
//!
//! Runs only when the pattern stage failed to find a bid number and a
//! client could be resolved. The model sees the same leading-page text the
//! patterns saw, capped at `max_prompt_chars`, and must answer with a flat
//! JSON object. Replies are treated as hostile input: fences stripped,
//! keys optional, values trimmed, timestamps re-validated against the wire
//! format. Whatever survives becomes candidate fields; the orchestrator's
//! merge keeps it from overwriting anything the patterns already set.
//!
//! Nothing here aborts the chain. Every failure mode collapses into
//! [`AiFailure`], which the orchestrator records and steps past.

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::error::InferenceError;
use crate::inference::{generate_with_fallback, InferenceClient, InferenceRequest};
use crate::output::{ExtractedFields, BID_DATE_FORMAT};
use crate::pipeline::fence::{self, truncate_chars};
use crate::prompts;

/// Why the inference stage produced nothing. Recovered by the orchestrator
/// into a stage report, never propagated.
#[derive(Debug, Error)]
pub(crate) enum AiFailure {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("model reply was not the expected JSON object: {detail}")]
    Parse { detail: String },
}

/// Ask the model for the three labelled fields.
pub(crate) async fn infer_fields(
    client: &dyn InferenceClient,
    aliases: &[String],
    page_text: &str,
    max_prompt_chars: usize,
) -> Result<ExtractedFields, AiFailure> {
    let context = truncate_chars(page_text, max_prompt_chars);
    debug!(
        context_chars = context.chars().count(),
        aliases = aliases.len(),
        "running model field extraction"
    );
    let request = InferenceRequest::text(prompts::field_extraction_prompt(context));
    let reply = generate_with_fallback(client, aliases, &request).await?;
    parse_reply(&reply)
}

/// Reply shape the prompt asks for. Keys may be absent, null, or empty;
/// all of those mean "not found".
#[derive(Debug, Deserialize)]
struct InferredFields {
    #[serde(default)]
    bid_number: Option<String>,
    #[serde(default)]
    bid_end_date: Option<String>,
    #[serde(default)]
    item_category: Option<String>,
}

/// Strip fences, parse, and normalize a model reply into candidate fields.
fn parse_reply(reply: &str) -> Result<ExtractedFields, AiFailure> {
    let inferred: InferredFields =
        fence::parse_fenced_json(reply).map_err(|e| AiFailure::Parse {
            detail: format!("{e} in reply {:?}", snippet(reply)),
        })?;

    Ok(ExtractedFields {
        bid_number: normalize(inferred.bid_number),
        bid_end_date: normalize(inferred.bid_end_date)
            .and_then(|raw| NaiveDateTime::parse_from_str(&raw, BID_DATE_FORMAT).ok()),
        item_category: normalize(inferred.item_category),
        subject: None,
    })
}

/// Blank strings count as absent.
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn snippet(s: &str) -> String {
    truncate_chars(s, 120).to_owned()
}
