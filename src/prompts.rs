//! Prompt templates for model-backed extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening a field description or the
//!    output contract happens in exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the assembled prompt without
//!    calling a real model, so contract regressions (a renamed JSON key, a
//!    dropped format hint) are caught cheaply.
//!
//! Both prompts pin the reply format hard: flat JSON, no code fences, no
//! commentary. Models ignore that often enough that the response side
//! strips fences anyway (see [`crate::pipeline::fence`]), but asking keeps
//! the failure rate down.

/// Prompt head for extracting bid fields from tender page text.
///
/// The trailing page text is appended by [`field_extraction_prompt`]. The
/// subject line is deliberately not requested; it is derived locally from
/// the item category so the summary is deterministic.
pub const FIELD_EXTRACTION_PROMPT: &str = r#"You are an expert at parsing GeM (Government e-Marketplace) tender documents.
Extract the following details from the provided text of a tender PDF:

- bid_number: the bid identifier (format: GEM/YYYY/X/#######)
- bid_end_date: the bid end date/time (format: DD-MM-YYYY HH:MM:SS)
- item_category: the full item category name

Rules:
1. Return a single flat JSON object with exactly those three keys.
2. Use JSON null for any detail the text does not contain. Never guess.
3. Copy values verbatim from the text; do not reformat the bid number.
4. Output ONLY the JSON object. No code fences, no commentary.

Example reply:
{"bid_number": "GEM/2025/B/6477908", "bid_end_date": "31-07-2025 17:00:00", "item_category": "Desktop Computers"}

Tender text:
"#;

/// Prompt for reading bid statuses off a GeM seller-dashboard screenshot.
///
/// The dashboard renders each bid as a row with a three-segment progress
/// indicator; the prompt maps indicator state to the portal's canonical
/// status strings so replies match what the frontend displays.
pub const SCREENSHOT_PROMPT: &str = r#"You are reading a screenshot of the GeM (Government e-Marketplace) seller dashboard listing participated bids.

For every bid row visible in the image, extract:

- bid_number: the bid identifier, e.g. GEM/2025/B/6477908
- evaluation_status: the bid's current stage. The progress indicator has
  three segments; report the rightmost reached stage as exactly one of
  "Technical Evaluation", "Financial Evaluation" or "Awarded". If the row
  shows a different state (e.g. disqualified), report that text verbatim.
- ra_status: the reverse-auction status text if the row shows one, else null
- result_details: any result/remark text on the row, else null

Rules:
1. Return a JSON array with one object per bid row, top to bottom.
2. Copy all values verbatim from the screenshot. Never invent rows.
3. If no bid rows are visible, return [].
4. Output ONLY the JSON array. No code fences, no commentary.

Example reply:
[{"bid_number": "GEM/2025/B/6477908", "evaluation_status": "Financial Evaluation", "ra_status": null, "result_details": null}]"#;

/// Assemble the full field-extraction prompt for one document's page text.
///
/// The caller truncates `context` (see
/// [`crate::config::ExtractorConfig::max_prompt_chars`]) before passing it
/// in; this function only concatenates.
pub fn field_extraction_prompt(context: &str) -> String {
    format!("{FIELD_EXTRACTION_PROMPT}{context}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_prompt_names_all_three_keys() {
        for key in ["bid_number", "bid_end_date", "item_category"] {
            assert!(FIELD_EXTRACTION_PROMPT.contains(key), "missing {key}");
        }
        // Subject is derived locally, never requested from the model.
        assert!(!FIELD_EXTRACTION_PROMPT.contains("subject"));
    }

    #[test]
    fn field_prompt_pins_the_date_format() {
        assert!(FIELD_EXTRACTION_PROMPT.contains("DD-MM-YYYY HH:MM:SS"));
    }

    #[test]
    fn field_prompt_appends_context_at_the_end() {
        let prompt = field_extraction_prompt("Bid Number: GEM/2025/B/1");
        assert!(prompt.ends_with("Bid Number: GEM/2025/B/1"));
        assert!(prompt.starts_with("You are an expert"));
    }

    #[test]
    fn screenshot_prompt_names_the_canonical_statuses() {
        for status in ["Technical Evaluation", "Financial Evaluation", "Awarded"] {
            assert!(SCREENSHOT_PROMPT.contains(status), "missing {status}");
        }
        assert!(SCREENSHOT_PROMPT.contains("JSON array"));
    }
}
