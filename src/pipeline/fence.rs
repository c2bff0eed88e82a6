//! Code-fence stripping for model replies.
//!
//! Both prompts demand bare JSON, but models routinely wrap replies in
//! Markdown code fences anyway (```json ... ```). Rather than scattering
//! `replace("```", "")` calls around, this module owns the one defined
//! grammar for unwrapping:
//!
//! * optional leading ``` with an optional language tag,
//! * optional trailing ```,
//! * surrounding whitespace ignored.
//!
//! Anything beyond that grammar is left untouched; if the remainder is not
//! valid JSON the parse in [`parse_fenced_json`] fails with a single typed
//! error instead of something half-mangled slipping through.

use serde::de::DeserializeOwned;

/// Strip an optional outer code-fence wrapper, returning the inner slice.
///
/// Accepts a fence with or without a language tag, and tolerates a missing
/// trailing fence (models truncate). Input without a leading fence comes
/// back trimmed but otherwise untouched. Inner fences are not interpreted.
pub fn strip_code_fence(raw: &str) -> &str {
    let s = raw.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Language tag: letters/digits/_/- up to the first whitespace.
    let rest = rest.trim_start_matches(|c: char| {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    });
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Strip fences, then parse the remainder as JSON.
pub fn parse_fenced_json<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

/// Char-boundary-safe prefix of `s`, at most `max` characters. Used for
/// capping prompt context and for reply snippets in error details.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
