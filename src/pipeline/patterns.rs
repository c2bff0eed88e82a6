//! Label-pattern rules over extracted page text (the deterministic stage).
//!
//! GeM bid sheets are generated documents: the header block carries
//! bilingual field labels ("Bid Number/बिड संख्या") in a stable layout, so
//! anchored regexes recover the fields without any model in the loop. The
//! rules accept the English label alone or with its `/`-separated
//! Devanagari companion, match case-insensitively, and take the first hit.
//!
//! Table-style layouts sometimes put a value on the line after its label;
//! the whitespace bridge before each capture covers that.
//!
//! All functions are pure text-in, value-out. A rule that does not match
//! leaves its field unset; nothing here errors.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::output::{ExtractedFields, BID_DATE_FORMAT};

/// "Bid Number" label (optional Devanagari companion, optional `:`/`.`)
/// followed by a `GEM/`-prefixed token.
static RE_BID_LABELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)bid\s+number(?:\s*/\s*[\p{Devanagari} ]+)?\s*[:.]?\s*(GEM/\S+)")
        .expect("bid-number label regex must compile")
});

/// Canonical bid-number shape anywhere in the text, for documents whose
/// label got mangled by text extraction: `GEM/<year>/<letter>/<digits>`.
static RE_BID_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(GEM/\d{4}/[A-Z]/\d+)").expect("bare bid-number regex must compile")
});

/// "Bid End Date/Time" label followed by a `DD-MM-YYYY HH:MM:SS` token.
static RE_END_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)bid\s+end\s+date/time(?:\s*/\s*[\p{Devanagari} /]+)?\s*(\d{2}-\d{2}-\d{4}\s+\d{2}:\d{2}:\d{2})",
    )
    .expect("end-date label regex must compile")
});

/// "Item Category" label followed by the remainder of the value line.
static RE_CATEGORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)item\s+category(?:\s*/\s*[\p{Devanagari} ]+)?\s*[:.]?\s*(.+)")
        .expect("item-category regex must compile")
});

/// Run every rule over `text`. `subject` is never set here; it is derived
/// from the category after the chain finishes.
pub fn extract_fields(text: &str) -> ExtractedFields {
    ExtractedFields {
        bid_number: extract_bid_number(text),
        bid_end_date: extract_end_date(text),
        item_category: extract_category(text),
        subject: None,
    }
}

/// Labeled rule first, bare-shape fallback second, first match wins.
pub fn extract_bid_number(text: &str) -> Option<String> {
    RE_BID_LABELED
        .captures(text)
        .or_else(|| RE_BID_BARE.captures(text))
        .map(|caps| caps[1].trim().to_owned())
}

/// Matched timestamps that fail to parse are treated as a miss, never an
/// error (generated documents occasionally carry placeholder dates).
pub fn extract_end_date(text: &str) -> Option<NaiveDateTime> {
    let caps = RE_END_DATE.captures(text)?;
    let normalized = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, BID_DATE_FORMAT).ok()
}

/// The trimmed remainder of the category line; empty remainders are a miss.
pub fn extract_category(text: &str) -> Option<String> {
    let caps = RE_CATEGORY.captures(text)?;
    let category = caps[1].trim();
    (!category.is_empty()).then(|| category.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_BLOCK: &str = "\
Bid Number/बिड संख्या : GEM/2025/B/6477908
Dated/दिनांक : 10-07-2025
Bid End Date/Time/बिड समाप्ति तिथि/समय 31-07-2025 17:00:00
Item Category/मद श्रेणी Desktop Computers All in One, Form Factor Tower
";

    #[test]
    fn full_header_block_extracts_all_three_fields() {
        let fields = extract_fields(HEADER_BLOCK);
        assert_eq!(fields.bid_number.as_deref(), Some("GEM/2025/B/6477908"));
        assert_eq!(
            fields
                .bid_end_date
                .map(|d| d.format(BID_DATE_FORMAT).to_string())
                .as_deref(),
            Some("31-07-2025 17:00:00")
        );
        assert_eq!(
            fields.item_category.as_deref(),
            Some("Desktop Computers All in One, Form Factor Tower")
        );
        assert_eq!(fields.subject, None);
    }

    #[test]
    fn labeled_bid_number_without_hindi_companion() {
        assert_eq!(
            extract_bid_number("Bid Number: GEM/2025/B/6477908"),
            Some("GEM/2025/B/6477908".into())
        );
        assert_eq!(
            extract_bid_number("Bid Number GEM/2025/B/6477908"),
            Some("GEM/2025/B/6477908".into())
        );
    }

    #[test]
    fn labels_match_case_insensitively() {
        assert_eq!(
            extract_bid_number("BID NUMBER: GEM/2025/B/6477908"),
            Some("GEM/2025/B/6477908".into())
        );
        assert_eq!(
            extract_category("ITEM CATEGORY: Desktop Computers"),
            Some("Desktop Computers".into())
        );
    }

    #[test]
    fn bare_bid_number_found_in_running_text() {
        let text = "ref. our participation in GEM/2025/B/6477908 dated July";
        assert_eq!(extract_bid_number(text), Some("GEM/2025/B/6477908".into()));
    }

    #[test]
    fn labeled_rule_wins_over_bare_shape() {
        let text = "\
see also GEM/2024/B/1111111
Bid Number: GEM/2025/B/2222222
";
        assert_eq!(extract_bid_number(text), Some("GEM/2025/B/2222222".into()));
    }

    #[test]
    fn bare_rule_requires_canonical_shape() {
        assert_eq!(extract_bid_number("GEM/25/B/123"), None);
        assert_eq!(extract_bid_number("GEM/2025/BB/123"), None);
        assert_eq!(extract_bid_number("no identifiers here"), None);
    }

    #[test]
    fn end_date_round_trips_through_the_wire_format() {
        let parsed = extract_end_date("Bid End Date/Time 31-07-2025 17:00:00").unwrap();
        assert_eq!(parsed.format(BID_DATE_FORMAT).to_string(), "31-07-2025 17:00:00");
    }

    #[test]
    fn unparseable_timestamp_is_a_miss_not_an_error() {
        // Matches the digit shape but is not a real date.
        assert_eq!(extract_end_date("Bid End Date/Time 99-13-2025 17:00:00"), None);
    }

    #[test]
    fn missing_end_date_is_a_miss() {
        assert_eq!(extract_end_date("Bid Opening Date/Time 31-07-2025"), None);
    }

    #[test]
    fn category_value_on_the_following_line() {
        let text = "Item Category\nDesktop Computers All in One";
        assert_eq!(
            extract_category(text),
            Some("Desktop Computers All in One".into())
        );
    }

    #[test]
    fn category_stops_at_end_of_line() {
        let text = "Item Category: Desktop Computers\nMSE Exemption: Yes";
        assert_eq!(extract_category(text), Some("Desktop Computers".into()));
    }

    #[test]
    fn empty_category_remainder_is_a_miss() {
        assert_eq!(extract_category("Item Category:"), None);
        assert_eq!(extract_category("no category label"), None);
    }
}
