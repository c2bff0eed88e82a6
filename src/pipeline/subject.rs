//! Subject derivation from the item category.
//!
//! The tender list view wants a short line, not the full category (which in
//! GeM documents can run to a dozen qualifiers and consignee notes). The
//! rule is fixed: first ten whitespace-delimited words, `...` appended when
//! anything was cut.

/// Number of words kept in a derived subject.
const SUBJECT_WORD_LIMIT: usize = 10;

/// Marker appended when the source text had more words than the limit.
const TRUNCATION_MARKER: &str = "...";

/// Summarize `text` to at most ten words.
///
/// Words are whitespace-delimited and re-joined with single spaces, so the
/// output is also whitespace-normalized. Exactly ten words come back
/// without the marker. Idempotent: summarizing a summary changes nothing.
pub fn summarize(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut subject = words
        .iter()
        .take(SUBJECT_WORD_LIMIT)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > SUBJECT_WORD_LIMIT {
        subject.push_str(TRUNCATION_MARKER);
    }
    subject
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eleven_words_truncate_with_marker() {
        assert_eq!(
            summarize("A B C D E F G H I J K"),
            "A B C D E F G H I J..."
        );
    }

    #[test]
    fn exactly_ten_words_pass_unmarked() {
        assert_eq!(summarize("A B C D E F G H I J"), "A B C D E F G H I J");
    }

    #[test]
    fn short_input_passes_through() {
        assert_eq!(summarize("Desktop Computers"), "Desktop Computers");
    }

    #[test]
    fn whitespace_is_normalized() {
        assert_eq!(summarize("  Desktop \t Computers \n"), "Desktop Computers");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(summarize(""), "");
        assert_eq!(summarize("   "), "");
    }

    #[test]
    fn idempotent_on_its_own_output() {
        let once = summarize("A B C D E F G H I J K L M");
        assert_eq!(summarize(&once), once);
    }
}
