//! Leading-page text extraction.
//!
//! Everything the pipeline needs sits on the first couple of pages of a
//! GeM bid sheet, so only `page_limit` pages are ever parsed. Parsing is
//! CPU-bound, so it runs under `spawn_blocking` to keep the async runtime's
//! worker threads free during batch runs.
//!
//! This stage **never fails the caller**: scanned, corrupt or encrypted
//! documents produce an empty string (logged at warn), because the chain
//! behind it can still recover a bid number from the file name.

use lopdf::Document;
use tracing::{debug, warn};

/// Read the text of the first `page_limit` pages, empty string on any
/// parse failure.
pub async fn read_leading_pages(bytes: Vec<u8>, page_limit: usize) -> String {
    match tokio::task::spawn_blocking(move || read_blocking(&bytes, page_limit)).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "page-text task panicked, continuing with empty text");
            String::new()
        }
    }
}

fn read_blocking(bytes: &[u8], page_limit: usize) -> String {
    let document = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "PDF parse failed, continuing with empty text");
            return String::new();
        }
    };

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().take(page_limit).collect();
    if page_numbers.is_empty() {
        warn!("PDF has no pages, continuing with empty text");
        return String::new();
    }

    match document.extract_text(&page_numbers) {
        Ok(text) => {
            debug!(
                pages = page_numbers.len(),
                chars = text.len(),
                "extracted leading-page text"
            );
            text
        }
        Err(e) => {
            warn!(error = %e, "text extraction failed, continuing with empty text");
            String::new()
        }
    }
}
