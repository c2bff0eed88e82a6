//! The fixed GeM bid-submission compliance checklist.
//!
//! Every tender gets the same 28 documents to prepare: the `F-*` proformas
//! from the standard GeM bid document plus the `DOC-*` attachments the
//! submission portal asks for. The catalog is part of the software, not
//! configuration; changing it is a release. Codes are stable and unique,
//! order matches the bid document.

use serde::{Deserialize, Serialize};

/// One row of the static catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistEntry {
    /// Stable form code, e.g. `F-2A` or `DOC-3`.
    pub code: &'static str,
    /// Human-readable document name, verbatim from the GeM bid document.
    pub name: &'static str,
}

/// A materialized checklist item for one tender, ready to persist.
///
/// Both flags start `false`; the caller flips `is_ready` when the document
/// is prepared and `is_submitted` once it is uploaded to the portal.
/// Persistence (one row per item, cascade-deleted with its tender) is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub code: String,
    pub name: String,
    pub is_ready: bool,
    pub is_submitted: bool,
}

/// The full catalog, in bid-document order.
pub static CHECKLIST_CATALOG: [ChecklistEntry; 28] = [
    ChecklistEntry { code: "F-1", name: "Bidder's General Information" },
    ChecklistEntry { code: "F-2", name: "Proforma of Bank Guarantee for Earnest Money" },
    ChecklistEntry { code: "F-2A", name: "Proforma of Declaration for Bid Security" },
    ChecklistEntry { code: "F-2B", name: "Fixed Deposit Receipt as EMD" },
    ChecklistEntry { code: "F-2C", name: "Proforma of Insurance Surety Bond for Earnest Money" },
    ChecklistEntry { code: "F-3", name: "Letter of Authority" },
    ChecklistEntry { code: "F-4", name: "Proforma of Bank Guarantee for Contract Performance Security" },
    ChecklistEntry { code: "F-4A", name: "Fixed Deposit Receipt as CPS" },
    ChecklistEntry { code: "F-4B", name: "Proforma of Insurance Surety Bond for Security Deposit" },
    ChecklistEntry { code: "F-5", name: "Agreed Terms & Conditions" },
    ChecklistEntry { code: "F-6", name: "Acknowledgement Cum Consent Letter" },
    ChecklistEntry { code: "F-7", name: "Bidder’s Experience" },
    ChecklistEntry { code: "F-8", name: "Check List" },
    ChecklistEntry { code: "F-8B", name: "Check List for BEC Qualifying Documents" },
    ChecklistEntry { code: "F-9", name: "Format for Certificate from Bank (if working capital inadequate)" },
    ChecklistEntry { code: "F-10", name: "Format for CA Certificate for Financial Capability" },
    ChecklistEntry { code: "F-11", name: "Bidder's Queries for Pre-Bid Meeting" },
    ChecklistEntry { code: "F-12", name: "E-Banking Format" },
    ChecklistEntry { code: "F-13", name: "Integrity Pact" },
    ChecklistEntry { code: "F-14", name: "FAQs" },
    ChecklistEntry { code: "F-15", name: "Undertaking regarding E-Invoice (GST Laws)" },
    ChecklistEntry { code: "F-16", name: "No Claim Certificate format" },
    ChecklistEntry { code: "DOC-1", name: "Bid Document (Signed)" },
    ChecklistEntry { code: "DOC-2", name: "GeM Document (Signed)" },
    ChecklistEntry { code: "DOC-3", name: "SOR (Schedule of Rates) Quoted" },
    ChecklistEntry { code: "DOC-4", name: "SOR Filled" },
    ChecklistEntry { code: "DOC-5", name: "Experience Certificate" },
    ChecklistEntry { code: "DOC-6", name: "Company Binder 1 Copy" },
];

/// Materializes the catalog for a new tender: all 28 entries, catalog
/// order, both flags `false`. Pure and deterministic; the same for every
/// tender.
pub fn checklist_catalog() -> Vec<ChecklistItem> {
    CHECKLIST_CATALOG
        .iter()
        .map(|entry| ChecklistItem {
            code: entry.code.to_owned(),
            name: entry.name.to_owned(),
            is_ready: false,
            is_submitted: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn exactly_twenty_eight_entries() {
        assert_eq!(CHECKLIST_CATALOG.len(), 28);
        assert_eq!(checklist_catalog().len(), 28);
    }

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<&str> = CHECKLIST_CATALOG.iter().map(|e| e.code).collect();
        assert_eq!(codes.len(), 28);
    }

    #[test]
    fn order_is_stable_across_calls() {
        assert_eq!(checklist_catalog(), checklist_catalog());
        assert_eq!(checklist_catalog()[0].code, "F-1");
        assert_eq!(checklist_catalog()[27].code, "DOC-6");
    }

    #[test]
    fn flags_default_to_false() {
        assert!(checklist_catalog()
            .iter()
            .all(|item| !item.is_ready && !item.is_submitted));
    }

    #[test]
    fn proforma_variants_present() {
        let codes: Vec<&str> = CHECKLIST_CATALOG.iter().map(|e| e.code).collect();
        for code in ["F-2A", "F-2B", "F-2C", "F-4A", "F-4B", "F-8B"] {
            assert!(codes.contains(&code), "missing {code}");
        }
    }
}
