//! Result types produced by the two extraction paths.
//!
//! The PDF path produces a [`TenderExtraction`]: the merged
//! [`ExtractedFields`], the materialized compliance checklist, and one
//! [`StageReport`] per chain stage so callers can see *which* stage found
//! *what* (or why it did not run). The screenshot path produces
//! [`ScreenshotBid`] records.
//!
//! ## Why an explicit merge method?
//!
//! The chain's one hard invariant is that a field set by an earlier stage is
//! never overwritten by a later one. Centralising that rule in
//! [`ExtractedFields::merge_from`] makes it impossible for an individual
//! stage to break it: stages produce candidate fields, the merge decides.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::checklist::ChecklistItem;
use crate::error::ExtractError;

/// Wire format of bid deadlines in GeM documents: `31-07-2025 17:00:00`.
pub const BID_DATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

// ── Extracted fields ──────────────────────────────────────────────────────

/// The four tender fields the pipeline recovers. All optional; all unset
/// until some stage fills them in.
///
/// `bid_end_date` serializes as ISO-8601 (chrono's serde default), not the
/// `DD-MM-YYYY` wire format it was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// GeM bid identifier, e.g. `GEM/2025/B/6477908`.
    pub bid_number: Option<String>,
    /// Submission deadline, parsed from [`BID_DATE_FORMAT`].
    pub bid_end_date: Option<NaiveDateTime>,
    /// Full item category line from the bid sheet.
    pub item_category: Option<String>,
    /// Short summary, at most ten words plus a `...` marker.
    pub subject: Option<String>,
}

impl ExtractedFields {
    /// Fills every still-unset field of `self` from `candidate` and returns
    /// which fields were applied. Set fields are never overwritten.
    pub fn merge_from(&mut self, candidate: ExtractedFields) -> Vec<FieldKind> {
        let mut applied = Vec::new();
        if self.bid_number.is_none() {
            if let Some(v) = candidate.bid_number {
                self.bid_number = Some(v);
                applied.push(FieldKind::BidNumber);
            }
        }
        if self.bid_end_date.is_none() {
            if let Some(v) = candidate.bid_end_date {
                self.bid_end_date = Some(v);
                applied.push(FieldKind::BidEndDate);
            }
        }
        if self.item_category.is_none() {
            if let Some(v) = candidate.item_category {
                self.item_category = Some(v);
                applied.push(FieldKind::ItemCategory);
            }
        }
        if self.subject.is_none() {
            if let Some(v) = candidate.subject {
                self.subject = Some(v);
                applied.push(FieldKind::Subject);
            }
        }
        applied
    }

    /// True when no stage has set anything yet.
    pub fn is_empty(&self) -> bool {
        self.bid_number.is_none()
            && self.bid_end_date.is_none()
            && self.item_category.is_none()
            && self.subject.is_none()
    }

    /// Whether the bid deadline lies before `now`. `None` when no deadline
    /// was extracted. Callers derive tender freshness from this.
    pub fn deadline_passed(&self, now: NaiveDateTime) -> Option<bool> {
        self.bid_end_date.map(|end| end < now)
    }
}

/// Names one field of [`ExtractedFields`], for stage reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    BidNumber,
    BidEndDate,
    ItemCategory,
    Subject,
}

// ── Stage reporting ───────────────────────────────────────────────────────

/// The three stages of the fallback chain, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Deterministic label-pattern rules over the page text.
    Pattern,
    /// Model-backed extraction over the same text.
    Inference,
    /// Bid number recovered from a `GEM`-prefixed file name.
    Filename,
}

/// Why a stage did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// An earlier stage already produced the bid number.
    BidAlreadySet,
    /// No API key and no injected client; only the inference stage skips
    /// for this reason.
    MissingCredential,
}

/// What one stage did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage set at least one previously-unset field.
    Applied { fields: Vec<FieldKind> },
    /// The stage ran but contributed nothing new.
    Miss,
    /// The stage's gate was not satisfied.
    Skipped { reason: SkipReason },
    /// A collaborator failed; the failure was recovered and the chain
    /// continued.
    Failed { detail: String },
}

/// One chain stage's outcome. `TenderExtraction::stages` holds these in
/// execution order.
///
/// Serializes flat: `{"stage": "pattern", "outcome": "applied", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

impl StageReport {
    pub fn applied(stage: Stage, fields: Vec<FieldKind>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Applied { fields },
        }
    }

    pub fn miss(stage: Stage) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Miss,
        }
    }

    pub fn skipped(stage: Stage, reason: SkipReason) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Skipped { reason },
        }
    }

    pub fn failed(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Failed {
                detail: detail.into(),
            },
        }
    }
}

// ── PDF path result ───────────────────────────────────────────────────────

/// Successful result of the PDF extraction path.
///
/// `fields.bid_number` is guaranteed set; a chain that ends without one
/// returns [`ExtractError::Unparseable`] instead of this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderExtraction {
    /// Document name the fields came from (file name for path inputs).
    pub source: String,
    pub fields: ExtractedFields,
    /// The fixed 28-entry compliance checklist, flags defaulted, ready for
    /// the caller to persist against the new tender.
    pub checklist: Vec<ChecklistItem>,
    /// Per-stage outcomes in execution order.
    pub stages: Vec<StageReport>,
}

// ── Batch result ──────────────────────────────────────────────────────────

/// Outcome of one document in a batch run. Failures stay per-document; one
/// unparseable file never aborts the rest of the batch.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub file: String,
    pub result: Result<TenderExtraction, ExtractError>,
}

/// Per-document outcomes of [`crate::extract_batch`], in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of documents that produced a [`TenderExtraction`].
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of documents that ended in an error.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

// ── Screenshot path result ────────────────────────────────────────────────

/// Evaluation stage of a bid as shown by the portal's progress indicator.
///
/// Round-trips strings verbatim: the three known stages map to their
/// canonical portal labels, anything else (e.g. `"Disqualified"`) is
/// preserved untouched in [`EvaluationStage::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EvaluationStage {
    Technical,
    Financial,
    Awarded,
    Other(String),
}

impl EvaluationStage {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Technical => "Technical Evaluation",
            Self::Financial => "Financial Evaluation",
            Self::Awarded => "Awarded",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for EvaluationStage {
    fn from(s: String) -> Self {
        match s.trim() {
            "Technical Evaluation" => Self::Technical,
            "Financial Evaluation" => Self::Financial,
            "Awarded" => Self::Awarded,
            _ => Self::Other(s),
        }
    }
}

impl From<EvaluationStage> for String {
    fn from(stage: EvaluationStage) -> Self {
        match stage {
            EvaluationStage::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for EvaluationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bid row recovered from a portal screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotBid {
    pub bid_number: String,
    pub evaluation_status: EvaluationStage,
    /// Reverse-auction status, when the portal shows one.
    #[serde(default)]
    pub ra_status: Option<String>,
    /// Free-text result details, when visible.
    #[serde(default)]
    pub result_details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, BID_DATE_FORMAT).unwrap()
    }

    #[test]
    fn merge_never_overwrites_set_fields() {
        let mut fields = ExtractedFields {
            bid_number: Some("GEM/2025/B/1".into()),
            ..Default::default()
        };
        let applied = fields.merge_from(ExtractedFields {
            bid_number: Some("GEM/2099/Z/9".into()),
            item_category: Some("Desktop Computers".into()),
            ..Default::default()
        });
        assert_eq!(fields.bid_number.as_deref(), Some("GEM/2025/B/1"));
        assert_eq!(fields.item_category.as_deref(), Some("Desktop Computers"));
        assert_eq!(applied, vec![FieldKind::ItemCategory]);
    }

    #[test]
    fn merge_fills_all_unset_fields() {
        let mut fields = ExtractedFields::default();
        let applied = fields.merge_from(ExtractedFields {
            bid_number: Some("GEM/2025/B/2".into()),
            bid_end_date: Some(date("31-07-2025 17:00:00")),
            item_category: Some("Servers".into()),
            subject: Some("Servers".into()),
        });
        assert_eq!(applied.len(), 4);
        assert!(!fields.is_empty());
    }

    #[test]
    fn merge_of_empty_candidate_applies_nothing() {
        let mut fields = ExtractedFields::default();
        assert!(fields.merge_from(ExtractedFields::default()).is_empty());
        assert!(fields.is_empty());
    }

    #[test]
    fn deadline_passed_on_both_sides() {
        let fields = ExtractedFields {
            bid_end_date: Some(date("31-07-2025 17:00:00")),
            ..Default::default()
        };
        assert_eq!(fields.deadline_passed(date("01-08-2025 00:00:00")), Some(true));
        assert_eq!(fields.deadline_passed(date("30-07-2025 00:00:00")), Some(false));
        assert_eq!(ExtractedFields::default().deadline_passed(date("01-08-2025 00:00:00")), None);
    }

    #[test]
    fn bid_end_date_serializes_iso8601() {
        let fields = ExtractedFields {
            bid_end_date: Some(date("31-07-2025 17:00:00")),
            ..Default::default()
        };
        let json = serde_json::to_string(&fields).unwrap();
        assert!(json.contains("2025-07-31T17:00:00"), "got: {json}");
    }

    #[test]
    fn evaluation_stage_round_trips_known_labels() {
        for label in ["Technical Evaluation", "Financial Evaluation", "Awarded"] {
            let stage = EvaluationStage::from(label.to_owned());
            assert!(!matches!(stage, EvaluationStage::Other(_)), "{label}");
            assert_eq!(String::from(stage), label);
        }
    }

    #[test]
    fn evaluation_stage_preserves_unknown_verbatim() {
        let stage = EvaluationStage::from("Disqualified".to_owned());
        assert_eq!(stage, EvaluationStage::Other("Disqualified".into()));
        assert_eq!(String::from(stage), "Disqualified");
    }

    #[test]
    fn screenshot_bid_tolerates_missing_optionals() {
        let bid: ScreenshotBid = serde_json::from_str(
            r#"{"bid_number":"GEM/2025/B/3","evaluation_status":"Awarded"}"#,
        )
        .unwrap();
        assert_eq!(bid.evaluation_status, EvaluationStage::Awarded);
        assert_eq!(bid.ra_status, None);
        assert_eq!(bid.result_details, None);
    }

    #[test]
    fn stage_outcome_serializes_tagged() {
        let report = StageReport::skipped(Stage::Inference, SkipReason::MissingCredential);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""outcome":"skipped""#), "got: {json}");
        assert!(json.contains("missing_credential"), "got: {json}");
    }
}
