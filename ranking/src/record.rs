//! Case records and ranking result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A help case as supplied by the record store.
///
/// The store hands the full corpus to each ranking call; this crate never
/// owns record lifecycle. Field names serialize camelCase for the HTTP layer
/// sitting above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    /// Unique case identifier, matched case-insensitively.
    pub case_number: String,

    /// One-line summary; first half of the embedding input.
    pub short_description: String,

    /// Full description; second half of the embedding input.
    pub long_description: String,

    /// Person the case was reported for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_affected: Option<String>,

    /// Workflow status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,

    /// Priority label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Group the case is assigned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_group: Option<String>,

    /// Who submitted the case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,

    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// When the case was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the case was last edited (set by the store on solution updates).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Recorded resolution, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_text: Option<String>,
}

impl CaseRecord {
    /// Create a record with the fields the ranking core requires.
    pub fn new(
        case_number: impl Into<String>,
        short_description: impl Into<String>,
        long_description: impl Into<String>,
    ) -> Self {
        Self {
            case_number: case_number.into(),
            short_description: short_description.into(),
            long_description: long_description.into(),
            person_affected: None,
            status: None,
            priority: None,
            category: None,
            assigned_group: None,
            submitted_by: None,
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
            solution_text: None,
        }
    }

    /// The text embedded for this record: short description, then long,
    /// space-joined. Deterministic so cache keys stay stable.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.short_description, self.long_description)
    }

    /// Case-insensitive identifier match.
    pub fn matches(&self, case_number: &str) -> bool {
        self.case_number.eq_ignore_ascii_case(case_number)
    }
}

/// Workflow status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Closed Complete")]
    ClosedComplete,
}

/// A candidate case annotated with its similarity to the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCase {
    /// The candidate record.
    #[serde(flatten)]
    pub record: CaseRecord,

    /// Raw cosine similarity against the target, in [-1, 1].
    pub similarity: f32,

    /// Display percentage: `round(similarity * 100)` clamped into [0, 100].
    pub relevance: u8,
}

/// Result of one ranking request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedCases {
    /// The resolved target, or `None` when the identifier is unknown.
    pub main_case: Option<CaseRecord>,

    /// Up to K candidates, strictly descending by similarity.
    pub related: Vec<ScoredCase>,

    /// Candidates dropped because their embedding could not be computed.
    #[serde(default)]
    pub skipped: usize,
}

impl RelatedCases {
    /// The defined empty result for an unknown target identifier.
    pub fn not_found() -> Self {
        Self {
            main_case: None,
            related: Vec::new(),
            skipped: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_embedding_text_order() {
        let record = CaseRecord::new("HR-1", "printer not working", "the office printer jams");
        assert_eq!(
            record.embedding_text(),
            "printer not working the office printer jams"
        );
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let record = CaseRecord::new("HR-001", "a", "b");
        assert!(record.matches("hr-001"));
        assert!(record.matches("HR-001"));
        assert!(!record.matches("HR-002"));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let mut record = CaseRecord::new("HR-1", "short", "long");
        record.status = Some(CaseStatus::InProgress);
        record.assigned_group = Some("IT Support".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["caseNumber"], "HR-1");
        assert_eq!(value["shortDescription"], "short");
        assert_eq!(value["assignedGroup"], "IT Support");
        assert_eq!(value["status"], "In Progress");
    }

    #[test]
    fn test_scored_case_flattens_record() {
        let scored = ScoredCase {
            record: CaseRecord::new("HR-9", "s", "l"),
            similarity: 0.87,
            relevance: 87,
        };

        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["caseNumber"], "HR-9");
        assert_eq!(value["relevance"], 87);
    }

    #[test]
    fn test_status_round_trip() {
        for (status, text) in [
            (CaseStatus::Open, "\"Open\""),
            (CaseStatus::InProgress, "\"In Progress\""),
            (CaseStatus::ClosedComplete, "\"Closed Complete\""),
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, text);
            let back: CaseStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }
}
