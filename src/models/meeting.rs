//! Meeting models and the artifacts extracted from meeting notes.
//!
//! A meeting row carries both the raw notes a user typed in and the
//! structured artifacts the enrichment pipeline derives from them. The
//! artifact types double as the wire schema for model output, so their
//! item-level fields are lenient: older prompt versions emitted slightly
//! different field names, and a single malformed item must not invalidate
//! the whole payload.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Progress of the enrichment pipeline for one meeting.
///
/// `Completed` and `Failed` are terminal; nothing transitions out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A stakeholder as the model saw them in the notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedStakeholder {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "role")]
    pub role_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A direct or paraphrased quote attributed to a stakeholder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedQuote {
    #[serde(default)]
    pub speaker: String,
    #[serde(default)]
    pub quote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// An objection raised during the meeting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedObjection {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stakeholder: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// A risk or red flag identified in the notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedRisk {
    #[serde(default, alias = "description")]
    pub risk_description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

/// A buying signal or approval-process clue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalClue {
    #[serde(default, rename = "type")]
    pub clue_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stakeholder: Option<String>,
}

/// A sales meeting with its raw notes and extracted artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub deal_id: String,
    pub user_id: String,
    pub title: String,
    /// How the meeting happened (call, video, in_person, email...).
    pub channel: String,
    pub meeting_date: NaiveDate,
    pub raw_notes: String,
    pub stakeholders: Vec<ExtractedStakeholder>,
    pub quotes: Vec<ExtractedQuote>,
    pub objections: Vec<ExtractedObjection>,
    pub risks: Vec<ExtractedRisk>,
    pub approval_clues: Vec<ApprovalClue>,
    pub extraction_status: ExtractionStatus,
    pub extraction_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn new(
        deal_id: String,
        user_id: String,
        title: String,
        channel: String,
        meeting_date: NaiveDate,
        raw_notes: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            deal_id,
            user_id,
            title,
            channel,
            meeting_date,
            raw_notes,
            stakeholders: Vec::new(),
            quotes: Vec::new(),
            objections: Vec::new(),
            risks: Vec::new(),
            approval_clues: Vec::new(),
            extraction_status: ExtractionStatus::Pending,
            extraction_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ExtractionStatus::Pending,
            ExtractionStatus::Processing,
            ExtractionStatus::Completed,
            ExtractionStatus::Failed,
        ] {
            assert_eq!(ExtractionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ExtractionStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ExtractionStatus::Pending.is_terminal());
        assert!(!ExtractionStatus::Processing.is_terminal());
        assert!(ExtractionStatus::Completed.is_terminal());
        assert!(ExtractionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_stakeholder_role_alias() {
        // Older prompt versions emitted "role" instead of "role_title".
        let s: ExtractedStakeholder =
            serde_json::from_str(r#"{"name": "Sarah Chen", "role": "VP Engineering"}"#).unwrap();
        assert_eq!(s.role_title, "VP Engineering");
    }

    #[test]
    fn test_risk_description_alias() {
        let r: ExtractedRisk =
            serde_json::from_str(r#"{"description": "Budget timeline concern", "severity": "medium"}"#)
                .unwrap();
        assert_eq!(r.risk_description, "Budget timeline concern");
    }
}
