//! Roleplay simulation models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a simulation: chatting, then debriefed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Active,
    Completed,
}

impl SimulationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Who spoke in a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptRole {
    User,
    Assistant,
}

impl TranscriptRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of a simulation conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(role: TranscriptRole, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// Structured post-simulation summary generated from the transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Debrief {
    #[serde(default)]
    pub what_went_well: Vec<String>,
    #[serde(default)]
    pub what_didnt: Vec<String>,
    #[serde(default)]
    pub likely_outcomes: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// A roleplay meeting simulation against a deal's stakeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub id: String,
    pub deal_id: String,
    pub user_id: String,
    /// Stakeholders being roleplayed.
    pub stakeholder_ids: Vec<String>,
    pub meeting_goal: Option<String>,
    pub transcript: Vec<TranscriptEntry>,
    pub debrief: Option<Debrief>,
    pub status: SimulationStatus,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Simulation {
    pub fn new(deal_id: String, user_id: String, stakeholder_ids: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            deal_id,
            user_id,
            stakeholder_ids,
            meeting_goal: None,
            transcript: Vec::new(),
            debrief: None,
            status: SimulationStatus::Active,
            created_at: Utc::now(),
            ended_at: None,
        }
    }
}
