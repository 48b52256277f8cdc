//! Request payloads.
//!
//! Top-level keys are camelCase on the wire; nested stakeholder/deal
//! snapshots arrive as stored rows and keep their snake_case columns.

use chrono::NaiveDate;
use serde::Deserialize;

fn default_channel() -> String {
    "call".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealRequest {
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub deal_value: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub expected_close_month: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelationshipRequest {
    #[serde(default)]
    pub deal_id: String,
    #[serde(default)]
    pub from_stakeholder_id: String,
    #[serde(default)]
    pub to_stakeholder_id: String,
    #[serde(default)]
    pub relationship_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    #[serde(default)]
    pub deal_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    pub meeting_date: NaiveDate,
    #[serde(default)]
    pub raw_notes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    #[serde(default)]
    pub meeting_id: String,
    #[serde(default)]
    pub raw_notes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefRequest {
    #[serde(default)]
    pub deal_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebriefRequest {
    #[serde(default)]
    pub simulation_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsRequest {
    #[serde(default)]
    pub meeting_id: String,
    #[serde(default)]
    pub deal_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSimulationRequest {
    #[serde(default)]
    pub deal_id: String,
    #[serde(default)]
    pub stakeholder_ids: Vec<String>,
    #[serde(default)]
    pub meeting_goal: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub simulation_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stakeholder_profiles: Vec<StakeholderProfile>,
    pub deal_context: DealContext,
    #[serde(default)]
    pub meeting_goal: Option<String>,
}

/// Stakeholder snapshot the client sends for roleplay.
#[derive(Debug, Deserialize)]
pub struct StakeholderProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role_title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub stance: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub communication_style: Option<String>,
}

/// Deal snapshot the client sends for roleplay.
#[derive(Debug, Deserialize)]
pub struct DealContext {
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub deal_value: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub stage: String,
}
