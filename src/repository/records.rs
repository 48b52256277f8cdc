//! Diesel ORM records for database tables.
//!
//! Each table gets a Queryable record plus a borrowing Insertable struct.
//! Conversions back to the domain models live here so repositories stay
//! focused on queries.

use chrono::NaiveDate;
use diesel::prelude::*;

use crate::models::{
    Deal, DealStatus, Debrief, ExtractionStatus, Meeting, Power, RelationshipType, Simulation,
    SimulationStatus, Stakeholder, StakeholderRelationship, Stance,
};
use crate::schema;

use super::{parse_datetime, parse_datetime_opt};

/// Deal record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::deals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DealRecord {
    pub id: String,
    pub user_id: String,
    pub account_name: String,
    pub deal_value: f64,
    pub currency: String,
    pub stage: String,
    pub expected_close_month: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// New deal for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::deals)]
pub struct NewDeal<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub account_name: &'a str,
    pub deal_value: f64,
    pub currency: &'a str,
    pub stage: &'a str,
    pub expected_close_month: Option<&'a str>,
    pub status: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

impl From<DealRecord> for Deal {
    fn from(r: DealRecord) -> Self {
        Deal {
            status: DealStatus::from_str(&r.status).unwrap_or(DealStatus::Active),
            id: r.id,
            user_id: r.user_id,
            account_name: r.account_name,
            deal_value: r.deal_value,
            currency: r.currency,
            stage: r.stage,
            expected_close_month: r.expected_close_month,
            created_at: parse_datetime(&r.created_at),
            updated_at: parse_datetime(&r.updated_at),
        }
    }
}

/// Meeting record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::meetings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MeetingRecord {
    pub id: String,
    pub deal_id: String,
    pub user_id: String,
    pub title: String,
    pub channel: String,
    pub meeting_date: String,
    pub raw_notes: String,
    pub stakeholders: String,
    pub quotes: String,
    pub objections: String,
    pub risks: String,
    pub approval_clues: String,
    pub extraction_status: String,
    pub extraction_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New meeting for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::meetings)]
pub struct NewMeeting<'a> {
    pub id: &'a str,
    pub deal_id: &'a str,
    pub user_id: &'a str,
    pub title: &'a str,
    pub channel: &'a str,
    pub meeting_date: &'a str,
    pub raw_notes: &'a str,
    pub stakeholders: &'a str,
    pub quotes: &'a str,
    pub objections: &'a str,
    pub risks: &'a str,
    pub approval_clues: &'a str,
    pub extraction_status: &'a str,
    pub extraction_error: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

impl From<MeetingRecord> for Meeting {
    fn from(r: MeetingRecord) -> Self {
        Meeting {
            meeting_date: NaiveDate::parse_from_str(&r.meeting_date, "%Y-%m-%d")
                .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
            stakeholders: serde_json::from_str(&r.stakeholders).unwrap_or_default(),
            quotes: serde_json::from_str(&r.quotes).unwrap_or_default(),
            objections: serde_json::from_str(&r.objections).unwrap_or_default(),
            risks: serde_json::from_str(&r.risks).unwrap_or_default(),
            approval_clues: serde_json::from_str(&r.approval_clues).unwrap_or_default(),
            extraction_status: ExtractionStatus::from_str(&r.extraction_status)
                .unwrap_or(ExtractionStatus::Pending),
            extraction_error: r.extraction_error,
            id: r.id,
            deal_id: r.deal_id,
            user_id: r.user_id,
            title: r.title,
            channel: r.channel,
            raw_notes: r.raw_notes,
            created_at: parse_datetime(&r.created_at),
            updated_at: parse_datetime(&r.updated_at),
        }
    }
}

/// Stakeholder record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::stakeholders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StakeholderRecord {
    pub id: String,
    pub deal_id: String,
    pub user_id: String,
    pub name: String,
    pub role_title: String,
    pub department: Option<String>,
    pub stance: Option<String>,
    pub power: Option<String>,
    pub communication_style: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New stakeholder for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::stakeholders)]
pub struct NewStakeholder<'a> {
    pub id: &'a str,
    pub deal_id: &'a str,
    pub user_id: &'a str,
    pub name: &'a str,
    pub role_title: &'a str,
    pub department: Option<&'a str>,
    pub stance: Option<&'a str>,
    pub power: Option<&'a str>,
    pub communication_style: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

impl From<StakeholderRecord> for Stakeholder {
    fn from(r: StakeholderRecord) -> Self {
        Stakeholder {
            stance: r.stance.as_deref().and_then(Stance::from_str),
            power: r.power.as_deref().and_then(Power::from_str),
            id: r.id,
            deal_id: r.deal_id,
            user_id: r.user_id,
            name: r.name,
            role_title: r.role_title,
            department: r.department,
            communication_style: r.communication_style,
            notes: r.notes,
            created_at: parse_datetime(&r.created_at),
            updated_at: parse_datetime(&r.updated_at),
        }
    }
}

/// Stakeholder mention record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::stakeholder_mentions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StakeholderMentionRecord {
    pub id: String,
    pub stakeholder_id: String,
    pub meeting_id: String,
    pub created_at: String,
}

/// New stakeholder mention for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::stakeholder_mentions)]
pub struct NewStakeholderMention<'a> {
    pub id: &'a str,
    pub stakeholder_id: &'a str,
    pub meeting_id: &'a str,
    pub created_at: &'a str,
}

/// Stakeholder relationship record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::stakeholder_relationships)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StakeholderRelationshipRecord {
    pub id: String,
    pub deal_id: String,
    pub from_stakeholder_id: String,
    pub to_stakeholder_id: String,
    pub relationship_type: String,
    pub confidence: f64,
    pub created_at: String,
}

/// New stakeholder relationship for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::stakeholder_relationships)]
pub struct NewStakeholderRelationship<'a> {
    pub id: &'a str,
    pub deal_id: &'a str,
    pub from_stakeholder_id: &'a str,
    pub to_stakeholder_id: &'a str,
    pub relationship_type: &'a str,
    pub confidence: f64,
    pub created_at: &'a str,
}

impl From<StakeholderRelationshipRecord> for StakeholderRelationship {
    fn from(r: StakeholderRelationshipRecord) -> Self {
        StakeholderRelationship {
            relationship_type: RelationshipType::from_str(&r.relationship_type)
                .unwrap_or(RelationshipType::CollaboratesWith),
            id: r.id,
            deal_id: r.deal_id,
            from_stakeholder_id: r.from_stakeholder_id,
            to_stakeholder_id: r.to_stakeholder_id,
            confidence: r.confidence,
            created_at: parse_datetime(&r.created_at),
        }
    }
}

/// API usage counter record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::user_api_usage)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UsageRecord {
    pub id: String,
    pub user_id: String,
    pub endpoint: String,
    pub period_start: String,
    pub call_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// New usage counter for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::user_api_usage)]
pub struct NewUsage<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub endpoint: &'a str,
    pub period_start: &'a str,
    pub call_count: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Simulation record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::simulations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SimulationRecord {
    pub id: String,
    pub deal_id: String,
    pub user_id: String,
    pub stakeholder_ids: String,
    pub meeting_goal: Option<String>,
    pub transcript: String,
    pub debrief: Option<String>,
    pub status: String,
    pub created_at: String,
    pub ended_at: Option<String>,
}

/// New simulation for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::simulations)]
pub struct NewSimulation<'a> {
    pub id: &'a str,
    pub deal_id: &'a str,
    pub user_id: &'a str,
    pub stakeholder_ids: &'a str,
    pub meeting_goal: Option<&'a str>,
    pub transcript: &'a str,
    pub debrief: Option<&'a str>,
    pub status: &'a str,
    pub created_at: &'a str,
    pub ended_at: Option<&'a str>,
}

impl From<SimulationRecord> for Simulation {
    fn from(r: SimulationRecord) -> Self {
        Simulation {
            stakeholder_ids: serde_json::from_str(&r.stakeholder_ids).unwrap_or_default(),
            transcript: serde_json::from_str(&r.transcript).unwrap_or_default(),
            debrief: r
                .debrief
                .as_deref()
                .and_then(|d| serde_json::from_str::<Debrief>(d).ok()),
            status: SimulationStatus::from_str(&r.status).unwrap_or(SimulationStatus::Active),
            id: r.id,
            deal_id: r.deal_id,
            user_id: r.user_id,
            meeting_goal: r.meeting_goal,
            created_at: parse_datetime(&r.created_at),
            ended_at: parse_datetime_opt(r.ended_at),
        }
    }
}
