//! Stakeholder models.
//!
//! Stakeholders are deduplicated per deal by (name, role_title); the same
//! person showing up in five meetings is one row with five mentions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stakeholder's disposition toward the deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Positive,
    Neutral,
    Negative,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Decision authority within the buying organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Power {
    Low,
    Medium,
    High,
}

impl Power {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A person involved in a deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stakeholder {
    pub id: String,
    pub deal_id: String,
    pub user_id: String,
    pub name: String,
    pub role_title: String,
    pub department: Option<String>,
    pub stance: Option<Stance>,
    pub power: Option<Power>,
    pub communication_style: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stakeholder {
    pub fn new(deal_id: String, user_id: String, name: String, role_title: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            deal_id,
            user_id,
            name,
            role_title,
            department: None,
            stance: None,
            power: None,
            communication_style: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Kind of directed edge between two stakeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    ReportsTo,
    Influences,
    CollaboratesWith,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReportsTo => "reports_to",
            Self::Influences => "influences",
            Self::CollaboratesWith => "collaborates_with",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "reports_to" => Some(Self::ReportsTo),
            "influences" => Some(Self::Influences),
            "collaborates_with" => Some(Self::CollaboratesWith),
            _ => None,
        }
    }
}

/// A directed edge between two stakeholders on the same deal.
///
/// Confidence is the model's when the edge was inferred during extraction;
/// edges created by direct user action always carry 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeholderRelationship {
    pub id: String,
    pub deal_id: String,
    pub from_stakeholder_id: String,
    pub to_stakeholder_id: String,
    pub relationship_type: RelationshipType,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl StakeholderRelationship {
    pub fn new(
        deal_id: String,
        from_stakeholder_id: String,
        to_stakeholder_id: String,
        relationship_type: RelationshipType,
        confidence: f64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            deal_id,
            from_stakeholder_id,
            to_stakeholder_id,
            relationship_type,
            confidence,
            created_at: Utc::now(),
        }
    }
}

/// A relationship as the model described it, by name rather than id.
///
/// Best-effort signal: both names still have to resolve against the deal's
/// stakeholders before anything is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub to_name: String,
    #[serde(default)]
    pub relationship_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}
