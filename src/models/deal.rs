//! Deal models.
//!
//! A deal is the ownership root: meetings, stakeholders, and simulations
//! all hang off a deal, which belongs to a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Active,
    Archived,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// An enterprise sales deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub user_id: String,
    /// Account (company) the deal is with.
    pub account_name: String,
    pub deal_value: f64,
    /// ISO currency code for `deal_value`.
    pub currency: String,
    /// Sales stage label (discovery, evaluation, negotiation, ...).
    pub stage: String,
    pub expected_close_month: Option<String>,
    pub status: DealStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    pub fn new(user_id: String, account_name: String, deal_value: f64, currency: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            account_name,
            deal_value,
            currency,
            stage: "discovery".to_string(),
            expected_close_month: None,
            status: DealStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}
