//! Stakeholder repository: dedup, mentions, relationships.
//!
//! The uniqueness constraints live in the schema, not here. Every insert
//! that can collide treats the violation as "pre-existing winner": the
//! stakeholder path re-reads and reuses the row, the mention and
//! relationship paths simply report that the link already existed.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::{Stakeholder, StakeholderRelationship};
use crate::schema::{stakeholder_mentions, stakeholder_relationships, stakeholders};

use super::pool::{AsyncSqlitePool, DieselError};
use super::records::{
    NewStakeholder, NewStakeholderMention, NewStakeholderRelationship, StakeholderRecord,
    StakeholderRelationshipRecord,
};
use super::util::is_unique_violation;

/// Repository for stakeholder rows and their meeting/relationship links.
#[derive(Clone)]
pub struct StakeholderRepository {
    pool: AsyncSqlitePool,
}

impl StakeholderRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get a stakeholder by id.
    pub async fn get(&self, id: &str) -> Result<Option<Stakeholder>, DieselError> {
        let mut conn = self.pool.get().await?;
        stakeholders::table
            .find(id)
            .first::<StakeholderRecord>(&mut conn)
            .await
            .optional()
            .map(|r| r.map(Stakeholder::from))
    }

    /// Get a stakeholder by its dedup key.
    pub async fn get_by_key(
        &self,
        deal_id: &str,
        name: &str,
        role_title: &str,
    ) -> Result<Option<Stakeholder>, DieselError> {
        let mut conn = self.pool.get().await?;
        stakeholders::table
            .filter(stakeholders::deal_id.eq(deal_id))
            .filter(stakeholders::name.eq(name))
            .filter(stakeholders::role_title.eq(role_title))
            .first::<StakeholderRecord>(&mut conn)
            .await
            .optional()
            .map(|r| r.map(Stakeholder::from))
    }

    /// Create a stakeholder, or reuse the existing row for the same
    /// (deal, name, role_title) key.
    ///
    /// A concurrent insert losing the race lands on the unique constraint;
    /// the conflict means the row now exists, so it is re-read and returned.
    pub async fn find_or_create(
        &self,
        deal_id: &str,
        user_id: &str,
        name: &str,
        role_title: &str,
    ) -> Result<Stakeholder, DieselError> {
        let candidate = Stakeholder::new(
            deal_id.to_string(),
            user_id.to_string(),
            name.to_string(),
            role_title.to_string(),
        );

        match self.insert(&candidate).await {
            Ok(()) => Ok(candidate),
            Err(e) if is_unique_violation(&e) => self
                .get_by_key(deal_id, name, role_title)
                .await?
                .ok_or(DieselError::NotFound),
            Err(e) => Err(e),
        }
    }

    async fn insert(&self, stakeholder: &Stakeholder) -> Result<(), DieselError> {
        let created_at = stakeholder.created_at.to_rfc3339();
        let updated_at = stakeholder.updated_at.to_rfc3339();

        let record = NewStakeholder {
            id: &stakeholder.id,
            deal_id: &stakeholder.deal_id,
            user_id: &stakeholder.user_id,
            name: &stakeholder.name,
            role_title: &stakeholder.role_title,
            department: stakeholder.department.as_deref(),
            stance: stakeholder.stance.map(|s| s.as_str()),
            power: stakeholder.power.map(|p| p.as_str()),
            communication_style: stakeholder.communication_style.as_deref(),
            notes: stakeholder.notes.as_deref(),
            created_at: &created_at,
            updated_at: &updated_at,
        };

        let mut conn = self.pool.get().await?;
        diesel::insert_into(stakeholders::table)
            .values(&record)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// All stakeholders on a deal.
    pub async fn list_for_deal(&self, deal_id: &str) -> Result<Vec<Stakeholder>, DieselError> {
        let mut conn = self.pool.get().await?;
        let records = stakeholders::table
            .filter(stakeholders::deal_id.eq(deal_id))
            .order(stakeholders::created_at.asc())
            .load::<StakeholderRecord>(&mut conn)
            .await?;
        Ok(records.into_iter().map(Stakeholder::from).collect())
    }

    /// Update the qualitative insight fields on a stakeholder.
    pub async fn update_insights(
        &self,
        id: &str,
        stance: Option<&str>,
        power: Option<&str>,
        communication_style: Option<&str>,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        diesel::update(stakeholders::table.find(id))
            .set((
                stakeholders::stance.eq(stance),
                stakeholders::power.eq(power),
                stakeholders::communication_style.eq(communication_style),
                stakeholders::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Link a stakeholder to a meeting.
    ///
    /// Returns false when the mention already existed; re-extraction must
    /// not create duplicate links.
    pub async fn link_mention(
        &self,
        stakeholder_id: &str,
        meeting_id: &str,
    ) -> Result<bool, DieselError> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = Utc::now().to_rfc3339();
        let record = NewStakeholderMention {
            id: &id,
            stakeholder_id,
            meeting_id,
            created_at: &created_at,
        };

        let mut conn = self.pool.get().await?;
        let result = diesel::insert_into(stakeholder_mentions::table)
            .values(&record)
            .execute(&mut conn)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Number of mention rows pointing at a meeting.
    #[allow(dead_code)]
    pub async fn mention_count_for_meeting(&self, meeting_id: &str) -> Result<i64, DieselError> {
        use diesel::dsl::count_star;
        let mut conn = self.pool.get().await?;
        stakeholder_mentions::table
            .filter(stakeholder_mentions::meeting_id.eq(meeting_id))
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// Insert a directed relationship edge.
    ///
    /// Returns false when the same edge already existed.
    pub async fn add_relationship(
        &self,
        rel: &StakeholderRelationship,
    ) -> Result<bool, DieselError> {
        let created_at = rel.created_at.to_rfc3339();
        let record = NewStakeholderRelationship {
            id: &rel.id,
            deal_id: &rel.deal_id,
            from_stakeholder_id: &rel.from_stakeholder_id,
            to_stakeholder_id: &rel.to_stakeholder_id,
            relationship_type: rel.relationship_type.as_str(),
            confidence: rel.confidence,
            created_at: &created_at,
        };

        let mut conn = self.pool.get().await?;
        let result = diesel::insert_into(stakeholder_relationships::table)
            .values(&record)
            .execute(&mut conn)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// All relationship edges on a deal.
    pub async fn relationships_for_deal(
        &self,
        deal_id: &str,
    ) -> Result<Vec<StakeholderRelationship>, DieselError> {
        let mut conn = self.pool.get().await?;
        let records = stakeholder_relationships::table
            .filter(stakeholder_relationships::deal_id.eq(deal_id))
            .load::<StakeholderRelationshipRecord>(&mut conn)
            .await?;
        Ok(records
            .into_iter()
            .map(StakeholderRelationship::from)
            .collect())
    }
}
