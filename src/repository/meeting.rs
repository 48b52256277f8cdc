//! Meeting repository.
//!
//! The enrichment pipeline owns most mutations here: the status column
//! walks pending -> processing -> completed|failed, and the artifact
//! columns are only written on a successful extraction.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::{
    ApprovalClue, ExtractedObjection, ExtractedQuote, ExtractedRisk, ExtractedStakeholder,
    ExtractionStatus, Meeting,
};
use crate::schema::meetings;

use super::pool::{AsyncSqlitePool, DieselError};
use super::records::{MeetingRecord, NewMeeting};

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

/// Repository for meeting rows.
#[derive(Clone)]
pub struct MeetingRepository {
    pool: AsyncSqlitePool,
}

impl MeetingRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a meeting.
    pub async fn save(&self, meeting: &Meeting) -> Result<(), DieselError> {
        let meeting_date = meeting.meeting_date.format("%Y-%m-%d").to_string();
        let stakeholders = to_json(&meeting.stakeholders);
        let quotes = to_json(&meeting.quotes);
        let objections = to_json(&meeting.objections);
        let risks = to_json(&meeting.risks);
        let approval_clues = to_json(&meeting.approval_clues);
        let created_at = meeting.created_at.to_rfc3339();
        let updated_at = meeting.updated_at.to_rfc3339();

        let record = NewMeeting {
            id: &meeting.id,
            deal_id: &meeting.deal_id,
            user_id: &meeting.user_id,
            title: &meeting.title,
            channel: &meeting.channel,
            meeting_date: &meeting_date,
            raw_notes: &meeting.raw_notes,
            stakeholders: &stakeholders,
            quotes: &quotes,
            objections: &objections,
            risks: &risks,
            approval_clues: &approval_clues,
            extraction_status: meeting.extraction_status.as_str(),
            extraction_error: meeting.extraction_error.as_deref(),
            created_at: &created_at,
            updated_at: &updated_at,
        };

        let mut conn = self.pool.get().await?;
        diesel::insert_into(meetings::table)
            .values(&record)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Get a meeting by id.
    pub async fn get(&self, id: &str) -> Result<Option<Meeting>, DieselError> {
        let mut conn = self.pool.get().await?;
        meetings::table
            .find(id)
            .first::<MeetingRecord>(&mut conn)
            .await
            .optional()
            .map(|r| r.map(Meeting::from))
    }

    /// Move a meeting into a bare status (no artifact changes).
    pub async fn set_status(&self, id: &str, status: ExtractionStatus) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        diesel::update(meetings::table.find(id))
            .set((
                meetings::extraction_status.eq(status.as_str()),
                meetings::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Persist extraction results and mark the meeting completed.
    ///
    /// Clears any previous extraction error.
    #[allow(clippy::too_many_arguments)]
    pub async fn mark_completed(
        &self,
        id: &str,
        stakeholders: &[ExtractedStakeholder],
        quotes: &[ExtractedQuote],
        objections: &[ExtractedObjection],
        risks: &[ExtractedRisk],
        approval_clues: &[ApprovalClue],
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        diesel::update(meetings::table.find(id))
            .set((
                meetings::stakeholders.eq(to_json(&stakeholders)),
                meetings::quotes.eq(to_json(&quotes)),
                meetings::objections.eq(to_json(&objections)),
                meetings::risks.eq(to_json(&risks)),
                meetings::approval_clues.eq(to_json(&approval_clues)),
                meetings::extraction_status.eq(ExtractionStatus::Completed.as_str()),
                meetings::extraction_error.eq(None::<String>),
                meetings::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Mark a meeting's extraction as failed with a human-readable message.
    pub async fn mark_failed(&self, id: &str, error: &str) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        diesel::update(meetings::table.find(id))
            .set((
                meetings::extraction_status.eq(ExtractionStatus::Failed.as_str()),
                meetings::extraction_error.eq(Some(error)),
                meetings::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Most recent meetings for a deal, newest meeting date first.
    pub async fn recent_for_deal(
        &self,
        deal_id: &str,
        limit: i64,
    ) -> Result<Vec<Meeting>, DieselError> {
        let mut conn = self.pool.get().await?;
        let records = meetings::table
            .filter(meetings::deal_id.eq(deal_id))
            .order(meetings::meeting_date.desc())
            .limit(limit)
            .load::<MeetingRecord>(&mut conn)
            .await?;
        Ok(records.into_iter().map(Meeting::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::DbContext;
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample_meeting() -> Meeting {
        Meeting::new(
            "deal-1".to_string(),
            "user-1".to_string(),
            "Kickoff".to_string(),
            "call".to_string(),
            NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
            "Sarah Chen (VP Eng) is excited about the integration.".to_string(),
        )
    }

    #[tokio::test]
    async fn test_meeting_status_flow() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let mut deal = crate::models::Deal::new(
            "user-1".to_string(),
            "Acme Corp".to_string(),
            0.0,
            "USD".to_string(),
        );
        deal.id = "deal-1".to_string();
        ctx.deals().save(&deal).await.unwrap();
        let repo = ctx.meetings();

        let meeting = sample_meeting();
        repo.save(&meeting).await.unwrap();

        let fetched = repo.get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(fetched.extraction_status, ExtractionStatus::Pending);

        repo.set_status(&meeting.id, ExtractionStatus::Processing)
            .await
            .unwrap();
        let fetched = repo.get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(fetched.extraction_status, ExtractionStatus::Processing);

        repo.mark_failed(&meeting.id, "AI extraction failed")
            .await
            .unwrap();
        let fetched = repo.get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(fetched.extraction_status, ExtractionStatus::Failed);
        assert_eq!(fetched.extraction_error.as_deref(), Some("AI extraction failed"));
    }

    #[tokio::test]
    async fn test_mark_completed_persists_artifacts_and_clears_error() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let mut deal = crate::models::Deal::new(
            "user-1".to_string(),
            "Acme Corp".to_string(),
            0.0,
            "USD".to_string(),
        );
        deal.id = "deal-1".to_string();
        ctx.deals().save(&deal).await.unwrap();
        let repo = ctx.meetings();

        let meeting = sample_meeting();
        repo.save(&meeting).await.unwrap();
        repo.mark_failed(&meeting.id, "transient").await.unwrap();

        let stakeholders = vec![ExtractedStakeholder {
            name: "Sarah Chen".to_string(),
            role_title: "VP Engineering".to_string(),
            ..Default::default()
        }];
        let risks = vec![ExtractedRisk {
            risk_description: "Budget timeline concern".to_string(),
            severity: "medium".to_string(),
            ..Default::default()
        }];
        repo.mark_completed(&meeting.id, &stakeholders, &[], &[], &risks, &[])
            .await
            .unwrap();

        let fetched = repo.get(&meeting.id).await.unwrap().unwrap();
        assert_eq!(fetched.extraction_status, ExtractionStatus::Completed);
        assert!(fetched.extraction_error.is_none());
        assert_eq!(fetched.stakeholders.len(), 1);
        assert_eq!(fetched.risks.len(), 1);
        assert_eq!(fetched.risks[0].risk_description, "Budget timeline concern");
    }
}
