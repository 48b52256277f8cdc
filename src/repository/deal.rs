//! Deal repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::models::Deal;
use crate::schema::deals;

use super::pool::{AsyncSqlitePool, DieselError};
use super::records::{DealRecord, NewDeal};

/// Repository for deal rows.
#[derive(Clone)]
pub struct DealRepository {
    pool: AsyncSqlitePool,
}

impl DealRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a deal.
    pub async fn save(&self, deal: &Deal) -> Result<(), DieselError> {
        let created_at = deal.created_at.to_rfc3339();
        let updated_at = deal.updated_at.to_rfc3339();

        let record = NewDeal {
            id: &deal.id,
            user_id: &deal.user_id,
            account_name: &deal.account_name,
            deal_value: deal.deal_value,
            currency: &deal.currency,
            stage: &deal.stage,
            expected_close_month: deal.expected_close_month.as_deref(),
            status: deal.status.as_str(),
            created_at: &created_at,
            updated_at: &updated_at,
        };

        let mut conn = self.pool.get().await?;
        diesel::insert_into(deals::table)
            .values(&record)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Get a deal by id.
    pub async fn get(&self, id: &str) -> Result<Option<Deal>, DieselError> {
        let mut conn = self.pool.get().await?;
        deals::table
            .find(id)
            .first::<DealRecord>(&mut conn)
            .await
            .optional()
            .map(|r| r.map(Deal::from))
    }

    /// List all deals owned by a user, newest first.
    #[allow(dead_code)]
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Deal>, DieselError> {
        let mut conn = self.pool.get().await?;
        let records = deals::table
            .filter(deals::user_id.eq(user_id))
            .order(deals::created_at.desc())
            .load::<DealRecord>(&mut conn)
            .await?;
        Ok(records.into_iter().map(Deal::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::DbContext;
    use crate::models::Deal;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_deal_crud() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();

        let repo = ctx.deals();
        let deal = Deal::new(
            "user-1".to_string(),
            "Acme Corp".to_string(),
            250_000.0,
            "USD".to_string(),
        );
        repo.save(&deal).await.unwrap();

        let fetched = repo.get(&deal.id).await.unwrap().unwrap();
        assert_eq!(fetched.account_name, "Acme Corp");
        assert_eq!(fetched.stage, "discovery");

        let all = repo.list_for_user("user-1").await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(repo.get("missing").await.unwrap().is_none());
    }
}
