//! Daily API usage counters.
//!
//! One row per (user, endpoint, UTC day). Rows are created on the first
//! call of the day and incremented afterwards; old rows are simply never
//! queried again once the day rolls over.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::schema::user_api_usage;

use super::pool::{AsyncSqlitePool, DieselError};
use super::records::{NewUsage, UsageRecord};

/// Counter state for one (user, endpoint, day).
#[derive(Debug, Clone)]
pub struct UsageRow {
    pub id: String,
    pub call_count: i32,
}

/// Repository for usage counter rows.
#[derive(Clone)]
pub struct UsageRepository {
    pool: AsyncSqlitePool,
}

impl UsageRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get the counter row for a (user, endpoint, day), if any.
    pub async fn get_day(
        &self,
        user_id: &str,
        endpoint: &str,
        period_start: &str,
    ) -> Result<Option<UsageRow>, DieselError> {
        let mut conn = self.pool.get().await?;
        let record = user_api_usage::table
            .filter(user_api_usage::user_id.eq(user_id))
            .filter(user_api_usage::endpoint.eq(endpoint))
            .filter(user_api_usage::period_start.eq(period_start))
            .first::<UsageRecord>(&mut conn)
            .await
            .optional()?;
        Ok(record.map(|r| UsageRow {
            id: r.id,
            call_count: r.call_count,
        }))
    }

    /// Create the day's counter row with count=1.
    ///
    /// Racing creators surface a uniqueness violation the limiter treats
    /// as "counter now exists".
    pub async fn create_day(
        &self,
        user_id: &str,
        endpoint: &str,
        period_start: &str,
    ) -> Result<(), DieselError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let record = NewUsage {
            id: &id,
            user_id,
            endpoint,
            period_start,
            call_count: 1,
            created_at: &now,
            updated_at: &now,
        };

        let mut conn = self.pool.get().await?;
        diesel::insert_into(user_api_usage::table)
            .values(&record)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Atomically increment a counter row.
    pub async fn increment(&self, id: &str) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        diesel::update(user_api_usage::table.find(id))
            .set((
                user_api_usage::call_count.eq(user_api_usage::call_count + 1),
                user_api_usage::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::context::DbContext;
    use super::super::util::is_unique_violation;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_counter_lifecycle() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let repo = ctx.usage();

        assert!(repo.get_day("u1", "extract", "2025-06-12").await.unwrap().is_none());

        repo.create_day("u1", "extract", "2025-06-12").await.unwrap();
        let row = repo.get_day("u1", "extract", "2025-06-12").await.unwrap().unwrap();
        assert_eq!(row.call_count, 1);

        repo.increment(&row.id).await.unwrap();
        let row = repo.get_day("u1", "extract", "2025-06-12").await.unwrap().unwrap();
        assert_eq!(row.call_count, 2);

        // A second creator for the same day loses on the unique constraint.
        let err = repo.create_day("u1", "extract", "2025-06-12").await.unwrap_err();
        assert!(is_unique_violation(&err));

        // A new day starts a fresh counter.
        repo.create_day("u1", "extract", "2025-06-13").await.unwrap();
        let row = repo.get_day("u1", "extract", "2025-06-13").await.unwrap().unwrap();
        assert_eq!(row.call_count, 1);
    }
}
