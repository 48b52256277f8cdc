//! Database context for managing connections and repository access.
//!
//! Provides a unified entry point for database operations using Diesel ORM.
//! Create one context per command or service, then use it to access all
//! repositories.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::deal::DealRepository;
use super::meeting::MeetingRepository;
use super::pool::{AsyncSqlitePool, DieselError};
use super::simulation::SimulationRepository;
use super::stakeholder::StakeholderRepository;
use super::usage::UsageRepository;

/// Database context that manages the connection pool and provides repository access.
#[derive(Clone)]
pub struct DbContext {
    pool: AsyncSqlitePool,
}

impl DbContext {
    /// Create a new database context from a file path.
    #[allow(dead_code)]
    pub fn from_path(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Create a new database context from a database URL.
    ///
    /// Supports SQLite URLs like `sqlite:path/to/db.sqlite` or plain file paths.
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(database_url),
        }
    }

    /// Get a deal repository.
    pub fn deals(&self) -> DealRepository {
        DealRepository::new(self.pool.clone())
    }

    /// Get a meeting repository.
    pub fn meetings(&self) -> MeetingRepository {
        MeetingRepository::new(self.pool.clone())
    }

    /// Get a stakeholder repository.
    pub fn stakeholders(&self) -> StakeholderRepository {
        StakeholderRepository::new(self.pool.clone())
    }

    /// Get a simulation repository.
    pub fn simulations(&self) -> SimulationRepository {
        SimulationRepository::new(self.pool.clone())
    }

    /// Get an API usage repository.
    pub fn usage(&self) -> UsageRepository {
        UsageRepository::new(self.pool.clone())
    }

    /// Initialize all database schemas.
    ///
    /// This creates the necessary tables if they don't exist. The uniqueness
    /// constraints here are load-bearing: stakeholder dedup, idempotent
    /// mention linking, and the rate limiter's day-row race all rely on them.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            -- Deals table
            CREATE TABLE IF NOT EXISTS deals (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                account_name TEXT NOT NULL,
                deal_value REAL NOT NULL DEFAULT 0,
                currency TEXT NOT NULL DEFAULT 'USD',
                stage TEXT NOT NULL DEFAULT 'discovery',
                expected_close_month TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Meetings table
            CREATE TABLE IF NOT EXISTS meetings (
                id TEXT PRIMARY KEY,
                deal_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                channel TEXT NOT NULL DEFAULT 'call',
                meeting_date TEXT NOT NULL,
                raw_notes TEXT NOT NULL,
                stakeholders TEXT NOT NULL DEFAULT '[]',
                quotes TEXT NOT NULL DEFAULT '[]',
                objections TEXT NOT NULL DEFAULT '[]',
                risks TEXT NOT NULL DEFAULT '[]',
                approval_clues TEXT NOT NULL DEFAULT '[]',
                extraction_status TEXT NOT NULL DEFAULT 'pending',
                extraction_error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (deal_id) REFERENCES deals(id)
            );

            -- Stakeholders table (one row per person per deal)
            CREATE TABLE IF NOT EXISTS stakeholders (
                id TEXT PRIMARY KEY,
                deal_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                role_title TEXT NOT NULL,
                department TEXT,
                stance TEXT,
                power TEXT,
                communication_style TEXT,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (deal_id) REFERENCES deals(id),
                UNIQUE (deal_id, name, role_title)
            );

            -- Meeting mentions of stakeholders
            CREATE TABLE IF NOT EXISTS stakeholder_mentions (
                id TEXT PRIMARY KEY,
                stakeholder_id TEXT NOT NULL,
                meeting_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (stakeholder_id) REFERENCES stakeholders(id),
                FOREIGN KEY (meeting_id) REFERENCES meetings(id),
                UNIQUE (stakeholder_id, meeting_id)
            );

            -- Directed edges between stakeholders
            CREATE TABLE IF NOT EXISTS stakeholder_relationships (
                id TEXT PRIMARY KEY,
                deal_id TEXT NOT NULL,
                from_stakeholder_id TEXT NOT NULL,
                to_stakeholder_id TEXT NOT NULL,
                relationship_type TEXT NOT NULL,
                confidence REAL NOT NULL DEFAULT 0.5,
                created_at TEXT NOT NULL,
                FOREIGN KEY (deal_id) REFERENCES deals(id),
                FOREIGN KEY (from_stakeholder_id) REFERENCES stakeholders(id),
                FOREIGN KEY (to_stakeholder_id) REFERENCES stakeholders(id),
                UNIQUE (deal_id, from_stakeholder_id, to_stakeholder_id, relationship_type)
            );

            -- Daily API usage counters
            CREATE TABLE IF NOT EXISTS user_api_usage (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                period_start TEXT NOT NULL,
                call_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (user_id, endpoint, period_start)
            );

            -- Roleplay simulations
            CREATE TABLE IF NOT EXISTS simulations (
                id TEXT PRIMARY KEY,
                deal_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                stakeholder_ids TEXT NOT NULL DEFAULT '[]',
                meeting_goal TEXT,
                transcript TEXT NOT NULL DEFAULT '[]',
                debrief TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                ended_at TEXT,
                FOREIGN KEY (deal_id) REFERENCES deals(id)
            );

            CREATE INDEX IF NOT EXISTS idx_meetings_deal ON meetings(deal_id);
            CREATE INDEX IF NOT EXISTS idx_stakeholders_deal ON stakeholders(deal_id);
            CREATE INDEX IF NOT EXISTS idx_mentions_meeting ON stakeholder_mentions(meeting_id);
            CREATE INDEX IF NOT EXISTS idx_relationships_deal ON stakeholder_relationships(deal_id);
            "#,
        )
        .await?;

        Ok(())
    }
}
