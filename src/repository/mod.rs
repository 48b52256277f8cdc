//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! over SQLite. Timestamps are stored as RFC3339 text; artifact arrays and
//! transcripts are stored as JSON text columns.

pub mod context;
pub mod pool;
pub mod records;
pub mod util;

pub mod deal;
pub mod meeting;
pub mod simulation;
pub mod stakeholder;
pub mod usage;

pub use context::DbContext;
pub use pool::{AsyncSqlitePool, DieselError};

pub use deal::DealRepository;
pub use meeting::MeetingRepository;
pub use simulation::SimulationRepository;
pub use stakeholder::StakeholderRepository;
pub use usage::{UsageRepository, UsageRow};

use chrono::{DateTime, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
