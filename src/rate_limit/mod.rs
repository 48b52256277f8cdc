//! Per-user, per-endpoint daily call budgets.
//!
//! Usage is keyed by UTC calendar day, not a rolling window: the first call
//! of the day creates a counter row, later calls increment it, and the
//! budget resets at the next UTC midnight. All coordination goes through
//! the counter table; the only race (two first-calls creating the same day
//! row) resolves through the unique constraint.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::repository::util::is_unique_violation;
use crate::repository::{DieselError, UsageRepository};

/// Endpoint names used as rate-limit keys.
pub mod endpoints {
    pub const EXTRACT_MEETING_INTELLIGENCE: &str = "extract-meeting-intelligence";
    pub const GENERATE_PREP_BRIEF: &str = "generate-prep-brief";
    pub const SIMULATION_CHAT: &str = "simulation-chat";
    pub const GENERATE_DEBRIEF: &str = "generate-debrief";
    pub const UPDATE_STAKEHOLDER_INSIGHTS: &str = "update-stakeholder-insights";
}

/// Daily quota for an endpoint. Unconfigured endpoints get a loose default.
fn quota_for(endpoint: &str) -> i32 {
    match endpoint {
        endpoints::EXTRACT_MEETING_INTELLIGENCE => 10,
        endpoints::GENERATE_PREP_BRIEF => 20,
        endpoints::SIMULATION_CHAT => 50,
        endpoints::GENERATE_DEBRIEF => 20,
        endpoints::UPDATE_STAKEHOLDER_INSIGHTS => 20,
        _ => 100,
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: i32,
    pub limit: i32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Seconds until the budget resets, for `Retry-After`.
    pub fn retry_after_secs(&self) -> i64 {
        (self.reset_at - Utc::now()).num_seconds().max(0)
    }
}

/// Next UTC midnight after now.
fn next_utc_midnight() -> DateTime<Utc> {
    let tomorrow = Utc::now()
        .date_naive()
        .succ_opt()
        .expect("date overflow");
    tomorrow
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
}

/// Daily rate limiter backed by the usage counter table.
#[derive(Clone)]
pub struct RateLimiter {
    usage: UsageRepository,
}

impl RateLimiter {
    pub fn new(usage: UsageRepository) -> Self {
        Self { usage }
    }

    /// Check the caller's budget for an endpoint and consume one call.
    ///
    /// Never fails: an unexpected counter-store error is logged as an
    /// anomaly and the call is allowed through (fail open). Quota
    /// enforcement is not worth breaking the product over.
    pub async fn check_and_consume(&self, user_id: &str, endpoint: &str) -> RateLimitDecision {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let reset_at = next_utc_midnight();

        match self.check(user_id, endpoint, &today, reset_at).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    user_id,
                    endpoint,
                    error = %e,
                    "rate limit check failed, allowing request"
                );
                RateLimitDecision {
                    allowed: true,
                    remaining: 999,
                    limit: 999,
                    reset_at: Utc::now(),
                }
            }
        }
    }

    async fn check(
        &self,
        user_id: &str,
        endpoint: &str,
        period_start: &str,
        reset_at: DateTime<Utc>,
    ) -> Result<RateLimitDecision, DieselError> {
        let limit = quota_for(endpoint);
        let mut retried = false;

        loop {
            match self.usage.get_day(user_id, endpoint, period_start).await? {
                None => match self.usage.create_day(user_id, endpoint, period_start).await {
                    Ok(()) => {
                        return Ok(RateLimitDecision {
                            allowed: true,
                            remaining: limit - 1,
                            limit,
                            reset_at,
                        });
                    }
                    // Lost the first-call-of-the-day race: the counter now
                    // exists, so re-run the check against it.
                    Err(e) if is_unique_violation(&e) && !retried => {
                        retried = true;
                        continue;
                    }
                    Err(e) => return Err(e),
                },
                Some(row) => {
                    if row.call_count >= limit {
                        return Ok(RateLimitDecision {
                            allowed: false,
                            remaining: 0,
                            limit,
                            reset_at,
                        });
                    }
                    self.usage.increment(&row.id).await?;
                    return Ok(RateLimitDecision {
                        allowed: true,
                        remaining: limit - row.call_count - 1,
                        limit,
                        reset_at,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup() -> (RateLimiter, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (RateLimiter::new(ctx.usage()), dir)
    }

    #[tokio::test]
    async fn test_quota_exhaustion() {
        let (limiter, _dir) = setup().await;
        let reset_at = next_utc_midnight();
        let limit = quota_for(endpoints::EXTRACT_MEETING_INTELLIGENCE);

        let mut last_remaining = limit;
        for _ in 0..limit {
            let d = limiter
                .check("u1", endpoints::EXTRACT_MEETING_INTELLIGENCE, "2025-06-12", reset_at)
                .await
                .unwrap();
            assert!(d.allowed);
            assert!(d.remaining < last_remaining, "remaining must strictly decrease");
            last_remaining = d.remaining;
        }
        assert_eq!(last_remaining, 0);

        // Calls limit+1 and beyond are rejected.
        for _ in 0..2 {
            let d = limiter
                .check("u1", endpoints::EXTRACT_MEETING_INTELLIGENCE, "2025-06-12", reset_at)
                .await
                .unwrap();
            assert!(!d.allowed);
            assert_eq!(d.remaining, 0);
            assert_eq!(d.limit, limit);
        }
    }

    #[tokio::test]
    async fn test_day_rollover_resets_budget() {
        let (limiter, _dir) = setup().await;
        let reset_at = next_utc_midnight();

        for _ in 0..10 {
            limiter
                .check("u1", endpoints::EXTRACT_MEETING_INTELLIGENCE, "2025-06-12", reset_at)
                .await
                .unwrap();
        }
        let d = limiter
            .check("u1", endpoints::EXTRACT_MEETING_INTELLIGENCE, "2025-06-12", reset_at)
            .await
            .unwrap();
        assert!(!d.allowed);

        // Day D's usage does not count against day D+1.
        let d = limiter
            .check("u1", endpoints::EXTRACT_MEETING_INTELLIGENCE, "2025-06-13", reset_at)
            .await
            .unwrap();
        assert!(d.allowed);
        assert_eq!(d.remaining, 9);
    }

    #[tokio::test]
    async fn test_endpoints_and_users_are_isolated() {
        let (limiter, _dir) = setup().await;
        let reset_at = next_utc_midnight();

        for _ in 0..10 {
            limiter
                .check("u1", endpoints::EXTRACT_MEETING_INTELLIGENCE, "2025-06-12", reset_at)
                .await
                .unwrap();
        }

        let d = limiter
            .check("u1", endpoints::GENERATE_PREP_BRIEF, "2025-06-12", reset_at)
            .await
            .unwrap();
        assert!(d.allowed, "a different endpoint has its own budget");

        let d = limiter
            .check("u2", endpoints::EXTRACT_MEETING_INTELLIGENCE, "2025-06-12", reset_at)
            .await
            .unwrap();
        assert!(d.allowed, "a different user has their own budget");
    }

    #[tokio::test]
    async fn test_unknown_endpoint_gets_default_quota() {
        let (limiter, _dir) = setup().await;
        let reset_at = next_utc_midnight();
        let d = limiter
            .check("u1", "some-new-endpoint", "2025-06-12", reset_at)
            .await
            .unwrap();
        assert!(d.allowed);
        assert_eq!(d.limit, 100);
        assert_eq!(d.remaining, 99);
    }

    #[tokio::test]
    async fn test_fail_open_on_store_error() {
        let dir = tempdir().unwrap();
        // No schema: every counter query fails, so the limiter must allow.
        let ctx = DbContext::from_path(&dir.path().join("missing.db"));
        let limiter = RateLimiter::new(ctx.usage());

        let d = limiter
            .check_and_consume("u1", endpoints::EXTRACT_MEETING_INTELLIGENCE)
            .await;
        assert!(d.allowed);
        assert_eq!(d.remaining, 999);
    }
}
