use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, UsageStore};
use crate::models::{PlanTier, QuotaAction, UserUsage};

/// PostgreSQL-backed usage store. Every round trip carries a bounded
/// timeout; a timeout is reported as a store failure, never as success.
pub struct PgUsageStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUsageStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[derive(sqlx::FromRow)]
struct UsageTierRow {
    id: Uuid,
    user_id: Uuid,
    translation_chars_count: i64,
    call_minutes_count: i64,
    storage_used_bytes: i64,
    last_reset_date: DateTime<Utc>,
    tier: Option<PlanTier>,
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn fetch_usage_and_tier(
        &self,
        user_id: Uuid,
    ) -> Result<(UserUsage, PlanTier), StoreError> {
        let query = sqlx::query_as::<_, UsageTierRow>(
            r#"
            SELECT u.id, u.user_id, u.translation_chars_count, u.call_minutes_count,
                   u.storage_used_bytes, u.last_reset_date, s.tier
            FROM user_usage u
            LEFT JOIN subscriptions s
              ON s.user_id = u.user_id AND s.status = 'active'
            WHERE u.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool);

        let row = tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| StoreError::Timeout)??
            .ok_or(StoreError::NotProvisioned(user_id))?;

        let tier = row.tier.unwrap_or(PlanTier::Free);
        let usage = UserUsage {
            id: row.id,
            user_id: row.user_id,
            translation_chars_count: row.translation_chars_count,
            call_minutes_count: row.call_minutes_count,
            storage_used_bytes: row.storage_used_bytes,
            last_reset_date: row.last_reset_date,
        };

        Ok((usage, tier))
    }

    async fn increment_counter(
        &self,
        user_id: Uuid,
        action: QuotaAction,
        amount: i64,
    ) -> Result<(), StoreError> {
        // One statement, evaluated by the store. Never fetch-add-write from
        // here: that races under concurrent callers and loses updates.
        let sql = match action {
            QuotaAction::Translation => {
                "UPDATE user_usage
                 SET translation_chars_count = translation_chars_count + $2
                 WHERE user_id = $1"
            }
            QuotaAction::Call => {
                "UPDATE user_usage
                 SET call_minutes_count = call_minutes_count + $2
                 WHERE user_id = $1"
            }
            QuotaAction::Storage => {
                "UPDATE user_usage
                 SET storage_used_bytes = storage_used_bytes + $2
                 WHERE user_id = $1"
            }
        };

        let update = sqlx::query(sql).bind(user_id).bind(amount).execute(&self.pool);

        let result = tokio::time::timeout(self.timeout, update)
            .await
            .map_err(|_| StoreError::Timeout)??;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotProvisioned(user_id));
        }

        Ok(())
    }
}
