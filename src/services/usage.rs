use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::UserUsage;

pub struct UsageService;

impl UsageService {
    /// Reads the raw usage row (admin inspection; quota decisions go
    /// through the engine)
    pub async fn get(pool: &PgPool, user_id: Uuid) -> AppResult<UserUsage> {
        let usage = sqlx::query_as::<_, UserUsage>(
            r#"
            SELECT id, user_id, translation_chars_count, call_minutes_count,
                   storage_used_bytes, last_reset_date
            FROM user_usage
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotProvisioned(user_id))?;

        Ok(usage)
    }

    /// Period rollover: zeroes all counters and stamps the reset date.
    /// A single UPDATE so concurrent atomic increments serialize against it
    /// at the store instead of interleaving into a lost update.
    pub async fn reset_period(pool: &PgPool, user_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_usage
            SET translation_chars_count = 0,
                call_minutes_count = 0,
                storage_used_bytes = 0,
                last_reset_date = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotProvisioned(user_id));
        }

        Ok(())
    }
}
