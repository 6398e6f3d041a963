use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Call, CallStatus};

pub struct CallService;

impl CallService {
    /// Creates the audit row for a starting call session
    pub async fn create(pool: &PgPool, id: Uuid, user_id: Uuid) -> AppResult<Call> {
        let call = sqlx::query_as::<_, Call>(
            r#"
            INSERT INTO calls (id, user_id, status, started_at)
            VALUES ($1, $2, 'active', $3)
            RETURNING id, user_id, status, started_at, ended_at, minutes_charged
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(call)
    }

    /// Gets a call by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> AppResult<Call> {
        let call = sqlx::query_as::<_, Call>(
            r#"
            SELECT id, user_id, status, started_at, ended_at, minutes_charged
            FROM calls
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Call {} not found", id)))?;

        Ok(call)
    }

    /// Records the final state of a finished session
    pub async fn finish(
        pool: &PgPool,
        id: Uuid,
        status: CallStatus,
        minutes_charged: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE calls
            SET status = $2, ended_at = $3, minutes_charged = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .bind(minutes_charged)
        .execute(pool)
        .await?;

        Ok(())
    }
}
