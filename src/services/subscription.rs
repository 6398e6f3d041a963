use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{SetSubscription, SubStatus, Subscription};

pub struct SubscriptionService;

impl SubscriptionService {
    /// Gets the user's subscription row
    pub async fn get(pool: &PgPool, user_id: Uuid) -> AppResult<Subscription> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, user_id, tier, status, current_period_end, created_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No subscription for user {}", user_id)))?;

        Ok(subscription)
    }

    /// Sets the user's tier and status, starting a fresh 30-day period
    pub async fn set(
        pool: &PgPool,
        user_id: Uuid,
        input: SetSubscription,
    ) -> AppResult<Subscription> {
        let status = input.status.unwrap_or(SubStatus::Active);

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, tier, status, current_period_end)
            VALUES ($1, $2, $3, NOW() + INTERVAL '30 days')
            ON CONFLICT (user_id) DO UPDATE SET
                tier = EXCLUDED.tier,
                status = EXCLUDED.status,
                current_period_end = EXCLUDED.current_period_end
            RETURNING id, user_id, tier, status, current_period_end, created_at
            "#,
        )
        .bind(user_id)
        .bind(input.tier)
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok(subscription)
    }
}
