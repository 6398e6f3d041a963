use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{PlanTier, ProvisionedUser, User};

pub struct UsersService;

impl UsersService {
    /// Provisions a metered user: identity row, zeroed usage counters, and a
    /// Free active subscription. All-or-nothing; a half-provisioned user
    /// would surface later as a NotProvisioned integrity error.
    pub async fn provision(pool: &PgPool, user_id: Option<Uuid>) -> AppResult<ProvisionedUser> {
        let user_id = user_id.unwrap_or_else(Uuid::new_v4);
        let meter_key = Uuid::new_v4();

        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, meter_key)
            VALUES ($1, $2)
            RETURNING id, meter_key, created_at
            "#,
        )
        .bind(user_id)
        .bind(meter_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(into_provision_error)?;

        sqlx::query("INSERT INTO user_usage (user_id) VALUES ($1)")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(into_provision_error)?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, tier, status, current_period_end)
            VALUES ($1, 'Free', 'active', NOW() + INTERVAL '30 days')
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(into_provision_error)?;

        tx.commit().await?;

        Ok(ProvisionedUser {
            user_id: user.id,
            meter_key: user.meter_key,
            tier: PlanTier::Free,
            created_at: user.created_at,
        })
    }

    /// Gets a user by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, meter_key, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        Ok(user)
    }

    /// Resolves a meter key to its user (for user-plane authentication)
    pub async fn get_by_meter_key(pool: &PgPool, meter_key: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, meter_key, created_at FROM users WHERE meter_key = $1",
        )
        .bind(meter_key)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}

fn into_provision_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict("User is already provisioned".to_string());
        }
    }
    AppError::Database(e)
}
