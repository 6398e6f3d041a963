mod postgres;

pub use postgres::PgUsageStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{PlanTier, QuotaAction, UserUsage};

/// Usage store failures. Both variants must be treated as fail-closed at the
/// billing boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} has no usage row")]
    NotProvisioned(Uuid),

    #[error("usage store call timed out")]
    Timeout,

    #[error("usage store error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotProvisioned(user_id) => AppError::NotProvisioned(user_id),
            StoreError::Timeout => AppError::StoreUnavailable("store call timed out".to_string()),
            StoreError::Database(e) => AppError::StoreUnavailable(e.to_string()),
        }
    }
}

/// The only component permitted to read or mutate `user_usage` rows.
///
/// Object-safe so the engine can be constructed over an in-memory substitute
/// in tests.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Loads the user's counters and effective tier. A user without an
    /// active subscription row is on the Free tier; a user without a usage
    /// row is not provisioned.
    async fn fetch_usage_and_tier(
        &self,
        user_id: Uuid,
    ) -> Result<(UserUsage, PlanTier), StoreError>;

    /// Adds `amount` to the action's counter as a single read-modify-write
    /// evaluated by the store itself. Concurrent increments compose
    /// additively with no lost updates.
    async fn increment_counter(
        &self,
        user_id: Uuid,
        action: QuotaAction,
        amount: i64,
    ) -> Result<(), StoreError>;
}
