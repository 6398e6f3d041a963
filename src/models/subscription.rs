use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription plan determining resource limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_tier")]
pub enum PlanTier {
    Free,
    Premium,
    Pro,
    Business,
}

/// Subscription lifecycle state. Only `active` rows are honored by the
/// quota engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sub_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Unpaid,
}

/// Subscription model for reading from the database
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tier: PlanTier,
    pub status: SubStatus,
    pub current_period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// DTO for setting a user's subscription
#[derive(Debug, Deserialize)]
pub struct SetSubscription {
    pub tier: PlanTier,
    #[serde(default)]
    pub status: Option<SubStatus>,
}
