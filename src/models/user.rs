use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::PlanTier;

/// Metered end user. The meter key authenticates user-plane requests and is
/// returned exactly once, at provisioning time.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub meter_key: Uuid,
    pub created_at: DateTime<Utc>,
}

/// DTO for provisioning a user. The id may be supplied by the caller when
/// the identity already exists in an upstream system.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionUser {
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// Provisioning response. The only place the meter key is ever serialized.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedUser {
    pub user_id: Uuid,
    pub meter_key: Uuid,
    pub tier: PlanTier,
    pub created_at: DateTime<Utc>,
}
