use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Bearer credential for trusted backend callers
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceToken {
    pub id: i32,
    pub token: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// DTO for creating a new service token
#[derive(Debug, Deserialize)]
pub struct CreateServiceToken {
    #[serde(default)]
    pub description: Option<String>,
}
