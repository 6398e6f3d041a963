use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle state of a metered call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "call_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// Metering loop running
    Active,
    /// Ended normally (hangup)
    Ended,
    /// Terminated by the controller on quota exhaustion
    Exhausted,
    /// Terminated because quota could not be verified
    Failed,
}

/// Audit row for a metered call session
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: CallStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub minutes_charged: i32,
}
