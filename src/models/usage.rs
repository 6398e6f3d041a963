use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::PlanTier;

/// Per-user usage counters for the current billing period.
///
/// Counters are monotonically non-decreasing within a period: they only move
/// through the store accessor's atomic increment, or the single-statement
/// period reset.
#[derive(Debug, Clone, FromRow)]
pub struct UserUsage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub translation_chars_count: i64,
    pub call_minutes_count: i64,
    pub storage_used_bytes: i64,
    pub last_reset_date: DateTime<Utc>,
}

/// Severity of a usage metric relative to its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Normal,
    Warning,
    Exhausted,
}

/// One resource's position against its tier limit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetric {
    pub used: i64,
    pub limit: i64,
    /// Used over limit, one decimal place; 0 for unlimited tiers
    pub percentage: f64,
    pub status: UsageLevel,
    pub unit: &'static str,
}

/// Dashboard feed: all three metrics plus the worst status and the tier
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub translation: UsageMetric,
    pub calls: UsageMetric,
    pub storage: UsageMetric,
    pub overall_status: UsageLevel,
    pub tier: PlanTier,
}
