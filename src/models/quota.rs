use serde::{Deserialize, Serialize};

use crate::models::UserUsage;
use crate::plans::PlanLimits;

/// Category of resource consumption being checked or recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaAction {
    Translation,
    Call,
    Storage,
}

impl QuotaAction {
    /// Selects the (current counter, tier limit) pair this action consumes
    pub fn select(self, usage: &UserUsage, limits: &PlanLimits) -> (i64, i64) {
        match self {
            QuotaAction::Translation => (usage.translation_chars_count, limits.translation_chars),
            QuotaAction::Call => (usage.call_minutes_count, limits.call_minutes),
            QuotaAction::Storage => (usage.storage_used_bytes, limits.storage_bytes),
        }
    }
}

impl std::fmt::Display for QuotaAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QuotaAction::Translation => "TRANSLATION",
            QuotaAction::Call => "CALL",
            QuotaAction::Storage => "STORAGE",
        };
        write!(f, "{name}")
    }
}

/// Admission decision for a single request. Constructed fresh per check,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub allowed: bool,
    /// Limit minus projected usage, floored at zero
    pub remaining: i64,
    /// Projected usage over limit, one decimal place; 0 for unlimited tiers
    pub usage_percent: f64,
    /// Projected usage at or above 80% of the limit
    pub is_warning_zone: bool,
}
