use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{QuotaAction, QuotaStatus, UsageLevel, UsageMetric, UsageSummary};
use crate::plans::{self, UNLIMITED};
use crate::store::UsageStore;

/// Usage at or above this share of the limit raises the advisory flag
const WARNING_THRESHOLD_PERCENT: f64 = 80.0;

/// Stateless policy evaluation over an injected usage store.
///
/// `check_quota` is advisory: it does not increment, and two concurrent
/// callers may both pass the same check. The atomic increment behind
/// `record_usage` is the true enforcement point; an increment that pushes
/// usage over the limit still lands, and the overage is caught by the next
/// check. Bounded burst overage is the price of not paying for distributed
/// locking on every request.
#[derive(Clone)]
pub struct QuotaEngine {
    store: Arc<dyn UsageStore>,
}

impl QuotaEngine {
    pub fn new(store: Arc<dyn UsageStore>) -> Self {
        Self { store }
    }

    /// Read-only admission decision for a request intending to consume
    /// `amount` units. Fails closed: a store error propagates, never
    /// defaults to "allowed".
    pub async fn check_quota(
        &self,
        user_id: Uuid,
        action: QuotaAction,
        amount: i64,
    ) -> AppResult<QuotaStatus> {
        if amount < 0 {
            return Err(AppError::Validation(
                "amount must not be negative".to_string(),
            ));
        }

        let (usage, tier) = self.store.fetch_usage_and_tier(user_id).await?;
        let limits = plans::limits_for(tier);
        let (current, limit) = action.select(&usage, &limits);

        Ok(evaluate_quota(current, limit, amount))
    }

    /// Books confirmed consumption against the user's counter. Call only
    /// after the resource-consuming operation actually succeeded.
    pub async fn record_usage(
        &self,
        user_id: Uuid,
        action: QuotaAction,
        amount: i64,
    ) -> AppResult<()> {
        if amount <= 0 {
            return Err(AppError::Validation("amount must be positive".to_string()));
        }

        self.store.increment_counter(user_id, action, amount).await?;
        Ok(())
    }

    /// Current position of all three metrics against the user's tier limits
    pub async fn usage_summary(&self, user_id: Uuid) -> AppResult<UsageSummary> {
        let (usage, tier) = self.store.fetch_usage_and_tier(user_id).await?;
        let limits = plans::limits_for(tier);

        let translation = metric(usage.translation_chars_count, limits.translation_chars, "Chars");
        let calls = metric(usage.call_minutes_count, limits.call_minutes, "Mins");
        let storage = metric(usage.storage_used_bytes, limits.storage_bytes, "Bytes");

        let overall_status = translation
            .status
            .max(calls.status)
            .max(storage.status);

        Ok(UsageSummary {
            translation,
            calls,
            storage,
            overall_status,
            tier,
        })
    }
}

/// Pure admission arithmetic: projects the request onto the current counter
/// and compares against the limit.
pub fn evaluate_quota(current: i64, limit: i64, amount: i64) -> QuotaStatus {
    let projected = current.saturating_add(amount);

    if limit == UNLIMITED {
        return QuotaStatus {
            allowed: true,
            remaining: limit.saturating_sub(projected),
            usage_percent: 0.0,
            is_warning_zone: false,
        };
    }

    let usage_percent = percent_of(projected, limit);

    QuotaStatus {
        allowed: projected <= limit,
        remaining: limit.saturating_sub(projected).max(0),
        usage_percent,
        is_warning_zone: usage_percent >= WARNING_THRESHOLD_PERCENT,
    }
}

fn metric(used: i64, limit: i64, unit: &'static str) -> UsageMetric {
    let percentage = percent_of(used, limit);

    let status = if limit == UNLIMITED {
        UsageLevel::Normal
    } else if percentage >= 100.0 {
        UsageLevel::Exhausted
    } else if percentage >= WARNING_THRESHOLD_PERCENT {
        UsageLevel::Warning
    } else {
        UsageLevel::Normal
    };

    UsageMetric {
        used,
        limit,
        percentage,
        status,
        unit,
    }
}

/// Share of the limit used, one decimal place. Defined as 0 for unlimited
/// limits so the ratio never goes meaningless.
fn percent_of(used: i64, limit: i64) -> f64 {
    if limit == UNLIMITED {
        return 0.0;
    }
    if limit <= 0 {
        return if used == 0 { 0.0 } else { 100.0 };
    }
    round_one_decimal(used as f64 / limit as f64 * 100.0)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
