use crate::models::PlanTier;

/// Sentinel for unlimited resources. A real maximum rather than a flag so
/// arithmetic comparisons stay uniform across tiers.
pub const UNLIMITED: i64 = i64::MAX;

const MIB: i64 = 1024 * 1024;

/// Per-tier resource ceilings for one billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    /// Max translatable characters
    pub translation_chars: i64,
    /// Max call minutes
    pub call_minutes: i64,
    /// Max cumulative stored bytes
    pub storage_bytes: i64,
}

/// Static catalog lookup. Every tier has an entry; there is no failure mode.
pub fn limits_for(tier: PlanTier) -> PlanLimits {
    match tier {
        PlanTier::Free => PlanLimits {
            translation_chars: 2_000_000,
            call_minutes: 100,
            storage_bytes: 500 * MIB,
        },
        PlanTier::Premium => PlanLimits {
            translation_chars: 5_000_000,
            call_minutes: 5_000,
            storage_bytes: 5_000 * MIB,
        },
        PlanTier::Pro => PlanLimits {
            translation_chars: UNLIMITED,
            call_minutes: UNLIMITED,
            storage_bytes: 20_000 * MIB,
        },
        PlanTier::Business => PlanLimits {
            translation_chars: UNLIMITED,
            call_minutes: UNLIMITED,
            storage_bytes: 100_000 * MIB,
        },
    }
}
