//! Unit tests for the plan catalog

use rstest::rstest;

use quotrak::models::PlanTier;
use quotrak::plans::{limits_for, UNLIMITED};

#[rstest]
#[case(PlanTier::Free, 2_000_000, 100, 524_288_000)]
#[case(PlanTier::Premium, 5_000_000, 5_000, 5_242_880_000)]
#[case(PlanTier::Pro, UNLIMITED, UNLIMITED, 20_971_520_000)]
#[case(PlanTier::Business, UNLIMITED, UNLIMITED, 104_857_600_000)]
fn test_catalog_matches_published_limits(
    #[case] tier: PlanTier,
    #[case] translation_chars: i64,
    #[case] call_minutes: i64,
    #[case] storage_bytes: i64,
) {
    let limits = limits_for(tier);
    assert_eq!(limits.translation_chars, translation_chars);
    assert_eq!(limits.call_minutes, call_minutes);
    assert_eq!(limits.storage_bytes, storage_bytes);
}

#[rstest]
#[case(PlanTier::Free)]
#[case(PlanTier::Premium)]
#[case(PlanTier::Pro)]
#[case(PlanTier::Business)]
fn test_limits_are_non_negative(#[case] tier: PlanTier) {
    let limits = limits_for(tier);
    assert!(limits.translation_chars >= 0);
    assert!(limits.call_minutes >= 0);
    assert!(limits.storage_bytes >= 0);
}
