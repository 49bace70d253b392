//! Property tests for the split calculations.

use proptest::prelude::*;
use rust_decimal::Decimal;
use tessera_shared::types::Rate;

use super::split::{freelance_split, reown_split, resale_price};

/// Strategy for positive token amounts with two decimal places.
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for fractional share rates in [0, 1] with four decimal places.
fn share_strategy() -> impl Strategy<Value = Rate> {
    (0i64..=10_000i64).prop_map(|n| Rate::share(Decimal::new(n, 4)).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Payout + commission + referral bonus always equals the held amount.
    #[test]
    fn prop_freelance_split_sums_to_whole(
        amount in amount_strategy(),
        commission in share_strategy(),
        referral in share_strategy(),
    ) {
        let split = freelance_split(amount, commission, referral);
        prop_assert_eq!(
            split.payout + split.commission + split.referral_bonus,
            amount
        );
    }

    /// No part of a freelance split is ever negative.
    #[test]
    fn prop_freelance_split_parts_non_negative(
        amount in amount_strategy(),
        commission in share_strategy(),
        referral in share_strategy(),
    ) {
        let split = freelance_split(amount, commission, referral);
        prop_assert!(split.payout >= Decimal::ZERO);
        prop_assert!(split.commission >= Decimal::ZERO);
        prop_assert!(split.referral_bonus >= Decimal::ZERO);
    }

    /// Owner credit + platform credit always equals the settlement total.
    #[test]
    fn prop_reown_split_sums_to_total(
        price in amount_strategy(),
        quantity in 1u32..1_000,
        cut in share_strategy(),
    ) {
        let split = reown_split(price, quantity, cut);
        prop_assert_eq!(split.owner_credit + split.platform_credit, split.total);
        prop_assert!(split.owner_credit >= Decimal::ZERO);
        prop_assert!(split.platform_credit >= Decimal::ZERO);
    }

    /// A zero markup leaves the resale price at the old price.
    #[test]
    fn prop_zero_markup_preserves_price(price in amount_strategy()) {
        prop_assert_eq!(
            resale_price(price, Rate::ZERO),
            price.round_dp(4)
        );
    }

    /// Resale prices never fall below the old price.
    #[test]
    fn prop_markup_never_decreases_price(
        price in amount_strategy(),
        markup in share_strategy(),
    ) {
        prop_assert!(resale_price(price, markup) >= price.round_dp(4));
    }
}
