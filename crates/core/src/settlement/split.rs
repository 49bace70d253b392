//! Commission and markup split calculations.
//!
//! Pure functions with no dependencies on storage. All rounding uses
//! Banker's Rounding (`MidpointNearestEven`) at 4 decimal places; the larger
//! part of every split is computed as an exact residual so the parts always
//! sum back to the whole.

use rust_decimal::{Decimal, RoundingStrategy};
use tessera_shared::types::Rate;

/// Decimal places token amounts are settled at.
const TOKEN_SCALE: u32 = 4;

/// Rounds a token amount using Banker's Rounding.
#[must_use]
pub fn round_tokens(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(TOKEN_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Result of splitting a released escrow amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreelanceSplit {
    /// Amount credited to the payee (worker/business).
    pub payout: Decimal,
    /// Amount credited to the platform.
    pub commission: Decimal,
    /// Amount credited to the referrer; zero when there is none.
    pub referral_bonus: Decimal,
}

/// Result of splitting a re-ownership settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReownSplit {
    /// Total amount debited from the new owner.
    pub total: Decimal,
    /// Amount credited to the old owner.
    pub owner_credit: Decimal,
    /// Amount credited to the platform; zero with the default cut.
    pub platform_credit: Decimal,
}

/// Splits a held escrow amount into payout, commission, and referral bonus.
///
/// `commission = round(held * commission_rate)`; the referral bonus is carved
/// out of the commission; `payout = held - commission - bonus` exactly, so
/// the three parts always sum to the held amount.
#[must_use]
pub fn freelance_split(amount: Decimal, commission_rate: Rate, referral_rate: Rate) -> FreelanceSplit {
    let gross_commission = round_tokens(commission_rate.of(amount));
    let referral_bonus = round_tokens(referral_rate.of(gross_commission));
    let commission = gross_commission - referral_bonus;
    let payout = amount - gross_commission;

    FreelanceSplit {
        payout,
        commission,
        referral_bonus,
    }
}

/// Computes the resale unit price: `old_price * (1 + markup)`.
#[must_use]
pub fn resale_price(old_price: Decimal, markup_rate: Rate) -> Decimal {
    round_tokens(old_price + markup_rate.of(old_price))
}

/// Splits a committed re-ownership settlement between old owner and platform.
#[must_use]
pub fn reown_split(new_price: Decimal, quantity: u32, platform_cut: Rate) -> ReownSplit {
    let total = round_tokens(new_price * Decimal::from(quantity));
    let platform_credit = round_tokens(platform_cut.of(total));
    let owner_credit = total - platform_credit;

    ReownSplit {
        total,
        owner_credit,
        platform_credit,
    }
}
