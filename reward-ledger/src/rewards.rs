//! Pure reward arithmetic.
//!
//! Everything here is integer math over cents with round-half-up to the
//! nearest cent. Nothing reads the clock.

use crate::types::Cents;

/// Staked points per full 1.0x of earning multiplier.
pub const POINTS_PER_MULTIPLIER: u64 = 1000;

/// Earning multiplier for display: `1 + staked / 1000`.
pub fn earning_multiplier(staked_points: u64) -> f64 {
    1.0 + staked_points as f64 / POINTS_PER_MULTIPLIER as f64
}

/// Cash reward scaled by the staking multiplier.
///
/// Returns `None` if the result does not fit in a `u64` cent count.
pub fn scaled_reward(reward_cash: Cents, staked_points: u64) -> Option<Cents> {
    let factor = POINTS_PER_MULTIPLIER as u128 + staked_points as u128;
    let numerator = (reward_cash.as_cents() as u128).checked_mul(factor)?;
    to_cents(round_half_up_div(numerator, POINTS_PER_MULTIPLIER as u128)?)
}

/// Referral bonus: `earned * percentage / 100`.
pub fn referral_bonus(earned: Cents, percentage: u32) -> Option<Cents> {
    let numerator = (earned.as_cents() as u128).checked_mul(percentage as u128)?;
    to_cents(round_half_up_div(numerator, 100)?)
}

fn round_half_up_div(numerator: u128, denominator: u128) -> Option<u128> {
    numerator.checked_add(denominator / 2).map(|n| n / denominator)
}

fn to_cents(value: u128) -> Option<Cents> {
    u64::try_from(value).ok().map(Cents::new)
}
