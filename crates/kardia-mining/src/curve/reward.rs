//! Reward accrual against the accumulator-per-share index.
//!
//! The controller keeps one global index, `accRewardPerPU`, scaled by 1e18,
//! and a per-user `rewardDebt` snapshot taken whenever the user's position
//! is settled. A user's pending reward is the part of
//! `power_units * index / SCALE` that has not been settled yet:
//!
//! ```text
//! pending = floor(power_units * acc_reward_per_pu / 1e18) - reward_debt
//! ```
//!
//! The division truncates, matching the contract's integer arithmetic.

use crate::{amount::U256, scale, SECONDS_PER_DAY};

/// Stateless reward math shared by every view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewardCalculator;

impl RewardCalculator {
    /// Gross rewards attributable to `power_units` at the given index, before debt.
    ///
    /// Returns `None` only when the product does not fit in 256 bits.
    pub fn accrued(power_units: U256, acc_reward_per_pu: U256) -> Option<U256> {
        power_units
            .checked_mul(acc_reward_per_pu)?
            .checked_div(scale())
    }

    /// Pending (claimable) rewards.
    ///
    /// A debt above the accrued amount happens when the index and the debt are
    /// read across a settlement; the result is clamped at zero.
    pub fn pending_reward(
        power_units: U256,
        acc_reward_per_pu: U256,
        reward_debt: U256,
    ) -> Option<U256> {
        let accrued = Self::accrued(power_units, acc_reward_per_pu)?;
        Some(accrued.saturating_sub(reward_debt))
    }

    /// Emission over one day for a per-second drip rate.
    pub fn drip_per_day(drip_rate_per_second: U256) -> U256 {
        drip_rate_per_second.saturating_mul(U256::from(SECONDS_PER_DAY))
    }
}
