use crate::amount::{u256_string, U256};
use crate::curve::RewardCalculator;
use crate::states::LockState;
use serde::Serialize;

//
// ──────────────────────────────────────────────────────────────────────────────
// User position
// ──────────────────────────────────────────────────────────────────────────────
//

/// Global `accRewardPerPU` index, scaled by 1e18. Only the controller writes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RewardAccumulator(#[serde(with = "u256_string")] pub U256);

/// A user's mining and staking position as read from the controller.
///
/// - `power_units`: `userPU(user)`, the user's share of emissions.
/// - `staked`: `stakedKDIA(user)`.
/// - `reward_debt`: `rewardDebt(user)`, the accumulator value last settled.
/// - `unlock_timestamp`: `unlockTime(user)` in unix seconds, zero when never staked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserPosition {
    #[serde(with = "u256_string")]
    pub power_units: U256,
    #[serde(with = "u256_string")]
    pub staked: U256,
    #[serde(with = "u256_string")]
    pub reward_debt: U256,
    pub unlock_timestamp: u64,
}

impl UserPosition {
    pub fn has_active_stake(&self) -> bool {
        !self.staked.is_zero()
    }

    /// Claimable rewards at `accumulator`, never negative.
    pub fn pending_reward(&self, accumulator: RewardAccumulator) -> Option<U256> {
        RewardCalculator::pending_reward(self.power_units, accumulator.0, self.reward_debt)
    }

    pub fn lock_state(&self, now: u64) -> LockState {
        LockState::at(self.unlock_timestamp, now)
    }

    /// Requests above the staked balance are reduced to the staked balance.
    pub fn clamp_unstake(&self, requested: U256) -> U256 {
        requested.min(self.staked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale;

    #[test]
    fn pending_uses_position_fields() {
        let position = UserPosition {
            power_units: U256::from(4u64) * scale(),
            staked: U256::zero(),
            reward_debt: U256::from(3u64) * scale(),
            unlock_timestamp: 0,
        };
        let accumulator = RewardAccumulator(scale());
        assert_eq!(position.pending_reward(accumulator), Some(scale()));
        assert!(!position.has_active_stake());
    }

    #[test]
    fn unstake_request_is_clamped_to_balance() {
        let position = UserPosition {
            staked: U256::from(10u64),
            ..Default::default()
        };
        assert_eq!(position.clamp_unstake(U256::from(25u64)), U256::from(10u64));
        assert_eq!(position.clamp_unstake(U256::from(4u64)), U256::from(4u64));
    }
}
