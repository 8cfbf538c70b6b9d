//! Calls against the mining controller.
//!
//! Reads: position (`userPU`, `stakedKDIA`, `unlockTime`, `rewardDebt`),
//! the global index (`accRewardPerPU`), emission (`dripRatePerSecond`),
//! pool sizes and the oracle price. Writes: `depositPush`, `stake`,
//! `unstakeKDIA`, `claimMinerRewards`.

use super::abi::Token;
use crate::chain::ContractCall;
use kardia_mining::{Address, U256};

pub const USER_PU: &str = "userPU(address)";
pub const STAKED_KDIA: &str = "stakedKDIA(address)";
pub const UNLOCK_TIME: &str = "unlockTime(address)";
pub const ACC_REWARD_PER_PU: &str = "accRewardPerPU()";
pub const REWARD_DEBT: &str = "rewardDebt(address)";
pub const DRIP_RATE_PER_SECOND: &str = "dripRatePerSecond()";
pub const MINERS_POOL: &str = "minersPool()";
pub const REWARD_POOL: &str = "rewardPool()";
pub const TOTAL_PU: &str = "totalPU()";
pub const KDIA_PRICE_IN_USDT: &str = "_getKdiaPriceInUsdt()";
pub const DEPOSIT_PUSH: &str = "depositPush(uint256)";
pub const STAKE: &str = "stake(uint256)";
pub const UNSTAKE_KDIA: &str = "unstakeKDIA(uint256)";
pub const CLAIM_MINER_REWARDS: &str = "claimMinerRewards()";

fn user_read(controller: Address, signature: &'static str, user: Address) -> ContractCall {
    ContractCall::new(controller, signature, vec![Token::Address(user)])
}

fn no_arg_call(controller: Address, signature: &'static str) -> ContractCall {
    ContractCall::new(controller, signature, Vec::new())
}

pub fn user_pu_instr(controller: Address, user: Address) -> ContractCall {
    user_read(controller, USER_PU, user)
}

pub fn staked_kdia_instr(controller: Address, user: Address) -> ContractCall {
    user_read(controller, STAKED_KDIA, user)
}

pub fn unlock_time_instr(controller: Address, user: Address) -> ContractCall {
    user_read(controller, UNLOCK_TIME, user)
}

pub fn reward_debt_instr(controller: Address, user: Address) -> ContractCall {
    user_read(controller, REWARD_DEBT, user)
}

pub fn acc_reward_per_pu_instr(controller: Address) -> ContractCall {
    no_arg_call(controller, ACC_REWARD_PER_PU)
}

pub fn drip_rate_instr(controller: Address) -> ContractCall {
    no_arg_call(controller, DRIP_RATE_PER_SECOND)
}

pub fn miners_pool_instr(controller: Address) -> ContractCall {
    no_arg_call(controller, MINERS_POOL)
}

pub fn reward_pool_instr(controller: Address) -> ContractCall {
    no_arg_call(controller, REWARD_POOL)
}

pub fn total_pu_instr(controller: Address) -> ContractCall {
    no_arg_call(controller, TOTAL_PU)
}

pub fn kdia_price_instr(controller: Address) -> ContractCall {
    no_arg_call(controller, KDIA_PRICE_IN_USDT)
}

pub fn deposit_push_instr(controller: Address, amount: U256) -> ContractCall {
    ContractCall::new(controller, DEPOSIT_PUSH, vec![Token::Uint(amount)])
}

pub fn stake_instr(controller: Address, amount: U256) -> ContractCall {
    ContractCall::new(controller, STAKE, vec![Token::Uint(amount)])
}

pub fn unstake_instr(controller: Address, amount: U256) -> ContractCall {
    ContractCall::new(controller, UNSTAKE_KDIA, vec![Token::Uint(amount)])
}

pub fn claim_instr(controller: Address) -> ContractCall {
    no_arg_call(controller, CLAIM_MINER_REWARDS)
}
