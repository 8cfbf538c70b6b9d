//! Domain logic for the Kardia mining client.
//!
//! Everything in this crate is a pure function of its inputs: reward
//! accrual against the accumulator-per-share index, the stake lock state
//! machine, slippage and price math, and the value types that describe
//! pending transactions and swap quotes. Chain access lives in the client.

pub mod address;
pub mod amount;
pub mod curve;
pub mod error;
pub mod states;

pub use address::Address;
pub use amount::{format_units, parse_units, U256};
pub use error::{ErrorCode, Result};

/// Decimals shared by every token the protocol touches (USDT, KDIA, WBTC on BSC).
pub const TOKEN_DECIMALS: u32 = 18;

/// Exponent of the fixed-point scale used by `accRewardPerPU`.
pub const SCALE_DECIMALS: usize = 18;

/// Denominator for basis-point rates.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Slippage applied to swap quotes unless configured otherwise (15%).
pub const DEFAULT_SLIPPAGE_BPS: u64 = 1_500;

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_HOUR: u64 = 3_600;
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Poll interval of the reward and position reads.
pub const REWARD_POLL_INTERVAL_SECS: u64 = 5;

/// Poll interval of the emission rate read.
pub const DRIP_POLL_INTERVAL_SECS: u64 = 10;

/// Fixed-point scale of the reward accumulator (1e18).
pub fn scale() -> U256 {
    U256::exp10(SCALE_DECIMALS)
}
