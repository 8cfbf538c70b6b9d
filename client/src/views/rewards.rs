//! Reward View and Lock View: the user's position, pending reward and stake
//! lock, re-read every few seconds.

use super::{poll_view, LiveView};
use crate::chain::{ChainReader, Clock};
use crate::instructions::controller_instructions::{
    acc_reward_per_pu_instr, reward_debt_instr, staked_kdia_instr, unlock_time_instr,
    user_pu_instr,
};
use crate::instructions::utils::{read_timestamp, read_uint};
use crate::poller::{Poller, RefreshHandle};
use kardia_mining::amount::u256_string;
use kardia_mining::states::{LockState, RewardAccumulator, UserPosition};
use kardia_mining::{
    format_units, Address, ErrorCode, Result, U256, REWARD_POLL_INTERVAL_SECS, TOKEN_DECIMALS,
};
use serde::Serialize;
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Decimals shown for pending rewards.
const REWARD_PRECISION: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RewardSnapshot {
    pub position: UserPosition,
    pub accumulator: RewardAccumulator,
    #[serde(with = "u256_string")]
    pub pending: U256,
    pub lock: LockState,
}

impl RewardSnapshot {
    pub fn new(position: UserPosition, accumulator: RewardAccumulator, now: u64) -> Result<Self> {
        let pending = position
            .pending_reward(accumulator)
            .ok_or(ErrorCode::Overflow)?;
        Ok(RewardSnapshot {
            lock: position.lock_state(now),
            position,
            accumulator,
            pending,
        })
    }

    pub fn pending_label(&self) -> String {
        format_units(self.pending, TOKEN_DECIMALS, REWARD_PRECISION)
    }

    /// Vault status line; a user with nothing staked is invited to stake.
    pub fn stake_status_label(&self) -> String {
        if self.position.has_active_stake() {
            self.lock.status_label()
        } else {
            "READY FOR STAKING".to_string()
        }
    }

    pub fn unstake_enabled(&self) -> bool {
        self.position.has_active_stake() && self.lock.can_unstake()
    }
}

pub fn fetch_position<R: ChainReader + ?Sized>(
    reader: &R,
    controller: Address,
    user: Address,
) -> Result<UserPosition> {
    Ok(UserPosition {
        power_units: read_uint(reader, &user_pu_instr(controller, user))?,
        staked: read_uint(reader, &staked_kdia_instr(controller, user))?,
        reward_debt: read_uint(reader, &reward_debt_instr(controller, user))?,
        unlock_timestamp: read_timestamp(reader, &unlock_time_instr(controller, user))?,
    })
}

pub fn fetch_accumulator<R: ChainReader + ?Sized>(
    reader: &R,
    controller: Address,
) -> Result<RewardAccumulator> {
    read_uint(reader, &acc_reward_per_pu_instr(controller)).map(RewardAccumulator)
}

pub fn fetch_rewards<R: ChainReader + ?Sized>(
    reader: &R,
    controller: Address,
    user: Address,
    now: u64,
) -> Result<RewardSnapshot> {
    let position = fetch_position(reader, controller, user)?;
    let accumulator = fetch_accumulator(reader, controller)?;
    RewardSnapshot::new(position, accumulator, now)
}

/// Live reward and lock state for one user.
pub struct RewardView {
    view: LiveView<RewardSnapshot>,
    poller: Poller,
}

impl RewardView {
    pub fn start<C>(
        chain: Arc<C>,
        clock: Arc<dyn Clock>,
        controller: Address,
        user: Address,
    ) -> io::Result<Self>
    where
        C: ChainReader + 'static,
    {
        let (view, poller) = poll_view(
            "reward-view",
            Duration::from_secs(REWARD_POLL_INTERVAL_SECS),
            move || fetch_rewards(chain.as_ref(), controller, user, clock.now()),
        )?;
        Ok(RewardView { view, poller })
    }

    pub fn view(&self) -> &LiveView<RewardSnapshot> {
        &self.view
    }

    pub fn refresh_handle(&self) -> RefreshHandle {
        self.poller.refresh_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{addr, tokens, FixedClock, MockChain};
    use crate::views::ViewState;
    use std::time::Instant;

    const NOW: u64 = 1_700_000_000;

    fn controller() -> Address {
        addr(0xC0)
    }

    fn user() -> Address {
        addr(0x0E)
    }

    fn seed(chain: &MockChain, pu: U256, staked: U256, debt: U256, unlock: u64, acc: U256) {
        chain.set_uint(user_pu_instr(controller(), user()), pu);
        chain.set_uint(staked_kdia_instr(controller(), user()), staked);
        chain.set_uint(reward_debt_instr(controller(), user()), debt);
        chain.set_uint(unlock_time_instr(controller(), user()), U256::from(unlock));
        chain.set_uint(acc_reward_per_pu_instr(controller()), acc);
    }

    #[test]
    fn pending_reward_is_exact() {
        let chain = MockChain::default();
        seed(&chain, tokens(2), tokens(1), tokens(1), NOW - 10, tokens(3));
        let snapshot = fetch_rewards(&chain, controller(), user(), NOW).unwrap();
        assert_eq!(snapshot.pending, tokens(5));
        assert_eq!(snapshot.pending_label(), "5.00000000");
    }

    #[test]
    fn debt_above_accrual_shows_zero() {
        let chain = MockChain::default();
        seed(&chain, tokens(1), tokens(1), tokens(9), NOW - 10, tokens(3));
        let snapshot = fetch_rewards(&chain, controller(), user(), NOW).unwrap();
        assert_eq!(snapshot.pending, U256::zero());
        assert_eq!(snapshot.pending_label(), "0.00000000");
    }

    #[test]
    fn locked_stake_shows_countdown_and_blocks_unstake() {
        let chain = MockChain::default();
        seed(&chain, tokens(1), tokens(10), U256::zero(), NOW + 172_800, tokens(1));
        let snapshot = fetch_rewards(&chain, controller(), user(), NOW).unwrap();
        assert_eq!(snapshot.stake_status_label(), "LOCKED 2D:0H:0M");
        assert!(!snapshot.unstake_enabled());
    }

    #[test]
    fn expired_lock_is_ready() {
        let chain = MockChain::default();
        seed(&chain, tokens(1), tokens(10), U256::zero(), NOW - 1, tokens(1));
        let snapshot = fetch_rewards(&chain, controller(), user(), NOW).unwrap();
        assert_eq!(snapshot.stake_status_label(), "UNLOCKED & READY");
        assert!(snapshot.unstake_enabled());
    }

    #[test]
    fn empty_stake_invites_staking() {
        let chain = MockChain::default();
        seed(&chain, tokens(1), U256::zero(), U256::zero(), 0, tokens(1));
        let snapshot = fetch_rewards(&chain, controller(), user(), NOW).unwrap();
        assert_eq!(snapshot.stake_status_label(), "READY FOR STAKING");
        assert!(!snapshot.unstake_enabled());
    }

    #[test]
    fn any_failed_read_fails_the_snapshot() {
        let chain = MockChain::default();
        seed(&chain, tokens(1), tokens(1), U256::zero(), NOW, tokens(1));
        chain.fail_read(
            acc_reward_per_pu_instr(controller()),
            ErrorCode::ReadFailure("node down".into()),
        );
        assert!(fetch_rewards(&chain, controller(), user(), NOW).is_err());
    }

    #[test]
    fn live_view_follows_the_chain() {
        let chain = Arc::new(MockChain::default());
        seed(&chain, tokens(1), tokens(1), U256::zero(), NOW - 1, tokens(1));
        let reward_view =
            RewardView::start(chain.clone(), Arc::new(FixedClock::at(NOW)), controller(), user())
                .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while reward_view.view().get() == ViewState::Loading {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(reward_view.view().get().ready().unwrap().pending, tokens(1));

        chain.set_uint(acc_reward_per_pu_instr(controller()), tokens(4));
        reward_view.refresh_handle().refresh();
        while reward_view.view().get().ready().map(|s| s.pending) != Some(tokens(4)) {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
