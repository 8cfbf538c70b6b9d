//! Transaction Sequencer: approve-then-act for every write the client makes.
//!
//! Each action kind runs as its own small state machine,
//! `Idle -> AwaitingApproval -> Submitted -> Confirmed | Failed -> Idle`.
//! Progress is published as `SequencerEvent`s; a `Confirmed` event is the
//! signal for views to re-fetch. Failures are reported once and never
//! retried here.

use super::guard::{AllowanceKey, AllowanceOutcome, ApprovalGuard};
use super::quoter::SwapQuoter;
use crate::chain::{wait_for_receipt, ChainReader, ChainWriter, Clock, ContractCall};
use crate::config::ClientConfig;
use crate::instructions::controller_instructions::{
    claim_instr, deposit_push_instr, stake_instr, staked_kdia_instr, unlock_time_instr,
    unstake_instr,
};
use crate::instructions::router_instructions::swap_instr;
use crate::instructions::utils::{read_timestamp, read_uint};
use kardia_mining::states::{
    LockState, PendingTransaction, Quote, SequencerEvent, TxHash, TxKind, UserPosition,
};
use kardia_mining::{Address, ErrorCode, Result, U256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// A user-initiated write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Deposit USDT for power units.
    AcquirePower(U256),
    Stake(U256),
    /// Amounts above the staked balance are clamped.
    Unstake(U256),
    ClaimReward,
    /// Swap USDT for KDIA. `quote` is the estimate shown to the user; one is
    /// fetched when absent.
    Swap { amount_in: U256, quote: Option<Quote> },
}

impl Action {
    pub fn kind(&self) -> TxKind {
        match self {
            Action::AcquirePower(_) => TxKind::AcquirePower,
            Action::Stake(_) => TxKind::Stake,
            Action::Unstake(_) => TxKind::Unstake,
            Action::ClaimReward => TxKind::ClaimReward,
            Action::Swap { .. } => TxKind::Swap,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionState {
    Idle,
    /// Preconditions and the allowance check run here.
    AwaitingApproval,
    Submitted(PendingTransaction),
    Confirmed(TxHash),
    Failed(Option<String>),
}

impl ActionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, ActionState::AwaitingApproval | ActionState::Submitted(_))
    }

    /// Busy-state caption; `None` once the action has settled.
    pub fn status_label(&self) -> Option<&'static str> {
        match self {
            ActionState::AwaitingApproval => Some(TxKind::Approve.progress_label()),
            ActionState::Submitted(_) => Some("PROCESSING..."),
            ActionState::Idle | ActionState::Confirmed(_) | ActionState::Failed(_) => None,
        }
    }
}

type Listener = Box<dyn Fn(&SequencerEvent) + Send + Sync>;

pub struct TransactionSequencer<C> {
    chain: Arc<C>,
    clock: Arc<dyn Clock>,
    config: Arc<ClientConfig>,
    guard: ApprovalGuard<C>,
    quoter: SwapQuoter<C>,
    states: Mutex<HashMap<TxKind, ActionState>>,
    listeners: Mutex<Vec<Listener>>,
}

impl<C: ChainReader + ChainWriter> TransactionSequencer<C> {
    pub fn new(chain: Arc<C>, clock: Arc<dyn Clock>, config: Arc<ClientConfig>) -> Self {
        TransactionSequencer {
            guard: ApprovalGuard::new(chain.clone(), config.receipt_poll),
            quoter: SwapQuoter::new(chain.clone(), clock.clone(), config.clone()),
            chain,
            clock,
            config,
            states: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn quoter(&self) -> &SwapQuoter<C> {
        &self.quoter
    }

    /// Register `listener` for every event. Listeners must not call back into
    /// `subscribe`.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&SequencerEvent) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    pub fn state(&self, kind: TxKind) -> ActionState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or(ActionState::Idle)
    }

    pub fn is_busy(&self, kind: TxKind) -> bool {
        self.state(kind).is_busy()
    }

    /// Run `action` for `owner` to completion and return the main
    /// transaction's hash.
    pub fn execute(&self, owner: Address, action: Action) -> Result<TxHash> {
        let kind = action.kind();
        self.begin(kind)?;
        let outcome = self.run(owner, kind, &action);
        match &outcome {
            Ok(hash) => {
                info!(%kind, %hash, "transaction confirmed");
                self.set_state(kind, ActionState::Confirmed(*hash));
                self.emit(SequencerEvent::Confirmed { kind, hash: *hash });
            }
            Err(err) => {
                let reason = err.user_message();
                warn!(%kind, error = %err, "action failed");
                self.set_state(kind, ActionState::Failed(reason.clone()));
                self.emit(SequencerEvent::Failed { kind, reason });
            }
        }
        self.set_state(kind, ActionState::Idle);
        outcome
    }

    fn begin(&self, kind: TxKind) -> Result<()> {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(kind).or_insert(ActionState::Idle);
        if state.is_busy() {
            return Err(ErrorCode::ActionInFlight(kind.to_string()));
        }
        *state = ActionState::AwaitingApproval;
        Ok(())
    }

    fn run(&self, owner: Address, kind: TxKind, action: &Action) -> Result<TxHash> {
        let controller = self.config.controller;
        match action {
            Action::AcquirePower(amount) => {
                ensure_positive(*amount)?;
                self.approve(kind, owner, self.config.usdt, controller, *amount)?;
                self.submit(owner, kind, deposit_push_instr(controller, *amount))
            }
            Action::Stake(amount) => {
                ensure_positive(*amount)?;
                self.approve(kind, owner, self.config.kdia, controller, *amount)?;
                self.submit(owner, kind, stake_instr(controller, *amount))
            }
            Action::Unstake(requested) => {
                ensure_positive(*requested)?;
                let position = self.read_stake(owner)?;
                if !position.has_active_stake() {
                    return Err(ErrorCode::NoActiveStake);
                }
                LockState::at(position.unlock_timestamp, self.clock.now()).ensure_unlocked()?;
                let amount = position.clamp_unstake(*requested);
                self.approve(kind, owner, self.config.kdia, controller, self.config.approval_threshold)?;
                self.submit(owner, kind, unstake_instr(controller, amount))
            }
            Action::ClaimReward => {
                self.approve(kind, owner, self.config.kdia, controller, self.config.approval_threshold)?;
                self.submit(owner, kind, claim_instr(controller))
            }
            Action::Swap { amount_in, quote } => self.swap(owner, kind, *amount_in, quote.as_ref()),
        }
    }

    fn swap(&self, owner: Address, kind: TxKind, amount_in: U256, shown: Option<&Quote>) -> Result<TxHash> {
        ensure_positive(amount_in)?;
        let displayed = match shown {
            Some(quote) => quote.clone(),
            None => self.quoter.quote(amount_in)?,
        };
        if displayed.amount_in != amount_in {
            return Err(ErrorCode::StaleQuote);
        }
        let token_in = displayed.route.token_in().ok_or(ErrorCode::NoRoute)?;
        self.approve(kind, owner, token_in, self.config.router, amount_in)?;

        let fresh = self.quoter.quote(amount_in)?;
        displayed.ensure_matches(&fresh)?;
        let amount_out_min = displayed.minimum_out(self.config.slippage_bps)?;
        let deadline = self.clock.now().saturating_add(self.config.swap_deadline_secs);
        info!(route = %displayed.route, %amount_in, %amount_out_min, "submitting swap");
        self.submit(
            owner,
            kind,
            swap_instr(
                self.config.router,
                amount_in,
                amount_out_min,
                displayed.route.path.clone(),
                owner,
                deadline,
            ),
        )
    }

    fn read_stake(&self, owner: Address) -> Result<UserPosition> {
        let controller = self.config.controller;
        Ok(UserPosition {
            staked: read_uint(self.chain.as_ref(), &staked_kdia_instr(controller, owner))?,
            unlock_timestamp: read_timestamp(self.chain.as_ref(), &unlock_time_instr(controller, owner))?,
            ..Default::default()
        })
    }

    fn approve(
        &self,
        kind: TxKind,
        owner: Address,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()> {
        let key = AllowanceKey {
            token,
            owner,
            spender,
        };
        let outcome = self.guard.ensure_allowance_with(key, amount, |hash| {
            self.emit(SequencerEvent::ApprovalSubmitted {
                kind,
                token,
                spender,
                amount,
                hash,
            })
        })?;
        if let AllowanceOutcome::Approved(hash) = outcome {
            self.emit(SequencerEvent::ApprovalConfirmed { kind, hash });
        }
        Ok(())
    }

    fn submit(&self, owner: Address, kind: TxKind, call: ContractCall) -> Result<TxHash> {
        info!(%kind, to = %call.to, "{}", kind.progress_label());
        let hash = self.chain.send_transaction(owner, &call)?;
        let pending = PendingTransaction {
            hash,
            kind,
            submitted_at: self.clock.now(),
        };
        self.set_state(kind, ActionState::Submitted(pending));
        self.emit(SequencerEvent::Submitted { kind, hash });
        wait_for_receipt(self.chain.as_ref(), &hash, self.config.receipt_poll)?;
        Ok(hash)
    }

    fn set_state(&self, kind: TxKind, state: ActionState) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, state);
    }

    fn emit(&self, event: SequencerEvent) {
        for listener in self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            listener(&event);
        }
    }
}

fn ensure_positive(amount: U256) -> Result<()> {
    if amount.is_zero() {
        return Err(ErrorCode::ZeroAmount);
    }
    Ok(())
}
