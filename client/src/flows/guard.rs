//! Approval Guard: make sure a spender may move `required` tokens before a
//! dependent transaction is sent.
//!
//! At most one approval per `(token, owner, spender)` is in flight. A caller
//! arriving while one is pending waits for that transaction's outcome and
//! then re-checks the allowance instead of submitting a duplicate.

use crate::chain::{wait_for_receipt, ChainReader, ChainWriter};
use crate::instructions::token_instructions::{allowance_instr, approve_instr};
use crate::instructions::utils::read_uint;
use kardia_mining::states::TxHash;
use kardia_mining::{Address, ErrorCode, Result, U256};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AllowanceKey {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllowanceOutcome {
    /// The existing allowance already covered the spend.
    Sufficient,
    /// This call submitted an approval and it was confirmed.
    Approved(TxHash),
}

#[derive(Default)]
struct InFlight {
    outcome: Mutex<Option<Result<AllowanceOutcome>>>,
    done: Condvar,
}

impl InFlight {
    fn finish(&self, outcome: Result<AllowanceOutcome>) {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(outcome);
        self.done.notify_all();
    }

    fn wait(&self) -> Result<AllowanceOutcome> {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = self.done.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// `InsufficientAllowance` when `allowance` cannot cover `required`.
pub fn check_allowance(allowance: U256, required: U256) -> Result<()> {
    if allowance < required {
        return Err(ErrorCode::InsufficientAllowance);
    }
    Ok(())
}

pub struct ApprovalGuard<C> {
    chain: Arc<C>,
    receipt_poll: Duration,
    in_flight: Mutex<HashMap<AllowanceKey, Arc<InFlight>>>,
}

impl<C: ChainReader + ChainWriter> ApprovalGuard<C> {
    pub fn new(chain: Arc<C>, receipt_poll: Duration) -> Self {
        ApprovalGuard {
            chain,
            receipt_poll,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn ensure_allowance(&self, key: AllowanceKey, required: U256) -> Result<AllowanceOutcome> {
        self.ensure_allowance_with(key, required, |_| {})
    }

    /// As `ensure_allowance`; `on_submitted` sees the approval hash as soon as
    /// it is broadcast, before the receipt arrives.
    pub fn ensure_allowance_with<F>(
        &self,
        key: AllowanceKey,
        required: U256,
        on_submitted: F,
    ) -> Result<AllowanceOutcome>
    where
        F: Fn(TxHash),
    {
        loop {
            let (slot, leader) = {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                match in_flight.get(&key) {
                    Some(slot) => (slot.clone(), false),
                    None => {
                        let slot = Arc::new(InFlight::default());
                        in_flight.insert(key, slot.clone());
                        (slot, true)
                    }
                }
            };

            if !leader {
                debug!(token = %key.token, spender = %key.spender, "approval in flight, waiting on it");
                slot.wait()?;
                continue;
            }

            let outcome = self.approve_if_needed(key, required, &on_submitted);
            // Release the key before waking followers so they re-check instead of re-waiting.
            self.in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            slot.finish(outcome.clone());
            return outcome;
        }
    }

    fn approve_if_needed<F>(
        &self,
        key: AllowanceKey,
        required: U256,
        on_submitted: &F,
    ) -> Result<AllowanceOutcome>
    where
        F: Fn(TxHash),
    {
        let allowance = read_uint(
            self.chain.as_ref(),
            &allowance_instr(key.token, key.owner, key.spender),
        )?;
        let shortfall = match check_allowance(allowance, required) {
            Ok(()) => {
                debug!(token = %key.token, spender = %key.spender, %allowance, "allowance sufficient");
                return Ok(AllowanceOutcome::Sufficient);
            }
            Err(err) => err,
        };

        info!(
            token = %key.token,
            spender = %key.spender,
            %allowance,
            %required,
            reason = %shortfall,
            "requesting approval"
        );
        let hash = self.chain.send_transaction(
            key.owner,
            &approve_instr(key.token, key.spender, required),
        )?;
        on_submitted(hash);
        wait_for_receipt(self.chain.as_ref(), &hash, self.receipt_poll)?;
        info!(token = %key.token, spender = %key.spender, %hash, "approval confirmed");
        Ok(AllowanceOutcome::Approved(hash))
    }
}
