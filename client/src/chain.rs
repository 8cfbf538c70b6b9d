//! Seams to the external chain collaborators.
//!
//! Wallet, read client and write client are consumed through these traits.
//! The JSON-RPC adapter in `instructions::rpc` implements all of them against
//! a wallet-backed node; tests implement them in memory.

use crate::instructions::abi::{encode_call, Token};
use kardia_mining::states::{ReceiptStatus, TxHash};
use kardia_mining::{Address, ErrorCode, Result};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// A contract function invocation: target, canonical signature, arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContractCall {
    pub to: Address,
    pub signature: &'static str,
    pub args: Vec<Token>,
}

impl ContractCall {
    pub fn new(to: Address, signature: &'static str, args: Vec<Token>) -> Self {
        ContractCall {
            to,
            signature,
            args,
        }
    }

    pub fn calldata(&self) -> Vec<u8> {
        encode_call(self.signature, &self.args)
    }
}

/// Read-only contract calls.
pub trait ChainReader: Send + Sync {
    /// Raw ABI-encoded return data of `call` at the latest block.
    fn call(&self, call: &ContractCall) -> Result<Vec<u8>>;
}

/// Transaction submission and receipt lookup.
pub trait ChainWriter: Send + Sync {
    /// Ask the wallet to sign and broadcast `call` from `from`.
    fn send_transaction(&self, from: Address, call: &ContractCall) -> Result<TxHash>;

    fn receipt(&self, hash: &TxHash) -> Result<ReceiptStatus>;
}

/// The connected wallet.
pub trait Wallet: Send + Sync {
    fn account(&self) -> Result<Address>;
}

/// Source of unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default()
    }
}

/// Block until `hash` has a receipt. Reverts become `TransactionReverted`.
///
/// There is no deadline here; a transaction the chain never includes keeps
/// the caller waiting the same way the wallet would.
pub fn wait_for_receipt<W: ChainWriter + ?Sized>(
    writer: &W,
    hash: &TxHash,
    poll_interval: Duration,
) -> Result<()> {
    loop {
        match writer.receipt(hash)? {
            ReceiptStatus::Success => return Ok(()),
            ReceiptStatus::Reverted(reason) => return Err(ErrorCode::TransactionReverted(reason)),
            ReceiptStatus::Pending => {
                debug!(%hash, "receipt pending");
                thread::sleep(poll_interval);
            }
        }
    }
}
