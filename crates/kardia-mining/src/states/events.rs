use crate::address::Address;
use crate::amount::{u256_string, U256};
use crate::states::{TxHash, TxKind};
use serde::Serialize;

//
// ──────────────────────────────────────────────────────────────────────────────
// Events: emitted by the transaction sequencer for views and the CLI
// ──────────────────────────────────────────────────────────────────────────────
//

/// Progress of one sequenced action.
///
/// Views subscribe to these to invalidate cached reads once a transaction
/// that changes balances or positions is confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SequencerEvent {
    /// An approval was broadcast ahead of the action's main transaction.
    ApprovalSubmitted {
        kind: TxKind,
        /// Token whose allowance is being raised.
        token: Address,
        /// Contract being authorized to spend.
        spender: Address,
        #[serde(with = "u256_string")]
        amount: U256,
        hash: TxHash,
    },
    /// The approval receipt came back successful.
    ApprovalConfirmed { kind: TxKind, hash: TxHash },
    /// The action's main transaction was broadcast.
    Submitted { kind: TxKind, hash: TxHash },
    /// The main transaction succeeded; dependent reads are stale.
    Confirmed { kind: TxKind, hash: TxHash },
    /// The action ended without a confirmed main transaction.
    Failed {
        kind: TxKind,
        /// Human-readable reason, absent for wallet rejections.
        reason: Option<String>,
    },
}

impl SequencerEvent {
    /// True when cached balances and positions should be re-fetched.
    pub fn invalidates_views(&self) -> bool {
        matches!(self, SequencerEvent::Confirmed { .. })
    }
}
