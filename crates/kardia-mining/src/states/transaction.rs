use crate::error::ErrorCode;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 32-byte transaction hash.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl FromStr for TxHash {
    type Err = ErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|_| ErrorCode::MalformedResponse(format!("bad tx hash {}", s)))?;
        let raw: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ErrorCode::MalformedResponse(format!("bad tx hash {}", s)))?;
        Ok(TxHash(raw))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// What a submitted transaction does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Approve,
    AcquirePower,
    Stake,
    Unstake,
    ClaimReward,
    Swap,
}

impl TxKind {
    /// Status line shown while the main transaction is being submitted.
    pub fn progress_label(&self) -> &'static str {
        match self {
            TxKind::Approve => "AUTHORIZING...",
            TxKind::AcquirePower => "DEPOSITING...",
            TxKind::Stake => "STAKING...",
            TxKind::Unstake => "INITIATING...",
            TxKind::ClaimReward => "SYNCHRONIZING...",
            TxKind::Swap => "SWAPPING...",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxKind::Approve => "approve",
            TxKind::AcquirePower => "acquire power",
            TxKind::Stake => "stake",
            TxKind::Unstake => "unstake",
            TxKind::ClaimReward => "claim reward",
            TxKind::Swap => "swap",
        };
        f.write_str(name)
    }
}

/// A broadcast transaction awaiting its receipt. Lives only in view state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PendingTransaction {
    pub hash: TxHash,
    pub kind: TxKind,
    pub submitted_at: u64,
}

/// Receipt status reported by the chain client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReceiptStatus {
    Pending,
    Success,
    Reverted(Option<String>),
}
