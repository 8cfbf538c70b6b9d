use thiserror::Error;

pub type Result<T> = std::result::Result<T, ErrorCode>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    #[error("Request rejected in wallet")]
    UserRejected,

    #[error("Read failed: {0}")]
    ReadFailure(String),

    #[error("Allowance is below the requested spend")]
    InsufficientAllowance,

    #[error("Transaction reverted: {}", .0.as_deref().unwrap_or("execution failed"))]
    TransactionReverted(Option<String>),

    #[error("Swap quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("No route")]
    NoRoute,

    #[error("Quote is stale: quoted route or amount no longer matches the swap")]
    StaleQuote,

    #[error("Stake is locked for another {seconds_remaining}s")]
    StillLocked { seconds_remaining: u64 },

    #[error("No active stake")]
    NoActiveStake,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("{0} is already in progress")]
    ActionInFlight(String),

    #[error("Arithmetic overflow occurred")]
    Overflow,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ErrorCode {
    /// Short text shown to the user when an action fails.
    ///
    /// Rejections are silent: the wallet already told the user what happened.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ErrorCode::UserRejected | ErrorCode::InsufficientAllowance => None,
            ErrorCode::TransactionReverted(Some(reason)) => Some(format!("ERR: {}", reason)),
            ErrorCode::TransactionReverted(None) => Some("ERR: Action Restricted".to_string()),
            ErrorCode::QuoteUnavailable(_) | ErrorCode::NoRoute => Some("No route".to_string()),
            other => Some(format!("ERR: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_is_not_surfaced() {
        assert_eq!(ErrorCode::UserRejected.user_message(), None);
        assert_eq!(ErrorCode::InsufficientAllowance.user_message(), None);
    }

    #[test]
    fn revert_reason_falls_back_to_generic_message() {
        assert_eq!(
            ErrorCode::TransactionReverted(Some("Locked".into())).user_message(),
            Some("ERR: Locked".to_string())
        );
        assert_eq!(
            ErrorCode::TransactionReverted(None).user_message(),
            Some("ERR: Action Restricted".to_string())
        );
        assert_eq!(
            ErrorCode::TransactionReverted(None).to_string(),
            "Transaction reverted: execution failed"
        );
    }

    #[test]
    fn missing_routes_read_as_no_route() {
        assert_eq!(ErrorCode::NoRoute.user_message(), Some("No route".to_string()));
    }
}
