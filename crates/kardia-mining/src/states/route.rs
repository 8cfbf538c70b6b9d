use crate::address::Address;
use crate::amount::{u256_string, U256};
use crate::curve::minimum_amount_out;
use crate::error::{ErrorCode, Result};
use serde::Serialize;
use std::fmt;

//
// ──────────────────────────────────────────────────────────────────────────────
// Swap routes and quotes
// ──────────────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// USDT -> WBTC -> KDIA, through the deepest KDIA pool.
    Preferred,
    /// USDT -> KDIA.
    Direct,
}

/// Token path handed to the router.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SwapRoute {
    pub kind: RouteKind,
    pub path: Vec<Address>,
}

impl SwapRoute {
    pub fn preferred(token_in: Address, via: Address, token_out: Address) -> Self {
        SwapRoute {
            kind: RouteKind::Preferred,
            path: vec![token_in, via, token_out],
        }
    }

    pub fn direct(token_in: Address, token_out: Address) -> Self {
        SwapRoute {
            kind: RouteKind::Direct,
            path: vec![token_in, token_out],
        }
    }

    pub fn token_in(&self) -> Option<Address> {
        self.path.first().copied()
    }

    pub fn token_out(&self) -> Option<Address> {
        self.path.last().copied()
    }
}

impl fmt::Display for SwapRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hops: Vec<String> = self.path.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", hops.join(" -> "))
    }
}

/// Router output estimate for one route and input amount.
///
/// The route stored here is the one a swap built from this quote must submit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub route: SwapRoute,
    #[serde(with = "u256_string")]
    pub amount_in: U256,
    #[serde(with = "u256_string")]
    pub amount_out: U256,
    pub quoted_at: u64,
}

impl Quote {
    pub fn minimum_out(&self, slippage_bps: u64) -> Result<U256> {
        minimum_amount_out(self.amount_out, slippage_bps).ok_or(ErrorCode::Overflow)
    }

    /// Reject a swap when `fresh` no longer prices the same path and input.
    pub fn ensure_matches(&self, fresh: &Quote) -> Result<()> {
        if self.route.path != fresh.route.path || self.amount_in != fresh.amount_in {
            return Err(ErrorCode::StaleQuote);
        }
        Ok(())
    }
}
