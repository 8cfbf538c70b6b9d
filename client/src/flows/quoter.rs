//! Router quotes for USDT -> KDIA swaps with preferred-route fallback.

use crate::chain::{ChainReader, Clock};
use crate::config::ClientConfig;
use crate::instructions::router_instructions::get_amounts_out_instr;
use crate::instructions::utils::read_uint_array;
use kardia_mining::states::{Quote, SwapRoute};
use kardia_mining::{ErrorCode, Result, U256};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SwapQuoter<C> {
    chain: Arc<C>,
    clock: Arc<dyn Clock>,
    config: Arc<ClientConfig>,
}

impl<C: ChainReader> SwapQuoter<C> {
    pub fn new(chain: Arc<C>, clock: Arc<dyn Clock>, config: Arc<ClientConfig>) -> Self {
        SwapQuoter {
            chain,
            clock,
            config,
        }
    }

    /// Candidate routes, most preferred first.
    pub fn routes(&self) -> [SwapRoute; 2] {
        [
            SwapRoute::preferred(self.config.usdt, self.config.wbtc, self.config.kdia),
            SwapRoute::direct(self.config.usdt, self.config.kdia),
        ]
    }

    /// Quote `amount_in` on the first route that prices it.
    pub fn quote(&self, amount_in: U256) -> Result<Quote> {
        if amount_in.is_zero() {
            return Err(ErrorCode::ZeroAmount);
        }
        for route in self.routes() {
            match self.quote_route(&route, amount_in) {
                Ok(amount_out) => {
                    debug!(%route, %amount_in, %amount_out, "quoted");
                    return Ok(Quote {
                        route,
                        amount_in,
                        amount_out,
                        quoted_at: self.clock.now(),
                    });
                }
                Err(err) => warn!(%route, error = %err, "route unavailable, falling back"),
            }
        }
        Err(ErrorCode::NoRoute)
    }

    /// Output of `amount_in` along exactly `route`.
    pub fn quote_route(&self, route: &SwapRoute, amount_in: U256) -> Result<U256> {
        let call = get_amounts_out_instr(self.config.router, amount_in, route.path.clone());
        let amounts = read_uint_array(self.chain.as_ref(), &call)
            .map_err(|err| ErrorCode::QuoteUnavailable(err.to_string()))?;
        if amounts.len() != route.path.len() {
            return Err(ErrorCode::QuoteUnavailable(format!(
                "router returned {} amounts for {} hops",
                amounts.len(),
                route.path.len()
            )));
        }
        match amounts.last() {
            Some(out) if !out.is_zero() => Ok(*out),
            _ => Err(ErrorCode::QuoteUnavailable("router returned no output".into())),
        }
    }
}
