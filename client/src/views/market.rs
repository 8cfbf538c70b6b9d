//! Protocol-wide reads: pool sizes, emission rate, KDIA price, and the
//! user's token balances.

use super::{poll_view, LiveView, SYNCING};
use crate::chain::ChainReader;
use crate::config::ClientConfig;
use crate::instructions::controller_instructions::{
    drip_rate_instr, kdia_price_instr, miners_pool_instr, reward_pool_instr, total_pu_instr,
};
use crate::instructions::router_instructions::{get_amounts_out_instr, get_reserves_instr};
use crate::instructions::token_instructions::balance_of_instr;
use crate::instructions::utils::{read_reserves, read_uint, read_uint_array};
use crate::poller::{Poller, RefreshHandle};
use kardia_mining::amount::u256_string;
use kardia_mining::curve::{resolve_kdia_price, KdiaPrice, RewardCalculator};
use kardia_mining::{
    format_units, Address, Result, U256, DRIP_POLL_INTERVAL_SECS, REWARD_POLL_INTERVAL_SECS,
    TOKEN_DECIMALS,
};
use serde::Serialize;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const AMOUNT_PRECISION: usize = 4;
const RATE_PRECISION: usize = 8;
const PRICE_PRECISION: usize = 4;

fn amount_label(value: U256) -> String {
    format_units(value, TOKEN_DECIMALS, AMOUNT_PRECISION)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    #[serde(with = "u256_string")]
    pub miners_pool: U256,
    #[serde(with = "u256_string")]
    pub reward_pool: U256,
    #[serde(with = "u256_string")]
    pub total_pu: U256,
}

impl PoolStats {
    pub fn labels(&self) -> [(&'static str, String); 3] {
        [
            ("Miners Pool", amount_label(self.miners_pool)),
            ("Reward Pool", amount_label(self.reward_pool)),
            ("Total PU", amount_label(self.total_pu)),
        ]
    }
}

pub fn fetch_pools<R: ChainReader + ?Sized>(reader: &R, controller: Address) -> Result<PoolStats> {
    Ok(PoolStats {
        miners_pool: read_uint(reader, &miners_pool_instr(controller))?,
        reward_pool: read_uint(reader, &reward_pool_instr(controller))?,
        total_pu: read_uint(reader, &total_pu_instr(controller))?,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DripStats {
    #[serde(with = "u256_string")]
    pub rate_per_second: U256,
    #[serde(with = "u256_string")]
    pub per_day: U256,
}

impl DripStats {
    pub fn from_rate(rate_per_second: U256) -> Self {
        DripStats {
            rate_per_second,
            per_day: RewardCalculator::drip_per_day(rate_per_second),
        }
    }

    /// Daily emission, or `SYNCING...` while the rate reads as zero.
    pub fn per_day_label(&self) -> String {
        if self.per_day.is_zero() {
            SYNCING.to_string()
        } else {
            amount_label(self.per_day)
        }
    }

    pub fn rate_label(&self) -> String {
        format_units(self.rate_per_second, TOKEN_DECIMALS, RATE_PRECISION)
    }
}

pub fn fetch_drip<R: ChainReader + ?Sized>(reader: &R, controller: Address) -> Result<DripStats> {
    read_uint(reader, &drip_rate_instr(controller)).map(DripStats::from_rate)
}

/// USDT value of one WBTC through the router.
pub fn fetch_btc_usdt<R: ChainReader + ?Sized>(reader: &R, config: &ClientConfig) -> Result<U256> {
    let one_btc = U256::exp10(TOKEN_DECIMALS as usize);
    let call = get_amounts_out_instr(config.router, one_btc, vec![config.wbtc, config.usdt]);
    let amounts = read_uint_array(reader, &call)?;
    Ok(amounts.last().copied().unwrap_or_default())
}

/// KDIA price from the controller oracle, falling back to the KDIA/BTCB pool.
///
/// Never fails: unreadable sources are skipped and `None` means no source
/// produced a price.
pub fn fetch_kdia_price<R: ChainReader + ?Sized>(
    reader: &R,
    config: &ClientConfig,
) -> Option<KdiaPrice> {
    let oracle = read_uint(reader, &kdia_price_instr(config.controller))
        .map_err(|err| debug!(error = %err, "oracle price unavailable"))
        .ok();
    if let Some(price) = resolve_kdia_price(oracle, None, None) {
        return Some(price);
    }
    let reserves = read_reserves(reader, &get_reserves_instr(config.kdia_btcb_pair))
        .map_err(|err| debug!(error = %err, "pair reserves unavailable"))
        .ok();
    let btc_usdt = fetch_btc_usdt(reader, config)
        .map_err(|err| debug!(error = %err, "btc price unavailable"))
        .ok();
    resolve_kdia_price(oracle, reserves, btc_usdt)
}

pub fn price_label(price: Option<&KdiaPrice>) -> String {
    match price {
        Some(price) => format_units(price.value, TOKEN_DECIMALS, PRICE_PRECISION),
        None => format!("0.{}", "0".repeat(PRICE_PRECISION)),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Balances {
    #[serde(with = "u256_string")]
    pub usdt: U256,
    #[serde(with = "u256_string")]
    pub kdia: U256,
}

impl Balances {
    pub fn labels(&self) -> [(&'static str, String); 2] {
        [("USDT", amount_label(self.usdt)), ("KDIA", amount_label(self.kdia))]
    }
}

pub fn fetch_balances<R: ChainReader + ?Sized>(
    reader: &R,
    config: &ClientConfig,
    owner: Address,
) -> Result<Balances> {
    Ok(Balances {
        usdt: read_uint(reader, &balance_of_instr(config.usdt, owner))?,
        kdia: read_uint(reader, &balance_of_instr(config.kdia, owner))?,
    })
}

/// Live pool, drip, price and balance views.
pub struct MarketViews {
    pub pools: LiveView<PoolStats>,
    pub drip: LiveView<DripStats>,
    pub price: LiveView<Option<KdiaPrice>>,
    pub balances: LiveView<Balances>,
    pollers: Vec<Poller>,
}

impl MarketViews {
    pub fn start<C>(chain: Arc<C>, config: Arc<ClientConfig>, owner: Address) -> io::Result<Self>
    where
        C: ChainReader + 'static,
    {
        let drip_every = Duration::from_secs(DRIP_POLL_INTERVAL_SECS);
        let read_every = Duration::from_secs(REWARD_POLL_INTERVAL_SECS);

        let (pools, pools_poller) = {
            let (chain, controller) = (chain.clone(), config.controller);
            poll_view("pool-view", read_every, move || fetch_pools(chain.as_ref(), controller))?
        };
        let (drip, drip_poller) = {
            let (chain, controller) = (chain.clone(), config.controller);
            poll_view("drip-view", drip_every, move || fetch_drip(chain.as_ref(), controller))?
        };
        let (price, price_poller) = {
            let (chain, config) = (chain.clone(), config.clone());
            poll_view("price-view", read_every, move || {
                Ok(fetch_kdia_price(chain.as_ref(), &config))
            })?
        };
        let (balances, balances_poller) = poll_view("balance-view", read_every, move || {
            fetch_balances(chain.as_ref(), &config, owner)
        })?;

        Ok(MarketViews {
            pools,
            drip,
            price,
            balances,
            pollers: vec![pools_poller, drip_poller, price_poller, balances_poller],
        })
    }

    pub fn refresh_handles(&self) -> Vec<RefreshHandle> {
        self.pollers.iter().map(Poller::refresh_handle).collect()
    }
}
