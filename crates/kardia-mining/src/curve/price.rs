use crate::amount::U256;
use serde::Serialize;

/// Where a displayed KDIA price came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PriceSource {
    /// The controller's own price oracle.
    Oracle,
    /// KDIA/BTCB pool reserves valued through the BTC/USDT router quote.
    PoolReserves,
}

/// KDIA price in USDT, scaled by 1e18.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct KdiaPrice {
    #[serde(with = "crate::amount::u256_string")]
    pub value: U256,
    pub source: PriceSource,
}

/// Reserves of the KDIA/BTCB pair as returned by `getReserves()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PairReserves {
    pub reserve_btcb: U256,
    pub reserve_kdia: U256,
}

/// Price KDIA from the pair: `reserve_btcb * btc_usdt / reserve_kdia`.
pub fn price_from_reserves(reserves: PairReserves, btc_usdt: U256) -> Option<U256> {
    if reserves.reserve_kdia.is_zero() {
        return None;
    }
    reserves
        .reserve_btcb
        .checked_mul(btc_usdt)?
        .checked_div(reserves.reserve_kdia)
}

/// Prefer a non-zero oracle price; otherwise fall back to pool reserves.
pub fn resolve_kdia_price(
    oracle: Option<U256>,
    reserves: Option<PairReserves>,
    btc_usdt: Option<U256>,
) -> Option<KdiaPrice> {
    if let Some(value) = oracle.filter(|price| !price.is_zero()) {
        return Some(KdiaPrice {
            value,
            source: PriceSource::Oracle,
        });
    }
    let value = price_from_reserves(reserves?, btc_usdt?)?;
    Some(KdiaPrice {
        value,
        source: PriceSource::PoolReserves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale;

    #[test]
    fn oracle_price_wins_when_positive() {
        let price = resolve_kdia_price(Some(scale()), None, None).unwrap();
        assert_eq!(price.source, PriceSource::Oracle);
        assert_eq!(price.value, scale());
    }

    #[test]
    fn zero_oracle_falls_back_to_reserves() {
        // 2 BTCB against 100_000 KDIA at 50_000 USDT/BTC -> 1 USDT per KDIA.
        let reserves = PairReserves {
            reserve_btcb: U256::from(2u64) * scale(),
            reserve_kdia: U256::from(100_000u64) * scale(),
        };
        let btc_usdt = U256::from(50_000u64) * scale();
        let price = resolve_kdia_price(Some(U256::zero()), Some(reserves), Some(btc_usdt)).unwrap();
        assert_eq!(price.source, PriceSource::PoolReserves);
        assert_eq!(price.value, scale());
    }

    #[test]
    fn empty_pool_has_no_price() {
        let reserves = PairReserves {
            reserve_btcb: scale(),
            reserve_kdia: U256::zero(),
        };
        assert_eq!(resolve_kdia_price(None, Some(reserves), Some(scale())), None);
        assert_eq!(resolve_kdia_price(None, None, Some(scale())), None);
    }
}
