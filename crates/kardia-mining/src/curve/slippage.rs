use crate::{amount::U256, BPS_DENOMINATOR};

/// Lowest output accepted for a quoted output amount, rounded down.
///
/// Returns `None` for rates above 100% or on overflow.
pub fn minimum_amount_out(quoted_out: U256, slippage_bps: u64) -> Option<U256> {
    if slippage_bps > BPS_DENOMINATOR {
        return None;
    }
    quoted_out
        .checked_mul(U256::from(BPS_DENOMINATOR - slippage_bps))?
        .checked_div(U256::from(BPS_DENOMINATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_SLIPPAGE_BPS;
    use quickcheck::quickcheck;

    #[test]
    fn fifteen_percent_of_a_million() {
        assert_eq!(
            minimum_amount_out(U256::from(1_000_000u64), DEFAULT_SLIPPAGE_BPS),
            Some(U256::from(850_000u64))
        );
    }

    #[test]
    fn rounds_down() {
        assert_eq!(
            minimum_amount_out(U256::from(999u64), 1_500),
            Some(U256::from(849u64))
        );
    }

    #[test]
    fn rejects_rates_above_one_hundred_percent() {
        assert_eq!(minimum_amount_out(U256::from(1u64), 10_001), None);
    }

    quickcheck! {
        fn minimum_never_exceeds_quote(quoted: u64, bps: u16) -> bool {
            let bps = u64::from(bps) % (BPS_DENOMINATOR + 1);
            let min = minimum_amount_out(U256::from(quoted), bps).unwrap();
            let expected = (quoted as u128) * ((BPS_DENOMINATOR - bps) as u128) / (BPS_DENOMINATOR as u128);
            min <= U256::from(quoted) && min == U256::from(expected)
        }
    }
}
