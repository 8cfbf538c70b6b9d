use super::abi::{decode_uint, decode_uint_array};
use crate::chain::{ChainReader, ContractCall};
use kardia_mining::curve::PairReserves;
use kardia_mining::{ErrorCode, Result, U256};

/// Run a read and decode its first word as `uint256`.
pub fn read_uint<R: ChainReader + ?Sized>(reader: &R, call: &ContractCall) -> Result<U256> {
    let data = reader.call(call)?;
    decode_uint(&data, 0)
}

/// Run a read returning `uint256[]`.
pub fn read_uint_array<R: ChainReader + ?Sized>(
    reader: &R,
    call: &ContractCall,
) -> Result<Vec<U256>> {
    let data = reader.call(call)?;
    decode_uint_array(&data)
}

/// Unix-seconds read such as `unlockTime(user)`.
pub fn read_timestamp<R: ChainReader + ?Sized>(reader: &R, call: &ContractCall) -> Result<u64> {
    let value = read_uint(reader, call)?;
    if value > U256::from(u64::MAX) {
        return Err(ErrorCode::MalformedResponse(format!(
            "timestamp {} does not fit in 64 bits",
            value
        )));
    }
    Ok(value.low_u64())
}

/// `getReserves()` of the KDIA/BTCB pair: token0 is BTCB, token1 is KDIA.
pub fn read_reserves<R: ChainReader + ?Sized>(
    reader: &R,
    call: &ContractCall,
) -> Result<PairReserves> {
    let data = reader.call(call)?;
    Ok(PairReserves {
        reserve_btcb: decode_uint(&data, 0)?,
        reserve_kdia: decode_uint(&data, 1)?,
    })
}
