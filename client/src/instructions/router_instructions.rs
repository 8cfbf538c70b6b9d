use super::abi::Token;
use crate::chain::ContractCall;
use kardia_mining::{Address, U256};

pub const GET_AMOUNTS_OUT: &str = "getAmountsOut(uint256,address[])";
/// Fee-on-transfer variant; KDIA is taxed on transfer.
pub const SWAP_EXACT_TOKENS_FOR_TOKENS: &str =
    "swapExactTokensForTokensSupportingFeeOnTransferTokens(uint256,uint256,address[],address,uint256)";
pub const GET_RESERVES: &str = "getReserves()";

pub fn get_amounts_out_instr(router: Address, amount_in: U256, path: Vec<Address>) -> ContractCall {
    ContractCall::new(
        router,
        GET_AMOUNTS_OUT,
        vec![Token::Uint(amount_in), Token::AddressArray(path)],
    )
}

pub fn swap_instr(
    router: Address,
    amount_in: U256,
    amount_out_min: U256,
    path: Vec<Address>,
    to: Address,
    deadline: u64,
) -> ContractCall {
    ContractCall::new(
        router,
        SWAP_EXACT_TOKENS_FOR_TOKENS,
        vec![
            Token::Uint(amount_in),
            Token::Uint(amount_out_min),
            Token::AddressArray(path),
            Token::Address(to),
            Token::Uint(U256::from(deadline)),
        ],
    )
}

pub fn get_reserves_instr(pair: Address) -> ContractCall {
    ContractCall::new(pair, GET_RESERVES, Vec::new())
}
