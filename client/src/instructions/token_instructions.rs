use super::abi::Token;
use crate::chain::ContractCall;
use kardia_mining::{Address, U256};

pub const BALANCE_OF: &str = "balanceOf(address)";
pub const ALLOWANCE: &str = "allowance(address,address)";
pub const APPROVE: &str = "approve(address,uint256)";

pub fn balance_of_instr(token: Address, owner: Address) -> ContractCall {
    ContractCall::new(token, BALANCE_OF, vec![Token::Address(owner)])
}

pub fn allowance_instr(token: Address, owner: Address, spender: Address) -> ContractCall {
    ContractCall::new(
        token,
        ALLOWANCE,
        vec![Token::Address(owner), Token::Address(spender)],
    )
}

pub fn approve_instr(token: Address, spender: Address, amount: U256) -> ContractCall {
    ContractCall::new(
        token,
        APPROVE,
        vec![Token::Address(spender), Token::Uint(amount)],
    )
}
