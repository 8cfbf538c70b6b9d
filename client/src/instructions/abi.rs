//! Minimal Solidity ABI codec for the handful of call shapes the protocol uses:
//! `uint256`, `address`, and `address[]`/`uint256[]` arguments and returns.

use kardia_mining::{Address, ErrorCode, Result, U256};
use sha3::{Digest, Keccak256};

const WORD: usize = 32;

/// One ABI-encodable argument.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Uint(U256),
    Address(Address),
    AddressArray(Vec<Address>),
    UintArray(Vec<U256>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Token::AddressArray(_) | Token::UintArray(_))
    }
}

/// First four bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

pub fn uint_word(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    for (i, byte) in word.iter_mut().rev().enumerate() {
        *byte = value.byte(i);
    }
    word
}

pub fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn encode_tail(token: &Token, out: &mut Vec<u8>) {
    match token {
        Token::AddressArray(items) => {
            out.extend_from_slice(&uint_word(U256::from(items.len())));
            for item in items {
                out.extend_from_slice(&address_word(item));
            }
        }
        Token::UintArray(items) => {
            out.extend_from_slice(&uint_word(U256::from(items.len())));
            for item in items {
                out.extend_from_slice(&uint_word(*item));
            }
        }
        Token::Uint(_) | Token::Address(_) => {}
    }
}

/// Head/tail encoding of a tuple of arguments.
pub fn encode_args(args: &[Token]) -> Vec<u8> {
    let head_len = args.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for arg in args {
        match arg {
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::Address(address) => head.extend_from_slice(&address_word(address)),
            dynamic => {
                debug_assert!(dynamic.is_dynamic());
                let offset = head_len + tail.len();
                head.extend_from_slice(&uint_word(U256::from(offset)));
                encode_tail(dynamic, &mut tail);
            }
        }
    }
    head.extend(tail);
    head
}

pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend(encode_args(args));
    data
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8]> {
    offset
        .checked_add(WORD)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            ErrorCode::MalformedResponse(format!(
                "return data too short: {} bytes, wanted word at {}",
                data.len(),
                offset
            ))
        })
}

fn as_usize(value: U256) -> Result<usize> {
    if value > U256::from(u32::MAX) {
        return Err(ErrorCode::MalformedResponse(format!("offset {} out of range", value)));
    }
    Ok(value.low_u64() as usize)
}

/// The `index`-th static `uint256` of the return data.
pub fn decode_uint(data: &[u8], index: usize) -> Result<U256> {
    Ok(U256::from_big_endian(word_at(data, index * WORD)?))
}

/// A single dynamic `uint256[]` return value.
pub fn decode_uint_array(data: &[u8]) -> Result<Vec<U256>> {
    let offset = as_usize(decode_uint(data, 0)?)?;
    let len = as_usize(U256::from_big_endian(word_at(data, offset)?))?;
    (0..len)
        .map(|i| Ok(U256::from_big_endian(word_at(data, offset + WORD * (i + 1))?)))
        .collect()
}
