use crate::chain::{ChainReader, ChainWriter, Clock, ContractCall};
use crate::config::ClientConfig;
use crate::flows::guard::AllowanceKey;
use crate::instructions::abi::{encode_args, uint_word, Token};
use crate::instructions::token_instructions::{ALLOWANCE, APPROVE};
use kardia_mining::states::{ReceiptStatus, TxHash};
use kardia_mining::{Address, ErrorCode, Result, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

pub fn addr(byte: u8) -> Address {
    Address([byte; 20])
}

pub fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(18)
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        http_urls: vec!["http://127.0.0.1:8545".to_string()],
        account: None,
        controller: addr(0xC0),
        usdt: addr(0x05),
        kdia: addr(0x0D),
        wbtc: addr(0x0B),
        router: addr(0x40),
        kdia_btcb_pair: addr(0x9A),
        slippage_bps: 1_500,
        approval_threshold: U256::exp10(17),
        swap_deadline_secs: 1_200,
        receipt_poll: Duration::from_millis(1),
    }
}

pub struct FixedClock(pub AtomicU64);

impl FixedClock {
    pub fn at(now: u64) -> Self {
        FixedClock(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

struct MinedReceipt {
    ready_at: Instant,
    status: ReceiptStatus,
    approval: Option<(AllowanceKey, U256)>,
}

/// In-memory chain: canned reads, tracked allowances, recorded sends.
#[derive(Default)]
pub struct MockChain {
    reads: Mutex<HashMap<ContractCall, Result<Vec<u8>>>>,
    allowances: Mutex<HashMap<AllowanceKey, U256>>,
    sent: Mutex<Vec<(Address, ContractCall)>>,
    send_failures: Mutex<HashMap<&'static str, ErrorCode>>,
    reverts: Mutex<HashMap<&'static str, Option<String>>>,
    receipts: Mutex<HashMap<TxHash, MinedReceipt>>,
    receipt_delay: Mutex<Duration>,
    hold_receipts: AtomicBool,
    next_hash: AtomicU64,
}

impl MockChain {
    pub fn set_raw(&self, call: ContractCall, data: Vec<u8>) {
        self.reads.lock().unwrap().insert(call, Ok(data));
    }

    pub fn set_uint(&self, call: ContractCall, value: U256) {
        self.set_raw(call, uint_word(value).to_vec());
    }

    pub fn set_uints(&self, call: ContractCall, values: &[U256]) {
        let data = values.iter().flat_map(|value| uint_word(*value)).collect();
        self.set_raw(call, data);
    }

    pub fn set_uint_array(&self, call: ContractCall, values: Vec<U256>) {
        self.set_raw(call, encode_args(&[Token::UintArray(values)]));
    }

    pub fn fail_read(&self, call: ContractCall, err: ErrorCode) {
        self.reads.lock().unwrap().insert(call, Err(err));
    }

    pub fn set_allowance(&self, key: AllowanceKey, amount: U256) {
        self.allowances.lock().unwrap().insert(key, amount);
    }

    pub fn allowance(&self, key: AllowanceKey) -> U256 {
        self.allowances
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .unwrap_or_default()
    }

    pub fn fail_send(&self, signature: &'static str, err: ErrorCode) {
        self.send_failures.lock().unwrap().insert(signature, err);
    }

    pub fn revert(&self, signature: &'static str, reason: Option<&str>) {
        self.reverts
            .lock()
            .unwrap()
            .insert(signature, reason.map(str::to_string));
    }

    pub fn clear_failures(&self) {
        self.send_failures.lock().unwrap().clear();
        self.reverts.lock().unwrap().clear();
    }

    pub fn set_receipt_delay(&self, delay: Duration) {
        *self.receipt_delay.lock().unwrap() = delay;
    }

    /// Keep every receipt pending until `release_receipts`.
    pub fn hold_receipts(&self) {
        self.hold_receipts.store(true, Ordering::SeqCst);
    }

    pub fn release_receipts(&self) {
        self.hold_receipts.store(false, Ordering::SeqCst);
    }

    pub fn sent_calls(&self, signature: &str) -> Vec<(Address, ContractCall)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, call)| call.signature == signature)
            .cloned()
            .collect()
    }

    pub fn sent_count(&self, signature: &str) -> usize {
        self.sent_calls(signature).len()
    }

    pub fn total_sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Spin until `signature` has been sent `count` times.
    pub fn wait_for_send(&self, signature: &str, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.sent_count(signature) < count {
            assert!(Instant::now() < deadline, "{} was never sent", signature);
            thread::sleep(Duration::from_millis(1));
        }
    }
}

fn address_arg(call: &ContractCall, index: usize) -> Address {
    match call.args.get(index) {
        Some(Token::Address(address)) => *address,
        other => panic!("expected address argument, got {:?}", other),
    }
}

fn uint_arg(call: &ContractCall, index: usize) -> U256 {
    match call.args.get(index) {
        Some(Token::Uint(value)) => *value,
        other => panic!("expected uint argument, got {:?}", other),
    }
}

impl ChainReader for MockChain {
    fn call(&self, call: &ContractCall) -> Result<Vec<u8>> {
        if call.signature == ALLOWANCE {
            let key = AllowanceKey {
                token: call.to,
                owner: address_arg(call, 0),
                spender: address_arg(call, 1),
            };
            return Ok(uint_word(self.allowance(key)).to_vec());
        }
        self.reads
            .lock()
            .unwrap()
            .get(call)
            .cloned()
            .unwrap_or_else(|| Err(ErrorCode::ReadFailure(format!("no data for {}", call.signature))))
    }
}

impl ChainWriter for MockChain {
    fn send_transaction(&self, from: Address, call: &ContractCall) -> Result<TxHash> {
        if let Some(err) = self.send_failures.lock().unwrap().get(call.signature) {
            return Err(err.clone());
        }
        self.sent.lock().unwrap().push((from, call.clone()));

        let n = self.next_hash.fetch_add(1, Ordering::SeqCst) + 1;
        let mut raw = [0u8; 32];
        raw[24..].copy_from_slice(&n.to_be_bytes());
        let hash = TxHash(raw);

        let status = match self.reverts.lock().unwrap().get(call.signature) {
            Some(reason) => ReceiptStatus::Reverted(reason.clone()),
            None => ReceiptStatus::Success,
        };
        let approval = (call.signature == APPROVE && status == ReceiptStatus::Success).then(|| {
            let key = AllowanceKey {
                token: call.to,
                owner: from,
                spender: address_arg(call, 0),
            };
            (key, uint_arg(call, 1))
        });
        let ready_at = Instant::now() + *self.receipt_delay.lock().unwrap();
        self.receipts.lock().unwrap().insert(
            hash,
            MinedReceipt {
                ready_at,
                status,
                approval,
            },
        );
        Ok(hash)
    }

    fn receipt(&self, hash: &TxHash) -> Result<ReceiptStatus> {
        if self.hold_receipts.load(Ordering::SeqCst) {
            return Ok(ReceiptStatus::Pending);
        }
        let mut receipts = self.receipts.lock().unwrap();
        let mined = receipts
            .get_mut(hash)
            .ok_or_else(|| ErrorCode::ReadFailure(format!("unknown tx {}", hash)))?;
        if Instant::now() < mined.ready_at {
            return Ok(ReceiptStatus::Pending);
        }
        if let Some((key, amount)) = mined.approval.take() {
            self.set_allowance(key, amount);
        }
        Ok(mined.status.clone())
    }
}
