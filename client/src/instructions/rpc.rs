//! JSON-RPC adapter for a wallet-backed EVM node.
//!
//! Reads go through `eth_call`; writes go through `eth_sendTransaction` so
//! the wallet behind the endpoint does the signing. Endpoints are tried in
//! configured order. Reads move on to the next endpoint after any transport
//! failure; writes only when the request never reached the node.

use crate::chain::{ChainReader, ChainWriter, ContractCall, Wallet};
use kardia_mining::states::{ReceiptStatus, TxHash};
use kardia_mining::{Address, ErrorCode, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// EIP-1193 "user rejected request".
const USER_REJECTED_CODE: i64 = 4001;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Delivery {
    /// Safe to repeat against another endpoint.
    Repeatable,
    /// Must reach at most one node.
    AtMostOnce,
}

/// True when the request cannot have left this machine.
fn never_delivered(err: &ureq::Transport) -> bool {
    matches!(
        err.kind(),
        ureq::ErrorKind::Dns
            | ureq::ErrorKind::ConnectionFailed
            | ureq::ErrorKind::InvalidUrl
            | ureq::ErrorKind::UnknownScheme
    )
}

#[derive(Debug)]
enum RpcFailure {
    Rejected,
    Remote(String),
    Transport(String),
    Malformed(String),
}

impl RpcFailure {
    fn into_read_error(self) -> ErrorCode {
        match self {
            RpcFailure::Rejected => ErrorCode::UserRejected,
            RpcFailure::Remote(message) => ErrorCode::ReadFailure(message),
            RpcFailure::Transport(message) => ErrorCode::Transport(message),
            RpcFailure::Malformed(message) => ErrorCode::MalformedResponse(message),
        }
    }

    fn into_write_error(self) -> ErrorCode {
        match self {
            RpcFailure::Remote(message) => ErrorCode::TransactionReverted(Some(message)),
            other => other.into_read_error(),
        }
    }
}

pub struct JsonRpcClient {
    urls: Vec<String>,
    agent: ureq::Agent,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(urls: Vec<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        JsonRpcClient {
            urls,
            agent,
            next_id: AtomicU64::new(1),
        }
    }

    fn request(
        &self,
        method: &str,
        params: Value,
        delivery: Delivery,
    ) -> std::result::Result<Value, RpcFailure> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut last_error = String::from("no rpc endpoints configured");
        for url in &self.urls {
            debug!(url = %url, method, id, "rpc request");
            let response = match self.agent.post(url).send_json(&body) {
                Ok(response) => response,
                // Nodes report JSON-RPC errors with a non-2xx status as well.
                Err(ureq::Error::Status(code, response)) => match response.into_json::<Value>() {
                    Ok(reply) if reply.get("error").is_some() => return parse_reply(reply),
                    _ if delivery == Delivery::AtMostOnce => {
                        return Err(RpcFailure::Transport(format!(
                            "{} returned HTTP {} for {}; not resent",
                            url, code, method
                        )));
                    }
                    _ => {
                        warn!(url = %url, code, "rpc endpoint returned an error status, trying next");
                        last_error = format!("{} returned HTTP {}", url, code);
                        continue;
                    }
                },
                Err(ureq::Error::Transport(err)) => {
                    if delivery == Delivery::AtMostOnce && !never_delivered(&err) {
                        warn!(url = %url, error = %err, method, "connection lost after sending, not resending");
                        return Err(RpcFailure::Transport(format!(
                            "{}: {}; the transaction may have been broadcast",
                            url, err
                        )));
                    }
                    warn!(url = %url, error = %err, "rpc endpoint unavailable, trying next");
                    last_error = err.to_string();
                    continue;
                }
            };
            let reply: Value = response
                .into_json()
                .map_err(|err| RpcFailure::Malformed(err.to_string()))?;
            return parse_reply(reply);
        }
        Err(RpcFailure::Transport(last_error))
    }
}

fn parse_reply(reply: Value) -> std::result::Result<Value, RpcFailure> {
    if let Some(error) = reply.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        if code == USER_REJECTED_CODE {
            return Err(RpcFailure::Rejected);
        }
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown rpc error")
            .to_string();
        return Err(RpcFailure::Remote(message));
    }
    reply
        .get("result")
        .cloned()
        .ok_or_else(|| RpcFailure::Malformed("reply carries neither result nor error".into()))
}

fn decode_hex_data(value: &Value) -> Result<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| ErrorCode::MalformedResponse(format!("expected hex string, got {}", value)))?;
    hex::decode(text.trim_start_matches("0x"))
        .map_err(|err| ErrorCode::MalformedResponse(err.to_string()))
}

fn call_object(call: &ContractCall) -> Value {
    json!({
        "to": call.to.to_string(),
        "data": format!("0x{}", hex::encode(call.calldata())),
    })
}

impl ChainReader for JsonRpcClient {
    fn call(&self, call: &ContractCall) -> Result<Vec<u8>> {
        let result = self
            .request("eth_call", json!([call_object(call), "latest"]), Delivery::Repeatable)
            .map_err(RpcFailure::into_read_error)?;
        decode_hex_data(&result)
    }
}

impl ChainWriter for JsonRpcClient {
    fn send_transaction(&self, from: Address, call: &ContractCall) -> Result<TxHash> {
        let mut tx = call_object(call);
        tx["from"] = Value::String(from.to_string());
        let result = self
            .request("eth_sendTransaction", json!([tx]), Delivery::AtMostOnce)
            .map_err(RpcFailure::into_write_error)?;
        let hash = result
            .as_str()
            .ok_or_else(|| ErrorCode::MalformedResponse(format!("expected tx hash, got {}", result)))?;
        hash.parse()
    }

    fn receipt(&self, hash: &TxHash) -> Result<ReceiptStatus> {
        let result = self
            .request(
                "eth_getTransactionReceipt",
                json!([hash.to_string()]),
                Delivery::Repeatable,
            )
            .map_err(RpcFailure::into_read_error)?;
        if result.is_null() {
            return Ok(ReceiptStatus::Pending);
        }
        match result.get("status").and_then(Value::as_str) {
            Some("0x1") => Ok(ReceiptStatus::Success),
            Some("0x0") => Ok(ReceiptStatus::Reverted(None)),
            other => Err(ErrorCode::MalformedResponse(format!(
                "unexpected receipt status {:?}",
                other
            ))),
        }
    }
}

impl Wallet for JsonRpcClient {
    fn account(&self) -> Result<Address> {
        let result = self
            .request("eth_accounts", json!([]), Delivery::Repeatable)
            .map_err(RpcFailure::into_read_error)?;
        let first = result
            .as_array()
            .and_then(|accounts| accounts.first())
            .and_then(Value::as_str)
            .ok_or_else(|| ErrorCode::ReadFailure("wallet exposes no account".into()))?;
        first.parse()
    }
}
