//! JSON-RPC plumbing shared by the wallet and contract adapters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::Address;
use serde_json::Value;

use lottery_sync_core::PortError;

/// Anything that can answer a raw EIP-1193 `request`.
pub trait RpcPort {
    fn request(&self, method: &str, params: Value) -> Result<Value, PortError>;
}

impl<T: RpcPort + ?Sized> RpcPort for &T {
    fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        (**self).request(method, params)
    }
}

/// JSON-RPC 2.0 over HTTP POST.
#[derive(Debug)]
pub struct HttpJsonRpc {
    url: String,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl HttpJsonRpc {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PortError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcPort for HttpJsonRpc {
    fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!(method, id, "json-rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .map_err(|e| PortError::Transport(format!("{method} request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| PortError::Transport(format!("{method} json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(rpc_error(err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "{method} http status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport(format!("{method} response missing result")))
    }
}

/// Maps a JSON-RPC error object, keeping its numeric code when present.
pub fn rpc_error(err: &Value) -> PortError {
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| err.to_string());
    match err.get("code").and_then(Value::as_i64) {
        Some(code) => PortError::Provider { code, message },
        None => PortError::Transport(format!("json-rpc error: {message}")),
    }
}

/// Hex (`0x..`) or decimal quantity, as a string or a JSON number.
pub fn parse_quantity(value: &Value, what: &str) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Validation(format!("{what} must be string or number")))?;
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| PortError::Validation(format!("invalid {what} {raw:?}: {e}")))
}

pub fn quantity(n: u64) -> String {
    format!("{n:#x}")
}

pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, PortError> {
    let items = value
        .as_array()
        .ok_or_else(|| PortError::Validation("accounts: array expected".to_owned()))?;
    items
        .iter()
        .map(|item| {
            let raw = item
                .as_str()
                .ok_or_else(|| PortError::Validation("accounts: string expected".to_owned()))?;
            raw.parse::<Address>()
                .map_err(|e| PortError::Validation(format!("invalid account address {raw}: {e}")))
        })
        .collect()
}
