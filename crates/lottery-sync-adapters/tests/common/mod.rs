#![allow(dead_code)]

use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use alloy::primitives::Address;
use serde_json::{json, Value};
use tiny_http::{Response, Server};

use lottery_sync_adapters::{LotteryAdapterConfig, RuntimeProfile};
use lottery_sync_core::{ClockPort, PortError};

pub const SEPOLIA: u64 = 11_155_111;
pub const START_MS: u64 = 1_739_750_400_000;

#[derive(Debug, Clone, Default)]
pub struct TestClock {
    now: Arc<AtomicU64>,
}

impl TestClock {
    pub fn at(now_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.load(Ordering::SeqCst))
    }
}

pub type RpcCalls = Arc<Mutex<Vec<(String, Value)>>>;

/// Starts a JSON-RPC endpoint answering each request through `handler`.
///
/// `Ok(v)` becomes `result`, `Err(e)` becomes the `error` object.
pub fn spawn_rpc<F>(handler: F) -> (String, RpcCalls)
where
    F: Fn(&str, &Value) -> Result<Value, Value> + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let url = format!("http://{}", server.server_addr());
    let calls: RpcCalls = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&calls);

    thread::spawn(move || {
        while let Ok(mut req) = server.recv() {
            let mut body = String::new();
            if req.as_reader().read_to_string(&mut body).is_err() {
                continue;
            }
            let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let method = payload["method"].as_str().unwrap_or_default().to_owned();
            let params = payload["params"].clone();
            if let Ok(mut g) = seen.lock() {
                g.push((method.clone(), params.clone()));
            }

            let reply = match handler(&method, &params) {
                Ok(result) => json!({"jsonrpc": "2.0", "id": payload["id"], "result": result}),
                Err(error) => json!({"jsonrpc": "2.0", "id": payload["id"], "error": error}),
            };
            let _ = req.respond(Response::from_string(reply.to_string()));
        }
    });

    (url, calls)
}

pub fn calls_of(calls: &RpcCalls, method: &str) -> Vec<Value> {
    calls
        .lock()
        .expect("calls lock")
        .iter()
        .filter(|(m, _)| m == method)
        .map(|(_, p)| p.clone())
        .collect()
}

pub fn proxy_config(url: String) -> LotteryAdapterConfig {
    LotteryAdapterConfig {
        runtime_profile: RuntimeProfile::Production,
        wallet_proxy_url: Some(url),
        rpc_timeout_ms: 5_000,
        receipt_poll_interval_ms: 10,
        receipt_timeout_ms: 2_000,
        ..LotteryAdapterConfig::default()
    }
}

pub fn player_address() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid player address")
}

pub fn other_address() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid other address")
}

pub fn owner_address() -> Address {
    "0x00000000000000000000000000000000000000aa"
        .parse()
        .expect("valid owner address")
}

pub fn hex_data(bytes: &[u8]) -> Value {
    json!(format!("0x{}", alloy::hex::encode(bytes)))
}
