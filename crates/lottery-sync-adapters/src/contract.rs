//! Lottery contract binding over raw JSON-RPC.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use alloy::primitives::{Address, B256, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};
use serde_json::{json, Value};

use lottery_sync_core::{
    ContractConnector, ContractEvent, ContractEventKind, LotteryAction, LotteryContractPort,
    PortError, SubscriptionId,
};

use crate::rpc::{parse_quantity, quantity, RpcPort};
use crate::LotteryAdapterConfig;

sol! {
    #[derive(Debug)]
    interface ILottery {
        event Entered(address indexed player, uint256 amount);
        event LotteryStarted(uint256 endTime);
        event LotteryEnded(uint256 requestId);
        event PrizeWithdrawn(address indexed winner, uint256 amount);

        function owner() external view returns (address);
        function lotteryOpen() external view returns (bool);
        function getPlayers() external view returns (address[] memory);
        function winner() external view returns (address);
        function isMember(address account) external view returns (bool);
        function getBalance() external view returns (uint256);
        function pendingVRF() external view returns (bool);
        function endTime() external view returns (uint256);

        function enter() external payable;
        function startLottery() external;
        function endLottery() external;
        function withdrawPrize() external;
    }
}

pub fn event_signature(kind: ContractEventKind) -> B256 {
    match kind {
        ContractEventKind::Entered => ILottery::Entered::SIGNATURE_HASH,
        ContractEventKind::LotteryStarted => ILottery::LotteryStarted::SIGNATURE_HASH,
        ContractEventKind::LotteryEnded => ILottery::LotteryEnded::SIGNATURE_HASH,
        ContractEventKind::PrizeWithdrawn => ILottery::PrizeWithdrawn::SIGNATURE_HASH,
    }
}

pub fn event_kind(topic0: &B256) -> Option<ContractEventKind> {
    ContractEventKind::ALL
        .into_iter()
        .find(|kind| event_signature(*kind) == *topic0)
}

pub fn action_calldata(action: LotteryAction) -> Vec<u8> {
    match action {
        LotteryAction::Enter => ILottery::enterCall {}.abi_encode(),
        LotteryAction::Start => ILottery::startLotteryCall {}.abi_encode(),
        LotteryAction::End => ILottery::endLotteryCall {}.abi_encode(),
        LotteryAction::Withdraw => ILottery::withdrawPrizeCall {}.abi_encode(),
    }
}

#[derive(Debug, Clone)]
pub struct ReceiptPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl From<&LotteryAdapterConfig> for ReceiptPolicy {
    fn from(cfg: &LotteryAdapterConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(cfg.receipt_poll_interval_ms),
            timeout: Duration::from_millis(cfg.receipt_timeout_ms),
        }
    }
}

#[derive(Debug, Default)]
struct LogCursor {
    next_id: u64,
    live: BTreeMap<SubscriptionId, ContractEventKind>,
    /// First block not yet scanned; set when the first subscription opens.
    from_block: Option<u64>,
}

/// One lottery contract seen through one signer.
#[derive(Debug)]
pub struct RpcLotteryContract<R: RpcPort> {
    rpc: R,
    address: Address,
    signer: Address,
    receipts: ReceiptPolicy,
    cursor: Mutex<LogCursor>,
}

impl<R: RpcPort> RpcLotteryContract<R> {
    pub fn new(rpc: R, address: Address, signer: Address, receipts: ReceiptPolicy) -> Self {
        Self {
            rpc,
            address,
            signer,
            receipts,
            cursor: Mutex::new(LogCursor::default()),
        }
    }

    fn cursor(&self) -> Result<MutexGuard<'_, LogCursor>, PortError> {
        self.cursor
            .lock()
            .map_err(|e| PortError::Transport(format!("log cursor lock poisoned: {e}")))
    }

    fn call<C: SolCall>(&self, call: C) -> Result<C::Return, PortError> {
        let params = json!([
            {
                "from": self.signer.to_string(),
                "to": self.address.to_string(),
                "data": format!("0x{}", alloy::hex::encode(call.abi_encode())),
            },
            "latest"
        ]);
        let result = self.rpc.request("eth_call", params)?;
        let raw = result
            .as_str()
            .ok_or_else(|| PortError::Validation(format!("{}: hex string expected", C::SIGNATURE)))?;
        let bytes = alloy::hex::decode(raw)
            .map_err(|e| PortError::Validation(format!("{}: invalid hex: {e}", C::SIGNATURE)))?;
        C::abi_decode_returns(&bytes, true)
            .map_err(|e| PortError::Validation(format!("{}: decode failed: {e}", C::SIGNATURE)))
    }

    fn block_number(&self) -> Result<u64, PortError> {
        parse_quantity(&self.rpc.request("eth_blockNumber", json!([]))?, "block number")
    }
}

impl<R: RpcPort> LotteryContractPort for RpcLotteryContract<R> {
    fn address(&self) -> Address {
        self.address
    }

    fn signer(&self) -> Address {
        self.signer
    }

    fn owner(&self) -> Result<Address, PortError> {
        Ok(self.call(ILottery::ownerCall {})?._0)
    }

    fn lottery_open(&self) -> Result<bool, PortError> {
        Ok(self.call(ILottery::lotteryOpenCall {})?._0)
    }

    fn players(&self) -> Result<Vec<Address>, PortError> {
        Ok(self.call(ILottery::getPlayersCall {})?._0)
    }

    fn winner(&self) -> Result<Address, PortError> {
        Ok(self.call(ILottery::winnerCall {})?._0)
    }

    fn is_member(&self, account: Address) -> Result<bool, PortError> {
        Ok(self.call(ILottery::isMemberCall { account })?._0)
    }

    fn balance(&self) -> Result<U256, PortError> {
        Ok(self.call(ILottery::getBalanceCall {})?._0)
    }

    fn pending_randomness(&self) -> Result<bool, PortError> {
        Ok(self.call(ILottery::pendingVRFCall {})?._0)
    }

    fn end_time(&self) -> Result<u64, PortError> {
        Ok(self.call(ILottery::endTimeCall {})?._0.saturating_to())
    }

    fn submit(&self, action: LotteryAction, value: U256) -> Result<B256, PortError> {
        let tx = json!({
            "from": self.signer.to_string(),
            "to": self.address.to_string(),
            "data": format!("0x{}", alloy::hex::encode(action_calldata(action))),
            "value": format!("0x{value:x}"),
        });
        let result = self.rpc.request("eth_sendTransaction", json!([tx]))?;
        let raw = result.as_str().ok_or_else(|| {
            PortError::Validation("eth_sendTransaction must return a hash".to_owned())
        })?;
        let hash = raw
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid tx hash {raw}: {e}")))?;
        tracing::debug!(method = action.method_name(), %hash, "transaction sent");
        Ok(hash)
    }

    fn wait_for_confirmation(&self, tx_hash: B256) -> Result<(), PortError> {
        let deadline = Instant::now() + self.receipts.timeout;
        loop {
            let receipt = self
                .rpc
                .request("eth_getTransactionReceipt", json!([tx_hash.to_string()]))?;
            if !receipt.is_null() {
                let status = receipt
                    .get("status")
                    .map(|s| parse_quantity(s, "receipt status"))
                    .transpose()?;
                return match status {
                    Some(0) => Err(PortError::Policy(format!("transaction {tx_hash} reverted"))),
                    _ => Ok(()),
                };
            }
            if Instant::now() >= deadline {
                return Err(PortError::Transport(format!(
                    "timed out waiting for receipt of {tx_hash}"
                )));
            }
            std::thread::sleep(self.receipts.poll_interval);
        }
    }

    fn subscribe(&self, kind: ContractEventKind) -> Result<SubscriptionId, PortError> {
        let mut cursor = self.cursor()?;
        if cursor.from_block.is_none() {
            let head = self.block_number()?;
            cursor.from_block = Some(head + 1);
        }
        cursor.next_id += 1;
        let id = SubscriptionId(cursor.next_id);
        cursor.live.insert(id, kind);
        tracing::debug!(event = kind.event_name(), id = id.0, "subscribed");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), PortError> {
        match self.cursor()?.live.remove(&id) {
            Some(_) => Ok(()),
            None => Err(PortError::NotFound(format!("subscription {}", id.0))),
        }
    }

    fn drain_events(&self) -> Result<Vec<ContractEvent>, PortError> {
        let mut cursor = self.cursor()?;
        let Some(from_block) = cursor.from_block else {
            return Ok(Vec::new());
        };
        if cursor.live.is_empty() {
            return Ok(Vec::new());
        }
        let head = self.block_number()?;
        if head < from_block {
            return Ok(Vec::new());
        }

        let mut topics: Vec<String> = cursor
            .live
            .values()
            .map(|kind| event_signature(*kind).to_string())
            .collect();
        topics.sort();
        topics.dedup();
        let filter = json!([{
            "address": self.address.to_string(),
            "fromBlock": quantity(from_block),
            "toBlock": quantity(head),
            "topics": [topics],
        }]);
        let logs = self.rpc.request("eth_getLogs", filter)?;
        let logs = logs
            .as_array()
            .ok_or_else(|| PortError::Validation("eth_getLogs: array expected".to_owned()))?;

        let mut events = Vec::new();
        for log in logs {
            let Some(kind) = log_kind(log) else {
                continue;
            };
            let block_number = log
                .get("blockNumber")
                .and_then(|b| parse_quantity(b, "block number").ok());
            for (id, live_kind) in &cursor.live {
                if *live_kind == kind {
                    events.push(ContractEvent {
                        subscription: *id,
                        kind,
                        block_number,
                    });
                }
            }
        }
        cursor.from_block = Some(head + 1);
        Ok(events)
    }
}

fn log_kind(log: &Value) -> Option<ContractEventKind> {
    let topic0 = log.get("topics")?.get(0)?.as_str()?;
    let topic0: B256 = topic0.parse().ok()?;
    event_kind(&topic0)
}

/// Binds [`RpcLotteryContract`]s over a shared RPC handle.
#[derive(Debug, Clone)]
pub struct RpcContractConnector<R: RpcPort + Clone> {
    rpc: R,
    receipts: ReceiptPolicy,
}

impl<R: RpcPort + Clone> RpcContractConnector<R> {
    pub fn new(rpc: R, receipts: ReceiptPolicy) -> Self {
        Self { rpc, receipts }
    }
}

impl<R: RpcPort + Clone> ContractConnector for RpcContractConnector<R> {
    type Contract = RpcLotteryContract<R>;

    fn bind(&self, address: Address, signer: Address) -> Result<Self::Contract, PortError> {
        if address == Address::ZERO {
            return Err(PortError::Validation("contract address is zero".to_owned()));
        }
        Ok(RpcLotteryContract::new(
            self.rpc.clone(),
            address,
            signer,
            self.receipts.clone(),
        ))
    }
}
