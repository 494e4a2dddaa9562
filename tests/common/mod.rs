//! Shared test doubles for integration tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use jetton_gateway::{GatewayConfig, RpcError, RpcResult, RpcTransport, TonAddress};

/// A scriptable transport: outcomes are queued per operation and every call
/// is counted. When a queue runs dry the transport keeps failing, which
/// models a remote that stays down.
#[derive(Default)]
pub struct ScriptedTransport {
    address_results: Mutex<VecDeque<RpcResult<TonAddress>>>,
    balance_results: Mutex<VecDeque<RpcResult<u128>>>,
    pub address_calls: AtomicU32,
    pub balance_calls: AtomicU32,
}

impl ScriptedTransport {
    pub fn push_address(&self, result: RpcResult<TonAddress>) {
        self.address_results.lock().unwrap().push_back(result);
    }

    pub fn push_balance(&self, result: RpcResult<u128>) {
        self.balance_results.lock().unwrap().push_back(result);
    }

    pub fn address_calls(&self) -> u32 {
        self.address_calls.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> u32 {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn get_wallet_address(
        &self,
        _master: &TonAddress,
        _owner: &TonAddress,
    ) -> RpcResult<TonAddress> {
        self.address_calls.fetch_add(1, Ordering::SeqCst);
        self.address_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::Transient("scripted remote is down".into())))
    }

    async fn get_wallet_balance(&self, _wallet: &TonAddress) -> RpcResult<u128> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balance_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::Transient("scripted remote is down".into())))
    }
}

/// Gateway configuration tuned for tests: token with 6 decimals and a small
/// retry budget so exhaustion tests stay fast.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.token.master_address = "EQMasterJetton".to_string();
    config.token.decimals = 6;
    config.retry.max_attempts = 3;
    config.retry.base_delay_ms = 100;
    config
}
