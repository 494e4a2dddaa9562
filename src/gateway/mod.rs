//! Resilient RPC facade.
//!
//! # Responsibilities
//! - Compose the limiter gate and a bounded retry loop around raw transport
//!   calls
//! - Expose the derived operations: wallet-address derivation, raw balance,
//!   display balance, unit conversion
//! - Populate and consult the per-operation cache tiers
//!
//! # Control Flow
//! ```text
//! caller → operation → cache lookup ── hit ──▶ return
//!                          │ miss
//!                          ▼
//!                 limiter.acquire() → transport call
//!                          │                │
//!                      on overload      on success
//!              limiter.report_overload  write-through
//!                 retry with backoff      + return
//! ```
//!
//! # Design Decisions
//! - Retry is an explicit bounded loop with an attempt counter, not
//!   recursion
//! - Low-level operations propagate exhausted-retry errors; the display
//!   balance is fail-soft and returns 0 because it backs a UI path where a
//!   broken page is worse than a stale or zero figure
//! - Zero fallbacks are never cached, so the next call retries the chain

pub mod units;

use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStats, TtlCache};
use crate::config::schema::GatewayConfig;
use crate::limiter::{LimiterStats, RateLimiter};
use crate::observability::metrics;
use crate::rpc::{RpcError, RpcResult, RpcTransport, TonAddress};

/// Entry counts for each cache tier.
#[derive(Debug, Clone, Copy)]
pub struct GatewayCacheStats {
    pub wallet_addresses: CacheStats,
    pub raw_balances: CacheStats,
    pub display_balances: CacheStats,
}

/// Rate-limited, caching access layer over a jetton RPC transport.
///
/// One instance per process is typical, but nothing here is global; tests
/// and multi-token applications may hold several.
pub struct JettonGateway {
    transport: Arc<dyn RpcTransport>,
    limiter: RateLimiter,
    config: GatewayConfig,
    master: TonAddress,
    wallet_addresses: TtlCache<TonAddress>,
    raw_balances: TtlCache<u128>,
    display_balances: TtlCache<f64>,
}

impl JettonGateway {
    /// Create a gateway over the given transport.
    pub fn new(config: GatewayConfig, transport: Arc<dyn RpcTransport>) -> Self {
        let master = TonAddress::new(config.token.master_address.clone());
        Self {
            transport,
            limiter: RateLimiter::new(config.rate_limit.clone()),
            master,
            config,
            wallet_addresses: TtlCache::new("wallet_address"),
            raw_balances: TtlCache::new("raw_balance"),
            display_balances: TtlCache::new("display_balance"),
        }
    }

    /// Resolve the jetton wallet address owned by `owner`.
    ///
    /// The mapping is immutable once observed, so results keep a long TTL.
    /// Propagates the composed error once retries are exhausted.
    pub async fn wallet_address(&self, owner: &TonAddress) -> RpcResult<TonAddress> {
        let key = format!("jetton-wallet-{}-{}", self.master, owner);
        if let Some(cached) = self.wallet_addresses.get(&key) {
            return Ok(cached);
        }

        let transport = Arc::clone(&self.transport);
        let master = self.master.clone();
        let owner = owner.clone();
        let resolved = self
            .with_retry("get_wallet_address", move || {
                let transport = Arc::clone(&transport);
                let master = master.clone();
                let owner = owner.clone();
                async move { transport.get_wallet_address(&master, &owner).await }
            })
            .await?;

        self.wallet_addresses
            .set(key, resolved.clone(), self.config.cache.wallet_address_ttl());
        Ok(resolved)
    }

    /// Fetch the raw base-unit balance of a jetton wallet.
    ///
    /// Balances change, so results keep a short TTL. Propagates the composed
    /// error once retries are exhausted.
    pub async fn raw_balance(&self, wallet: &TonAddress) -> RpcResult<u128> {
        let key = format!("jetton-balance-{}", wallet);
        if let Some(cached) = self.raw_balances.get(&key) {
            return Ok(cached);
        }

        let transport = Arc::clone(&self.transport);
        let wallet = wallet.clone();
        let balance = self
            .with_retry("get_wallet_balance", move || {
                let transport = Arc::clone(&transport);
                let wallet = wallet.clone();
                async move { transport.get_wallet_balance(&wallet).await }
            })
            .await?;

        self.raw_balances
            .set(key, balance, self.config.cache.raw_balance_ttl());
        Ok(balance)
    }

    /// Human-readable jetton balance for `owner`.
    ///
    /// Fail-soft: any failure in the chain yields `0.0` instead of an error.
    /// The zero fallback is not cached, so the next call retries.
    pub async fn display_balance(&self, owner: &TonAddress) -> f64 {
        let key = format!("jetton-display-{}-{}", self.master, owner);
        if let Some(cached) = self.display_balances.get(&key) {
            return cached;
        }

        match self.fetch_display_balance(owner).await {
            Ok(amount) => {
                self.display_balances
                    .set(key, amount, self.config.cache.display_balance_ttl());
                amount
            }
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "Display balance unavailable, serving 0");
                metrics::record_balance_fallback();
                0.0
            }
        }
    }

    async fn fetch_display_balance(&self, owner: &TonAddress) -> RpcResult<f64> {
        let wallet = self.wallet_address(owner).await?;
        let raw = self.raw_balance(&wallet).await?;
        Ok(units::units_to_amount(raw, self.config.token.decimals))
    }

    /// Convert a display amount into base units, rounding down.
    pub fn amount_to_units(&self, amount: f64) -> u128 {
        units::amount_to_units(amount, self.config.token.decimals)
    }

    /// Convert a base-unit amount into a display amount.
    pub fn units_to_amount(&self, units: u128) -> f64 {
        units::units_to_amount(units, self.config.token.decimals)
    }

    /// Drop a single cache entry across all tiers.
    pub fn invalidate(&self, key: &str) {
        self.wallet_addresses.invalidate(key);
        self.raw_balances.invalidate(key);
        self.display_balances.invalidate(key);
    }

    /// Drop every cached value.
    pub fn clear_cache(&self) {
        self.wallet_addresses.clear();
        self.raw_balances.clear();
        self.display_balances.clear();
    }

    /// Snapshot of the limiter state.
    pub fn limiter_stats(&self) -> LimiterStats {
        self.limiter.stats()
    }

    /// Snapshot of the cache tiers.
    pub fn cache_stats(&self) -> GatewayCacheStats {
        GatewayCacheStats {
            wallet_addresses: self.wallet_addresses.stats(),
            raw_balances: self.raw_balances.stats(),
            display_balances: self.display_balances.stats(),
        }
    }

    /// Run `op` through the limiter gate with bounded retries.
    ///
    /// Every attempt passes `limiter.acquire()` first. Overload errors feed
    /// back into the limiter before the next attempt. Between attempts the
    /// delay grows as `base_delay × growth_factor^attempt` plus up to 10%
    /// jitter. After `max_attempts` failures the final error is wrapped in
    /// [`RpcError::RetriesExhausted`].
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut op: F) -> RpcResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RpcResult<T>>,
    {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut last_error: Option<RpcError> = None;

        for attempt in 0..max_attempts {
            self.limiter.acquire().await;

            match op().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(operation, attempt, "Operation recovered after retry");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if e.is_overload() {
                        self.limiter.report_overload();
                    }
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts,
                        error = %e,
                        "RPC attempt failed"
                    );
                    last_error = Some(e);

                    if attempt + 1 < max_attempts {
                        metrics::record_retry(operation);
                        tokio::time::sleep(self.retry_delay(attempt)).await;
                    }
                }
            }
        }

        let source = last_error.unwrap_or_else(|| {
            RpcError::Permanent("operation produced no attempts".to_string())
        });
        Err(RpcError::RetriesExhausted {
            operation: operation.to_string(),
            attempts: max_attempts,
            source: Box::new(source),
        })
    }

    /// Delay before retry number `attempt + 1`, with up to 10% jitter to
    /// spread simultaneous request chains.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry.base_delay();
        let factor = self.config.retry.growth_factor.powi(attempt as i32);
        let delay = base.mul_f64(factor);

        let jitter_range = delay.as_millis() as u64 / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };
        delay + Duration::from_millis(jitter)
    }
}

impl std::fmt::Debug for JettonGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JettonGateway")
            .field("master", &self.master)
            .field("decimals", &self.config.token.decimals)
            .field("max_attempts", &self.config.retry.max_attempts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scriptable transport double: queued outcomes, call counting.
    #[derive(Default)]
    struct MockTransport {
        address_results: Mutex<VecDeque<RpcResult<TonAddress>>>,
        balance_results: Mutex<VecDeque<RpcResult<u128>>>,
        address_calls: AtomicU32,
        balance_calls: AtomicU32,
    }

    impl MockTransport {
        fn push_address(&self, result: RpcResult<TonAddress>) {
            self.address_results.lock().unwrap().push_back(result);
        }

        fn push_balance(&self, result: RpcResult<u128>) {
            self.balance_results.lock().unwrap().push_back(result);
        }
    }

    #[async_trait]
    impl RpcTransport for MockTransport {
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
                .unwrap_or_else(|| Err(RpcError::Transient("mock script exhausted".into())))
        }

        async fn get_wallet_balance(&self, _wallet: &TonAddress) -> RpcResult<u128> {
            self.balance_calls.fetch_add(1, Ordering::SeqCst);
            self.balance_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RpcError::Transient("mock script exhausted".into())))
        }
    }

    fn test_gateway(transport: Arc<MockTransport>) -> JettonGateway {
        let mut config = GatewayConfig::default();
        config.token.master_address = "EQMaster".to_string();
        config.token.decimals = 6;
        config.retry.max_attempts = 3;
        config.retry.base_delay_ms = 100;
        JettonGateway::new(config, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_address_cached_after_first_call() {
        let transport = Arc::new(MockTransport::default());
        transport.push_address(Ok(TonAddress::from("EQWallet1")));
        let gateway = test_gateway(Arc::clone(&transport));

        let owner = TonAddress::from("EQOwner");
        let first = gateway.wallet_address(&owner).await.unwrap();
        let second = gateway.wallet_address(&owner).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.address_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_failure() {
        let transport = Arc::new(MockTransport::default());
        transport.push_balance(Err(RpcError::Transient("connection reset".into())));
        transport.push_balance(Ok(1_500_000));
        let gateway = test_gateway(Arc::clone(&transport));

        let balance = gateway
            .raw_balance(&TonAddress::from("EQWallet1"))
            .await
            .unwrap();
        assert_eq!(balance, 1_500_000);
        assert_eq!(transport.balance_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_attempts_exactly_max() {
        let transport = Arc::new(MockTransport::default());
        for _ in 0..5 {
            transport.push_balance(Err(RpcError::Transient("down".into())));
        }
        let gateway = test_gateway(Arc::clone(&transport));

        let err = gateway
            .raw_balance(&TonAddress::from("EQWallet1"))
            .await
            .unwrap_err();

        assert_eq!(transport.balance_calls.load(Ordering::SeqCst), 3);
        match err {
            RpcError::RetriesExhausted { attempts, operation, .. } => {
                assert_eq!(attempts, 3);
                assert_eq!(operation, "get_wallet_balance");
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overload_feeds_back_into_limiter() {
        let transport = Arc::new(MockTransport::default());
        transport.push_address(Err(RpcError::Overload("429".into())));
        transport.push_address(Ok(TonAddress::from("EQWallet1")));
        let gateway = test_gateway(Arc::clone(&transport));

        assert_eq!(gateway.limiter_stats().backoff_multiplier, 1);
        gateway
            .wallet_address(&TonAddress::from("EQOwner"))
            .await
            .unwrap();

        let stats = gateway.limiter_stats();
        assert!(stats.limited);
        assert_eq!(stats.backoff_multiplier, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_balance_fail_soft() {
        let transport = Arc::new(MockTransport::default());
        // Every attempt fails; the chain dies in wallet_address.
        let gateway = test_gateway(Arc::clone(&transport));

        let balance = gateway.display_balance(&TonAddress::from("EQOwner")).await;
        assert_eq!(balance, 0.0);
        // The zero fallback is not cached.
        assert_eq!(gateway.cache_stats().display_balances.entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_balance_conversion_and_cache() {
        let transport = Arc::new(MockTransport::default());
        transport.push_address(Ok(TonAddress::from("EQWallet1")));
        transport.push_balance(Ok(1_500_000));
        let gateway = test_gateway(Arc::clone(&transport));

        let owner = TonAddress::from("EQOwner");
        assert_eq!(gateway.display_balance(&owner).await, 1.5);

        // Second call served entirely from cache.
        assert_eq!(gateway.display_balance(&owner).await, 1.5);
        assert_eq!(transport.address_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.balance_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_forces_refetch() {
        let transport = Arc::new(MockTransport::default());
        transport.push_address(Ok(TonAddress::from("EQWallet1")));
        transport.push_address(Ok(TonAddress::from("EQWallet1")));
        let gateway = test_gateway(Arc::clone(&transport));

        let owner = TonAddress::from("EQOwner");
        gateway.wallet_address(&owner).await.unwrap();
        gateway.clear_cache();
        gateway.wallet_address(&owner).await.unwrap();

        assert_eq!(transport.address_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unit_conversion_uses_configured_decimals() {
        let gateway = test_gateway(Arc::new(MockTransport::default()));
        assert_eq!(gateway.units_to_amount(1_500_000), 1.5);
        assert_eq!(gateway.amount_to_units(1.5), 1_500_000);
    }
}
