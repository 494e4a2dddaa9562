//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML config files;
//! every section and field has a sensible default so a partial file works.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// RPC endpoint settings.
    pub rpc: RpcConfig,

    /// The tracked jetton: master contract and decimal precision.
    pub token: TokenConfig,

    /// Outbound rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Retry policy for failed RPC calls.
    pub retry: RetryConfig,

    /// Cache TTL tiers.
    pub cache: CacheConfig,
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub endpoint: String,

    /// Optional API key sent as `X-API-Key`.
    pub api_key: Option<String>,

    /// Per-request timeout in seconds; bounds every retry attempt.
    pub request_timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://toncenter.com/api/v2/jsonRPC".to_string(),
            api_key: None,
            request_timeout_secs: 10,
        }
    }
}

/// Tracked token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Jetton master contract address.
    pub master_address: String,

    /// Decimal precision declared by the token.
    pub decimals: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            master_address: String::new(),
            decimals: 9,
        }
    }
}

/// Outbound rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per counting window before the gate delays.
    pub max_requests_per_window: u32,

    /// Counting window length in seconds.
    pub window_secs: u64,

    /// Base delay applied when the window is full, in milliseconds.
    pub base_backoff_ms: u64,

    /// Ceiling on any single computed delay, in milliseconds.
    pub max_backoff_ms: u64,

    /// Cap on the adaptive backoff multiplier.
    pub max_backoff_multiplier: u32,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: 100,
            window_secs: 60,
            base_backoff_ms: 2_000,
            max_backoff_ms: 30_000,
            max_backoff_multiplier: 16,
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per operation, including the first.
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,

    /// Multiplier applied to the delay after each failed attempt.
    pub growth_factor: f64,
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            growth_factor: 1.5,
        }
    }
}

/// Cache TTL tiers.
///
/// Derived wallet addresses are immutable once observed, so they keep a long
/// TTL; balances change and get a short one.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for derived wallet addresses, in seconds.
    pub wallet_address_ttl_secs: u64,

    /// TTL for raw balances, in seconds.
    pub raw_balance_ttl_secs: u64,

    /// TTL for display balances, in seconds.
    pub display_balance_ttl_secs: u64,
}

impl CacheConfig {
    pub fn wallet_address_ttl(&self) -> Duration {
        Duration::from_secs(self.wallet_address_ttl_secs)
    }

    pub fn raw_balance_ttl(&self) -> Duration {
        Duration::from_secs(self.raw_balance_ttl_secs)
    }

    pub fn display_balance_ttl(&self) -> Duration {
        Duration::from_secs(self.display_balance_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            wallet_address_ttl_secs: 1_800,
            raw_balance_ttl_secs: 120,
            display_balance_ttl_secs: 120,
        }
    }
}
