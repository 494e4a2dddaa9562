//! Metrics recording helpers.
//!
//! # Metrics
//! - `gateway_cache_hits_total` / `gateway_cache_misses_total` (counter, by tier)
//! - `gateway_cache_entries` (gauge, by tier)
//! - `gateway_rpc_calls_total` (counter, by method and outcome)
//! - `gateway_rate_limited_total` (counter, by reason) and
//!   `gateway_rate_limit_delay_seconds` (histogram)
//! - `gateway_overload_signals_total` (counter)
//! - `gateway_retries_total` (counter, by operation)
//! - `gateway_balance_fallbacks_total` (counter): display balances served as 0
//! - `gateway_endpoint_healthy` (gauge): 1=healthy, 0=unhealthy

use metrics::{counter, gauge, histogram};
use std::time::Duration;

pub fn record_cache_hit(tier: &'static str) {
    counter!("gateway_cache_hits_total", "tier" => tier).increment(1);
}

pub fn record_cache_miss(tier: &'static str) {
    counter!("gateway_cache_misses_total", "tier" => tier).increment(1);
}

pub fn record_cache_size(tier: &'static str, entries: usize) {
    gauge!("gateway_cache_entries", "tier" => tier).set(entries as f64);
}

pub fn record_rpc_call(method: &str, outcome: &'static str) {
    counter!("gateway_rpc_calls_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_rate_limited(reason: &'static str, delay: Duration) {
    counter!("gateway_rate_limited_total", "reason" => reason).increment(1);
    histogram!("gateway_rate_limit_delay_seconds").record(delay.as_secs_f64());
}

pub fn record_overload_signal() {
    counter!("gateway_overload_signals_total").increment(1);
}

pub fn record_retry(operation: &str) {
    counter!("gateway_retries_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_balance_fallback() {
    counter!("gateway_balance_fallbacks_total").increment(1);
}

pub fn record_endpoint_health(healthy: bool) {
    gauge!("gateway_endpoint_healthy").set(if healthy { 1.0 } else { 0.0 });
}
