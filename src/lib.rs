//! Jetton RPC Gateway
//!
//! A rate-limited, caching access layer mediating all outbound calls to a
//! remote TON-style RPC endpoint: jetton wallet-address derivation and
//! balance lookups on behalf of a client application.
//!
//! # Architecture Overview
//!
//! ```text
//!  caller ──▶ gateway (facade) ──▶ cache ── hit ──▶ return
//!                 │                  │ miss
//!                 │                  ▼
//!                 │            limiter.acquire()
//!                 │                  │
//!                 │                  ▼
//!                 │            rpc transport ──▶ remote endpoint
//!                 │                  │
//!                 │         classify: ok / overload / transient / permanent
//!                 │                  │
//!                 └── retry with backoff, write-through on success
//! ```
//!
//! The cache and limiter know nothing about RPC or each other; the gateway
//! composes them. Presentation code consumes the gateway's small functional
//! surface and never touches limiter or cache internals.

// Core components
pub mod cache;
pub mod gateway;
pub mod limiter;
pub mod rpc;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::GatewayConfig;
pub use gateway::JettonGateway;
pub use rpc::{HttpRpcTransport, RpcError, RpcResult, RpcTransport, TonAddress};
