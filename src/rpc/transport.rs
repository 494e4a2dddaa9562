//! RPC transport with timeout and structured error classification.
//!
//! # Responsibilities
//! - Invoke contract get-methods on a toncenter-style JSON-RPC endpoint
//! - Bound every attempt with a request timeout
//! - Classify failures into Overload / Transient / Permanent so the retry
//!   policy never inspects error message text
//! - Provide a health check for endpoint connectivity
//!
//! # Design Decisions
//! - The facade depends on the `RpcTransport` trait, not on HTTP; tests and
//!   alternative endpoints supply their own implementation
//! - HTTP 429 (and a 429 code inside the JSON envelope) is the only overload
//!   signature; 5xx is Transient, remaining 4xx and bad payloads Permanent

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::config::schema::RpcConfig;
use crate::observability::metrics;
use crate::rpc::types::{RpcError, RpcResult, TonAddress};

/// One outbound RPC surface: named contract get-methods with typed results.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Resolve the jetton wallet owned by `owner` under the jetton `master`.
    async fn get_wallet_address(
        &self,
        master: &TonAddress,
        owner: &TonAddress,
    ) -> RpcResult<TonAddress>;

    /// Fetch the raw base-unit balance held by a jetton wallet.
    async fn get_wallet_balance(&self, wallet: &TonAddress) -> RpcResult<u128>;
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: String,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    ok: Option<bool>,
    result: Option<GetMethodResult>,
    error: Option<String>,
    code: Option<i64>,
}

#[derive(Deserialize)]
struct GetMethodResult {
    #[serde(default)]
    stack: Vec<Value>,
    #[serde(default)]
    exit_code: i64,
}

/// JSON-RPC transport over HTTP.
pub struct HttpRpcTransport {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpRpcTransport {
    /// Build a transport from configuration.
    ///
    /// The per-request timeout bounds every attempt so a hung remote cannot
    /// stall the retry loop.
    pub fn new(config: &RpcConfig) -> RpcResult<Self> {
        let endpoint: Url = config
            .endpoint
            .parse()
            .map_err(|e| RpcError::Permanent(format!("invalid RPC endpoint '{}': {}", config.endpoint, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RpcError::Permanent(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// Check if the endpoint is reachable and answering.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.call("getMasterchainInfo", json!({})).await.is_ok();
        metrics::record_endpoint_health(healthy);
        healthy
    }

    /// Run a contract get-method and return the result stack.
    async fn run_get_method(
        &self,
        address: &str,
        method: &str,
        stack: Vec<Value>,
    ) -> RpcResult<Vec<Value>> {
        let params = json!({
            "address": address,
            "method": method,
            "stack": stack,
        });
        let result = self.call("runGetMethod", params).await?;
        if result.exit_code != 0 {
            return Err(RpcError::Permanent(format!(
                "get method '{}' on {} returned exit code {}",
                method, address, result.exit_code
            )));
        }
        Ok(result.stack)
    }

    /// Issue one JSON-RPC call and classify the outcome.
    async fn call(&self, method: &str, params: Value) -> RpcResult<GetMethodResult> {
        let request_id = Uuid::new_v4();
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: request_id.to_string(),
            method,
            params,
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key.as_str());
        }

        tracing::debug!(%request_id, method, "Issuing RPC call");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RpcError::Transient(format!("RPC request timed out: {}", e))
            } else {
                RpcError::Transient(format!("RPC request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            metrics::record_rpc_call(method, "overload");
            return Err(RpcError::Overload(format!("endpoint returned HTTP 429 for {}", method)));
        }
        if status.is_server_error() {
            metrics::record_rpc_call(method, "transient");
            return Err(RpcError::Transient(format!("endpoint returned HTTP {}", status)));
        }
        if !status.is_success() {
            metrics::record_rpc_call(method, "rejected");
            return Err(RpcError::Permanent(format!("endpoint returned HTTP {}", status)));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Permanent(format!("unparseable RPC response: {}", e)))?;

        if envelope.ok == Some(false) || envelope.result.is_none() {
            // Some gateways report throttling inside a 200 envelope.
            if envelope.code == Some(429) {
                metrics::record_rpc_call(method, "overload");
                return Err(RpcError::Overload(
                    envelope.error.unwrap_or_else(|| "rate limited".to_string()),
                ));
            }
            metrics::record_rpc_call(method, "rejected");
            return Err(RpcError::Permanent(
                envelope.error.unwrap_or_else(|| "RPC call failed without detail".to_string()),
            ));
        }

        metrics::record_rpc_call(method, "ok");
        tracing::debug!(%request_id, method, "RPC call succeeded");
        // result presence checked above
        envelope
            .result
            .ok_or_else(|| RpcError::Permanent("RPC response missing result".to_string()))
    }
}

#[async_trait]
impl RpcTransport for HttpRpcTransport {
    async fn get_wallet_address(
        &self,
        master: &TonAddress,
        owner: &TonAddress,
    ) -> RpcResult<TonAddress> {
        let stack = vec![json!(["tvm.Slice", owner.as_str()])];
        let result = self
            .run_get_method(master.as_str(), "get_wallet_address", stack)
            .await?;
        let entry = result
            .first()
            .ok_or_else(|| RpcError::Permanent("empty stack from get_wallet_address".to_string()))?;
        parse_stack_address(entry)
    }

    async fn get_wallet_balance(&self, wallet: &TonAddress) -> RpcResult<u128> {
        let result = self
            .run_get_method(wallet.as_str(), "get_wallet_data", Vec::new())
            .await?;
        let entry = result
            .first()
            .ok_or_else(|| RpcError::Permanent("empty stack from get_wallet_data".to_string()))?;
        parse_stack_int(entry)
    }
}

impl std::fmt::Debug for HttpRpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRpcTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

/// Parse an integer stack entry, `["num", "0x16e360"]` or a decimal string.
fn parse_stack_int(entry: &Value) -> RpcResult<u128> {
    let raw = stack_entry_value(entry)?;
    let parsed = if let Some(hex) = raw.strip_prefix("0x") {
        u128::from_str_radix(hex, 16)
    } else {
        raw.parse::<u128>()
    };
    parsed.map_err(|e| RpcError::Permanent(format!("invalid integer stack value '{}': {}", raw, e)))
}

/// Parse an address stack entry rendered by the endpoint as a string.
fn parse_stack_address(entry: &Value) -> RpcResult<TonAddress> {
    let raw = stack_entry_value(entry)?;
    if raw.is_empty() {
        return Err(RpcError::Permanent("empty address in stack entry".to_string()));
    }
    Ok(TonAddress::new(raw))
}

/// Extract the value half of a `[kind, value]` stack entry.
fn stack_entry_value(entry: &Value) -> RpcResult<String> {
    let pair = entry
        .as_array()
        .filter(|pair| pair.len() == 2)
        .ok_or_else(|| RpcError::Permanent(format!("unsupported stack entry: {}", entry)))?;
    pair[1]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| RpcError::Permanent(format!("non-string stack value: {}", pair[1])))
}
