//! Chain-facing types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// TON address in its user-friendly string form, for strong typing.
///
/// The gateway treats addresses as opaque; validation beyond non-emptiness
/// belongs to the transport / remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TonAddress(pub String);

impl TonAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TonAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TonAddress {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for TonAddress {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Errors that can occur during RPC operations.
///
/// The variants are the structured classification the retry policy keys on,
/// instead of substring-matching error messages.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Remote explicitly signalled excessive request rate (HTTP 429 class).
    #[error("remote rate limit: {0}")]
    Overload(String),

    /// Network failure, timeout, or remote-side fault worth retrying.
    #[error("transport error: {0}")]
    Transient(String),

    /// Malformed arguments or unparseable response; retrying won't help,
    /// but the retry loop treats it like any other failed attempt.
    #[error("rpc call rejected: {0}")]
    Permanent(String),

    /// All retry attempts failed; wraps the final error.
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<RpcError>,
    },
}

impl RpcError {
    /// Whether this error carries the remote overload signature.
    pub fn is_overload(&self) -> bool {
        matches!(self, RpcError::Overload(_))
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;
