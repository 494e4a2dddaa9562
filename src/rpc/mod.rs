//! RPC transport layer.
//!
//! The facade in [`crate::gateway`] talks to the chain exclusively through
//! the [`RpcTransport`] trait defined here; the HTTP implementation is one
//! provider of that seam.

pub mod transport;
pub mod types;

pub use transport::{HttpRpcTransport, RpcTransport};
pub use types::{RpcError, RpcResult, TonAddress};
