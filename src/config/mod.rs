//! Configuration subsystem.
//!
//! TOML on disk → serde schema with defaults → semantic validation.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
