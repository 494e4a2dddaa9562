//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, attempts >= 1, growth >= 1.0)
//! - Check the endpoint parses as a URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted into the system

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `retry.max_attempts`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rpc.endpoint.parse::<url::Url>().is_err() {
        errors.push(err("rpc.endpoint", "must be a valid URL"));
    }
    if config.rpc.request_timeout_secs == 0 {
        errors.push(err("rpc.request_timeout_secs", "must be positive"));
    }

    if config.token.master_address.is_empty() {
        errors.push(err("token.master_address", "must not be empty"));
    }
    if config.token.decimals > 30 {
        errors.push(err("token.decimals", "must be at most 30"));
    }

    if config.rate_limit.max_requests_per_window == 0 {
        errors.push(err("rate_limit.max_requests_per_window", "must be positive"));
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(err("rate_limit.window_secs", "must be positive"));
    }
    if config.rate_limit.max_backoff_ms < config.rate_limit.base_backoff_ms {
        errors.push(err(
            "rate_limit.max_backoff_ms",
            "must be at least base_backoff_ms",
        ));
    }
    if config.rate_limit.max_backoff_multiplier == 0 {
        errors.push(err("rate_limit.max_backoff_multiplier", "must be positive"));
    }

    if config.retry.max_attempts == 0 {
        errors.push(err("retry.max_attempts", "must be at least 1"));
    }
    // Non-finite factors would blow up the retry delay math.
    if !config.retry.growth_factor.is_finite() || config.retry.growth_factor < 1.0 {
        errors.push(err("retry.growth_factor", "must be finite and at least 1.0"));
    }

    if config.cache.wallet_address_ttl_secs == 0
        || config.cache.raw_balance_ttl_secs == 0
        || config.cache.display_balance_ttl_secs == 0
    {
        errors.push(err("cache", "TTLs must be positive"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
