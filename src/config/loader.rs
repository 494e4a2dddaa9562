//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::info!(
        endpoint = %config.rpc.endpoint,
        master = %config.token.master_address,
        decimals = config.token.decimals,
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file() {
        let result = load_config(Path::new("/nonexistent/gateway.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_valid_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("jetton_gateway_loader_test.toml");
        fs::write(
            &path,
            r#"
            [token]
            master_address = "EQMasterJetton"
            decimals = 6
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.token.decimals, 6);

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = std::env::temp_dir();
        let path = dir.join("jetton_gateway_loader_invalid_test.toml");
        // Missing master address fails validation.
        fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));

        fs::remove_file(&path).unwrap_or_default();
    }
}
