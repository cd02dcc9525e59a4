use tracing::warn;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Timeouts are positive
/// - Enabled backends have somewhere to send requests
///
/// Having no backend enabled is allowed (every search is then empty) but
/// logged as a warning.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.search.backend_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "search.backend_timeout_secs must be greater than 0".to_string(),
        ));
    }

    let backends = &config.backends;

    if backends.rutor.enabled {
        if backends.rutor.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backends.rutor.url cannot be empty".to_string(),
            ));
        }
        check_timeout("backends.rutor.timeout_secs", backends.rutor.timeout_secs)?;
    }

    if backends.yohoho.enabled {
        if backends.yohoho.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backends.yohoho.url cannot be empty".to_string(),
            ));
        }
        check_timeout("backends.yohoho.timeout_secs", backends.yohoho.timeout_secs)?;
    }

    if backends.tparser.enabled {
        if backends.tparser.shards.is_empty() {
            return Err(ConfigError::ValidationError(
                "backends.tparser.shards cannot be empty".to_string(),
            ));
        }
        if backends.tparser.magnet_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backends.tparser.magnet_url cannot be empty".to_string(),
            ));
        }
        check_timeout("backends.tparser.timeout_secs", backends.tparser.timeout_secs)?;
    }

    if !backends.rutor.enabled && !backends.yohoho.enabled && !backends.tparser.enabled {
        warn!("No search backends enabled; every search will return no results");
    }

    Ok(())
}

fn check_timeout(key: &str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{} must be greater than 0",
            key
        )));
    }
    Ok(())
}
