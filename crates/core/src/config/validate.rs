use super::{Config, ConfigError};

/// Validate a loaded configuration.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.shards.primary_path == config.shards.secondary_path {
        return Err(ConfigError::ValidationError(
            "primary and secondary shards must use distinct database paths".to_string(),
        ));
    }

    if config.routing.migration_threshold_mb == 0 {
        return Err(ConfigError::ValidationError(
            "routing.migration_threshold_mb must be greater than 0".to_string(),
        ));
    }

    if config.search.max_results == 0 {
        return Err(ConfigError::ValidationError(
            "search.max_results must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
