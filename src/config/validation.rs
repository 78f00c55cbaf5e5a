use crate::config::types::{Config, HttpConfig, PoolConfig, RescanConfig, ServerConfig, StoreConfig};
use crate::store::is_valid_table_name;
use crate::ConfigError;

/// Upper bound on ingestion workers
const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_pool_config(&config.pool)?;
    validate_rescan_config(&config.rescan)?;
    validate_store_config(&config.store)?;
    validate_http_config(&config.http)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.host.is_empty() {
        return Err(ConfigError::Validation("host cannot be empty".to_string()));
    }
    Ok(())
}

/// Validates ingestion pool configuration
fn validate_pool_config(config: &PoolConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue_capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }

    Ok(())
}

fn validate_rescan_config(config: &RescanConfig) -> Result<(), ConfigError> {
    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "interval_secs must be >= 1, got {}",
            config.interval_secs
        )));
    }
    Ok(())
}

/// Validates store configuration
///
/// The table name ends up as a SQL identifier, so it is restricted to
/// ASCII alphanumerics and underscores and may not start with a digit.
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    validate_table_name(&config.table_name)
}

fn validate_table_name(name: &str) -> Result<(), ConfigError> {
    if !is_valid_table_name(name) {
        return Err(ConfigError::Validation(format!(
            "table_name must be ASCII alphanumerics and underscores, not starting with a digit, got '{}'",
            name
        )));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("urls").is_ok());
        assert!(validate_table_name("url_records_2").is_ok());
        assert!(validate_table_name("_urls").is_ok());

        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2urls").is_err());
        assert!(validate_table_name("urls; DROP TABLE x").is_err());
        assert!(validate_table_name("url-records").is_err());
    }

    #[test]
    fn test_validate_pool_config() {
        let ok = PoolConfig {
            workers: 3,
            queue_capacity: 64,
        };
        assert!(validate_pool_config(&ok).is_ok());

        let zero_workers = PoolConfig {
            workers: 0,
            queue_capacity: 64,
        };
        assert!(validate_pool_config(&zero_workers).is_err());

        let too_many = PoolConfig {
            workers: MAX_WORKERS + 1,
            queue_capacity: 64,
        };
        assert!(validate_pool_config(&too_many).is_err());

        let zero_capacity = PoolConfig {
            workers: 1,
            queue_capacity: 0,
        };
        assert!(validate_pool_config(&zero_capacity).is_err());
    }

    #[test]
    fn test_validate_rescan_interval() {
        assert!(validate_rescan_config(&RescanConfig { interval_secs: 60 }).is_ok());
        assert!(validate_rescan_config(&RescanConfig { interval_secs: 0 }).is_err());
    }
}
