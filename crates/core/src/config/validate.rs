use super::{types::Config, ConfigError};

/// Longest accepted freshness window (one day).
const MAX_CACHE_DURATION_SECS: u64 = 86_400;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - At least one event id, none blank
/// - Cache duration is between 1 second and one day
/// - Source timeouts are positive
///
/// A missing Eventbrite token is not an error here; it is reported per
/// request.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.eventbrite.event_ids.is_empty() {
        return Err(ConfigError::ValidationError(
            "eventbrite.event_ids must list at least one event".to_string(),
        ));
    }

    if config.eventbrite.event_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ConfigError::ValidationError(
            "eventbrite.event_ids cannot contain blank ids".to_string(),
        ));
    }

    if config.cache.duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.duration_secs must be greater than 0".to_string(),
        ));
    }

    if config.cache.duration_secs > MAX_CACHE_DURATION_SECS {
        return Err(ConfigError::ValidationError(format!(
            "cache.duration_secs cannot exceed {} (got {})",
            MAX_CACHE_DURATION_SECS,
            config.cache.duration_secs
        )));
    }

    if config.eventbrite.timeout_secs == 0 || config.sheets.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "source timeout_secs must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, EventbriteConfig, ServerConfig};
    use std::net::IpAddr;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_missing_token_is_allowed() {
        let config = Config {
            eventbrite: EventbriteConfig {
                token: None,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_event_ids_fails() {
        let config = Config {
            eventbrite: EventbriteConfig {
                event_ids: vec![],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_blank_event_id_fails() {
        let config = Config {
            eventbrite: EventbriteConfig {
                event_ids: vec!["123".to_string(), " ".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_cache_duration_fails() {
        let config = Config {
            cache: CacheConfig { duration_secs: 0 },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_cache_duration_upper_bound() {
        let at_limit = Config {
            cache: CacheConfig {
                duration_secs: MAX_CACHE_DURATION_SECS,
            },
            ..Default::default()
        };
        assert!(validate_config(&at_limit).is_ok());

        let oversized = Config {
            cache: CacheConfig {
                duration_secs: u64::MAX,
            },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&oversized),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
