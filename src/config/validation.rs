use crate::config::types::{Config, HarvestConfig, OutputConfig, SourceConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_harvest_config(&config.harvest)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates source site configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use HTTPS scheme",
            config.base_url
        )));
    }

    if config.country.is_empty() {
        return Err(ConfigError::Validation(
            "country cannot be empty".to_string(),
        ));
    }

    if config.tiers.is_empty() {
        return Err(ConfigError::Validation(
            "tiers must list at least one tier".to_string(),
        ));
    }

    for tier in &config.tiers {
        if tier.is_empty() {
            return Err(ConfigError::Validation(
                "tiers cannot contain empty entries".to_string(),
            ));
        }
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate scraper name: non-empty, alphanumeric + hyphens only
    if config.scraper_name.is_empty() {
        return Err(ConfigError::Validation(
            "scraper_name cannot be empty".to_string(),
        ));
    }

    if !config
        .scraper_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "scraper_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.scraper_name
        )));
    }

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    // Validate contact email (basic validation)
    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates harvest run configuration
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.retry_backoff_days < 1 || config.retry_backoff_days > 30 {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_days must be between 1 and 30, got {}",
            config.retry_backoff_days
        )));
    }

    if config.request_pause_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_pause_ms must be >= 100ms, got {}ms",
            config.request_pause_ms
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_config() -> SourceConfig {
        SourceConfig {
            base_url: "https://tour.example.com".to_string(),
            country: "United States".to_string(),
            tiers: vec!["A".to_string(), "B".to_string()],
            proxy: None,
        }
    }

    #[test]
    fn test_validate_source_config() {
        assert!(validate_source_config(&source_config()).is_ok());

        let mut http = source_config();
        http.base_url = "http://tour.example.com".to_string();
        assert!(validate_source_config(&http).is_err());

        let mut no_tiers = source_config();
        no_tiers.tiers.clear();
        assert!(validate_source_config(&no_tiers).is_err());

        let mut bad_proxy = source_config();
        bad_proxy.proxy = Some("not a url".to_string());
        assert!(validate_source_config(&bad_proxy).is_err());
    }

    #[test]
    fn test_validate_harvest_config() {
        let ok = HarvestConfig {
            request_pause_ms: 2000,
            retry_backoff_days: 5,
        };
        assert!(validate_harvest_config(&ok).is_ok());

        let zero_backoff = HarvestConfig {
            request_pause_ms: 2000,
            retry_backoff_days: 0,
        };
        assert!(validate_harvest_config(&zero_backoff).is_err());

        let tiny_pause = HarvestConfig {
            request_pause_ms: 10,
            retry_backoff_days: 5,
        };
        assert!(validate_harvest_config(&tiny_pause).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }
}
