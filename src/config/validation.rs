use crate::config::types::{AnonymizerConfig, Config, CrawlerConfig, IdentityConfig};
use crate::ConfigError;
use reqwest::header::HeaderValue;
use url::Url;

/// Proxy schemes reqwest can route both http and https traffic through
const PROXY_SCHEMES: &[&str] = &["socks5", "socks5h", "http", "https"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_anonymizer_config(&config.anonymizer)?;
    validate_identity_config(&config.identity)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates crawl loop configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // delay_seconds == 0 is allowed: it disables pacing

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.rotate_every == Some(0) {
        return Err(ConfigError::Validation(
            "rotate_every must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy and control port configuration
fn validate_anonymizer_config(config: &AnonymizerConfig) -> Result<(), ConfigError> {
    let proxy = Url::parse(&config.proxy_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy_endpoint: {}", e)))?;

    if !PROXY_SCHEMES.contains(&proxy.scheme()) {
        return Err(ConfigError::Validation(format!(
            "proxy_endpoint scheme must be one of {:?}, got '{}'",
            PROXY_SCHEMES,
            proxy.scheme()
        )));
    }

    if proxy.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "proxy_endpoint '{}' has no host",
            config.proxy_endpoint
        )));
    }

    if config.control_host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "control_host cannot be empty".to_string(),
        ));
    }

    if config.control_port == 0 {
        return Err(ConfigError::Validation(
            "control_port must be between 1 and 65535".to_string(),
        ));
    }

    if config.control_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "control_timeout must be >= 1s, got {}s",
            config.control_timeout
        )));
    }

    if let Some(credential) = &config.credential {
        if credential.contains(['\r', '\n']) {
            return Err(ConfigError::Validation(
                "credential cannot contain line breaks".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the user agent pool
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.pool.is_empty() {
        return Err(ConfigError::Validation(
            "identity pool must contain at least one user agent".to_string(),
        ));
    }

    for agent in &config.pool {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "identity pool entries cannot be blank".to_string(),
            ));
        }

        if HeaderValue::from_str(agent).is_err() {
            return Err(ConfigError::Validation(format!(
                "identity pool entry '{}' is not a valid header value",
                agent.escape_debug()
            )));
        }
    }

    Ok(())
}

/// Validates crawl targets
fn validate_targets(targets: &[String]) -> Result<(), ConfigError> {
    for target in targets {
        validate_target(target)?;
    }
    Ok(())
}

/// Validates a single target locator; only http(s) pages can be crawled
pub(crate) fn validate_target(target: &str) -> Result<(), ConfigError> {
    let url = Url::parse(target)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid target '{}': {}", target, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Target '{}' must use http or https",
            target
        )));
    }

    Ok(())
}
