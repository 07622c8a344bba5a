use super::{types::Config, ConfigError};
use crate::fetcher::site_root;

/// Validate configuration
/// Currently validates:
/// - Site base URL parses and uses http or https
/// - Request timeout is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let url = site_root(&config.site.base_url)
        .map_err(|e| ConfigError::ValidationError(format!("site.base_url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError(format!(
            "site.base_url must be http or https, got {}",
            url.scheme()
        )));
    }

    if config.site.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "site.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
