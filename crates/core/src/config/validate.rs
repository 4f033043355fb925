use std::collections::HashSet;

use super::{Config, ConfigError};

/// Validate cross-field constraints the serde layer cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.search.workers == 0 {
        return Err(ConfigError::ValidationError(
            "search.workers must be at least 1".to_string(),
        ));
    }

    if config.search.crawl_concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "search.crawl_concurrency must be at least 1".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for entry in &config.sources {
        if entry.spec.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "source name must not be empty".to_string(),
            ));
        }
        if !names.insert(entry.spec.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate source name: {}",
                entry.spec.name
            )));
        }
        if entry.spec.max_pages == 0 {
            return Err(ConfigError::ValidationError(format!(
                "source {} max_pages must be at least 1",
                entry.spec.name
            )));
        }
    }

    Ok(())
}
