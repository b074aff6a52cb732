use crate::config::types::{Config, CrawlerConfig, CredentialEntry, OutputConfig};
use crate::crawler::MAX_LEAF_CEILING;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_credentials(&config.credentials)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_nodes < 1 {
        return Err(ConfigError::Validation(format!(
            "max-nodes must be >= 1, got {}",
            config.max_nodes
        )));
    }

    if config.max_leaves == 0 || config.max_leaves >= MAX_LEAF_CEILING {
        return Err(ConfigError::Validation(format!(
            "max-leaves must be between 1 and {}, got {}",
            MAX_LEAF_CEILING - 1,
            config.max_leaves
        )));
    }

    if config.starting_node.is_empty() {
        return Err(ConfigError::Validation(
            "starting-node cannot be empty".to_string(),
        ));
    }

    if let Some(filter) = &config.language_filter {
        if filter.is_empty() {
            return Err(ConfigError::Validation(
                "language-filter cannot be an empty string; omit it instead".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates credential entries
fn validate_credentials(credentials: &[CredentialEntry]) -> Result<(), ConfigError> {
    if credentials.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[credentials]] entry is required".to_string(),
        ));
    }

    for entry in credentials {
        if entry.id.is_empty() {
            return Err(ConfigError::Validation(
                "credential id cannot be empty".to_string(),
            ));
        }

        let fields = [
            ("api-key", &entry.api_key),
            ("api-secret", &entry.api_secret),
            ("access-token", &entry.access_token),
            ("access-secret", &entry.access_secret),
        ];
        for (name, value) in fields {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "credential '{}' has an empty {}",
                    entry.id, name
                )));
            }
        }
    }

    // Duplicate ids would make checkpoint restore ambiguous
    let mut ids: Vec<&str> = credentials.iter().map(|c| c.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != credentials.len() {
        return Err(ConfigError::Validation(
            "credential ids must be unique".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.edges_path.is_empty() {
        return Err(ConfigError::Validation(
            "edges-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
