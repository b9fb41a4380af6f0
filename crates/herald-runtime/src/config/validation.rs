//! Checks run on the merged configuration before it is used.

use super::error::{ConfigError, ConfigResult};
use super::schema::{HeraldConfig, LogOutput, LoggingConfig};

pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_prefix(&config.prefix)?;
    validate_aliases(config)?;
    validate_logging(&config.logging)?;

    if config.permissions_file.as_os_str().is_empty() {
        return Err(ConfigError::MissingSetting("permissions_file"));
    }

    Ok(())
}

fn validate_prefix(prefix: &str) -> ConfigResult<()> {
    if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

fn validate_aliases(config: &HeraldConfig) -> ConfigResult<()> {
    for (alias, target) in &config.aliases {
        if alias.trim().is_empty() {
            return Err(ConfigError::invalid_alias(alias, "alias text is blank"));
        }
        if target.trim().is_empty() {
            return Err(ConfigError::invalid_alias(alias, "target route is blank"));
        }

        let alias_tokens: Vec<_> = alias.split_whitespace().collect();
        let target_tokens: Vec<_> = target.split_whitespace().collect();
        if alias_tokens == target_tokens {
            return Err(ConfigError::invalid_alias(alias, "alias points at itself"));
        }
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::MissingSetting("logging.file_path"));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::InvalidLogFilter(module.clone()));
    }

    Ok(())
}
