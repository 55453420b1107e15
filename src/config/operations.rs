//! Config loading, validation, and serialization.

use super::model::SecurityConfig;
use crate::error::{ItsError, Result};
use std::path::Path;

impl SecurityConfig {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(SecurityConfig)` - Successfully loaded and validated config
    /// * `Err(ItsError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ItsError::UserError(format!(
                "failed to read security config '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string. Missing fields take strict defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SecurityConfig = serde_yaml::from_str(yaml).map_err(|e| {
            ItsError::UserError(format!("failed to parse security config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            ItsError::UserError(format!("failed to serialize security config: {}", e))
        })
    }

    /// Validate config values.
    ///
    /// Every limit must be positive, and allow-list entries must be bare,
    /// non-empty host names.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("max_template_size", self.max_template_size as u64),
            ("max_content_elements", self.max_content_elements as u64),
            ("max_nesting_depth", self.max_nesting_depth as u64),
            ("max_expression_length", self.max_expression_length as u64),
            ("max_array_length", self.max_array_length as u64),
            ("max_schema_size", self.max_schema_size as u64),
            ("request_timeout_secs", self.request_timeout_secs),
        ];

        for (name, value) in limits {
            if value == 0 {
                return Err(ItsError::UserError(format!(
                    "security config validation failed: {} must be greater than 0",
                    name
                )));
            }
        }

        if let Some(allowlist) = &self.domain_allowlist {
            for domain in allowlist {
                if domain.trim().is_empty() {
                    return Err(ItsError::UserError(
                        "security config validation failed: domain_allowlist entries must be non-empty"
                            .to_string(),
                    ));
                }
                if domain.contains("://") || domain.contains('/') {
                    return Err(ItsError::UserError(format!(
                        "security config validation failed: domain_allowlist entries must be host names, not URLs (found '{}')",
                        domain
                    )));
                }
            }
        }

        Ok(())
    }

    /// Allow-list entries normalized to lowercase without a leading dot.
    pub fn normalized_allowlist(&self) -> Option<Vec<String>> {
        self.domain_allowlist.as_ref().map(|domains| {
            domains
                .iter()
                .map(|d| d.trim().trim_start_matches('.').to_lowercase())
                .collect()
        })
    }
}
