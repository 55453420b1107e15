//! SecurityConfig struct definition, strict default and development preset.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits and URL policy for the trust boundary.
///
/// Unknown fields in YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    // =========================================================================
    // URL policy
    // =========================================================================
    /// Permit `http` schema URLs (never any other non-https scheme).
    #[serde(default)]
    pub allow_http: bool,

    /// Reject localhost and loopback hosts.
    #[serde(default = "default_true")]
    pub block_localhost: bool,

    /// Reject private, link-local and unique-local address ranges.
    #[serde(default = "default_true")]
    pub block_private_networks: bool,

    /// When set, schema hosts must equal or be a subdomain of an entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_allowlist: Option<Vec<String>>,

    // =========================================================================
    // Template limits
    // =========================================================================
    /// Maximum serialized template size in bytes.
    #[serde(default = "default_max_template_size")]
    pub max_template_size: usize,

    /// Maximum number of content elements, nested elements included.
    #[serde(default = "default_max_content_elements")]
    pub max_content_elements: usize,

    /// Maximum conditional nesting depth, also the variable tree depth bound.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Maximum condition length in characters.
    #[serde(default = "default_max_expression_length")]
    pub max_expression_length: usize,

    /// Maximum entries per array level in the variable tree.
    #[serde(default = "default_max_array_length")]
    pub max_array_length: usize,

    // =========================================================================
    // Schema fetching
    // =========================================================================
    /// Maximum schema response body in bytes.
    #[serde(default = "default_max_schema_size")]
    pub max_schema_size: usize,

    /// Hard timeout for a single schema request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allow_http: false,
            block_localhost: default_true(),
            block_private_networks: default_true(),
            domain_allowlist: None,
            max_template_size: default_max_template_size(),
            max_content_elements: default_max_content_elements(),
            max_nesting_depth: default_max_nesting_depth(),
            max_expression_length: default_max_expression_length(),
            max_array_length: default_max_array_length(),
            max_schema_size: default_max_schema_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SecurityConfig {
    /// Permissive preset for local development.
    ///
    /// Allows plain HTTP and local/private hosts so schemas can be served
    /// from a developer machine. Template limits stay the same.
    pub fn development() -> Self {
        Self {
            allow_http: true,
            block_localhost: false,
            block_private_networks: false,
            request_timeout_secs: DEVELOPMENT_REQUEST_TIMEOUT_SECS,
            ..Self::default()
        }
    }

    /// The schema request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
