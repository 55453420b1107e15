//! Schema transport.

use crate::config::SecurityConfig;
use crate::error::{ItsError, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::io::Read;
use url::Url;

/// Retrieves a schema body for an already-validated URL.
///
/// Implementations perform a single attempt; failures surface immediately.
pub trait SchemaFetcher: Send + Sync + std::fmt::Debug {
    fn fetch(&self, url: &Url) -> Result<Value>;
}

/// Fetches schemas over HTTP(S) with a hard timeout and a body size cap.
#[derive(Debug, Clone)]
pub struct HttpSchemaFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpSchemaFetcher {
    /// Create a fetcher honoring the config's timeout and schema size cap.
    ///
    /// Redirects are not followed: a redirect target would bypass URL
    /// validation.
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .redirect(Policy::none())
            .build()
            .map_err(|e| ItsError::UserError(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_schema_size,
        })
    }
}

impl SchemaFetcher for HttpSchemaFetcher {
    fn fetch(&self, url: &Url) -> Result<Value> {
        let fail = |reason: String| ItsError::schema_load(url.as_str(), reason);

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| fail(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("server responded with HTTP {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !is_acceptable_content_type(&content_type) {
            return Err(fail(format!(
                "unsupported content type '{}'",
                content_type
            )));
        }

        let limit = self.max_body_bytes;
        if let Some(declared) = response.content_length() {
            if declared > limit as u64 {
                return Err(fail(format!(
                    "schema is {} bytes, maximum is {} bytes",
                    declared, limit
                )));
            }
        }

        // Servers can lie about or omit Content-Length; cap the actual read.
        let mut body = Vec::new();
        response
            .take(limit as u64 + 1)
            .read_to_end(&mut body)
            .map_err(|e| fail(format!("failed to read response: {}", e)))?;
        if body.len() > limit {
            return Err(fail(format!("schema exceeds maximum of {} bytes", limit)));
        }

        serde_json::from_slice(&body).map_err(|e| fail(format!("invalid JSON: {}", e)))
    }
}

/// JSON or plain-text content types. A missing type is rejected.
fn is_acceptable_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence == "application/json" || essence.ends_with("+json") || essence.starts_with("text/")
}
