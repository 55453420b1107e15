//! Schema loading: URL resolution, validation, cache and fetch.

use super::cache::{CacheStats, SchemaCache};
use super::document::SchemaDocument;
use super::fetcher::{HttpSchemaFetcher, SchemaFetcher};
use crate::config::SecurityConfig;
use crate::error::Result;
use crate::security::{DenyList, resolve_url, validate_url};
use std::sync::Arc;
use tracing::{debug, warn};

/// Loads instruction-type schemas through a shared [`SchemaCache`].
#[derive(Debug, Clone)]
pub struct SchemaLoader {
    cache: Arc<SchemaCache>,
    fetcher: Arc<dyn SchemaFetcher>,
    config: SecurityConfig,
    template_patterns: Arc<DenyList>,
}

impl SchemaLoader {
    /// A loader using the HTTP fetcher.
    pub fn new(config: SecurityConfig, cache: Arc<SchemaCache>) -> Result<Self> {
        let fetcher = HttpSchemaFetcher::new(&config)?;
        Self::with_fetcher(config, cache, Arc::new(fetcher))
    }

    pub fn with_fetcher(
        config: SecurityConfig,
        cache: Arc<SchemaCache>,
        fetcher: Arc<dyn SchemaFetcher>,
    ) -> Result<Self> {
        Ok(Self {
            cache,
            fetcher,
            config,
            template_patterns: Arc::new(DenyList::for_text()?),
        })
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Load one schema.
    ///
    /// A relative `url` is resolved against `base_url` first; if that fails
    /// the raw string is used. Either way the result must pass URL
    /// validation before the cache or network is consulted.
    pub fn load_schema(&self, url: &str, base_url: Option<&str>) -> Result<Arc<SchemaDocument>> {
        let resolved = resolve_url(url, base_url);
        let validated = validate_url(&resolved, &self.config)?;
        let key = validated.as_str();

        if let Some(schema) = self.cache.get(key) {
            return Ok(schema);
        }

        debug!(url = key, "fetching schema");
        self.cache.record_fetch();
        let body = self.fetcher.fetch(&validated)?;
        let schema = SchemaDocument::from_value(key, body)?;
        self.warn_on_suspicious_templates(&schema);

        let schema = Arc::new(schema);
        self.cache.insert(key, Arc::clone(&schema));
        Ok(schema)
    }

    /// Load every URL in order.
    pub fn load_all(
        &self,
        urls: &[String],
        base_url: Option<&str>,
    ) -> Result<Vec<Arc<SchemaDocument>>> {
        urls.iter()
            .map(|url| self.load_schema(url, base_url))
            .collect()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Schema sources are semi-trusted: suspicious template text is logged
    /// but still loaded.
    fn warn_on_suspicious_templates(&self, schema: &SchemaDocument) {
        for (name, spec) in &schema.instruction_types {
            if let Some(pattern) = self.template_patterns.find_match(&spec.template) {
                warn!(
                    url = %schema.url,
                    instruction_type = %name,
                    pattern,
                    "schema template matches a blocked pattern"
                );
            }
        }
    }
}
