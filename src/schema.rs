use crate::adapter::CacheStore;
use crate::config::CacheConfig;
use crate::definition::{parse_definition, Definition, Source, SourceKind, SpecReader, Strategy};
use crate::engine::SchemaEngine;
use crate::error::ContractError;
use openapiv3::OpenAPI;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::path::Path;
use url::Url;

/// A parsed OpenAPI document together with its compiled engine.
///
/// Never mutated after construction; validators share it by `Arc`.
pub struct LoadedSchema {
    document: OpenAPI,
    engine: SchemaEngine,
    strategy: Strategy,
}

/// Cache a definition is looked up in before it is read
pub(crate) struct SchemaCache<'a> {
    pub store: &'a dyn CacheStore,
    pub config: &'a CacheConfig,
}

/// Key under which a definition's parsed document is cached
pub fn cache_key(prefix: &str, strategy: Strategy, reference: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    format!("{}:{}:{}", prefix, strategy, hex::encode(hasher.finalize()))
}

impl LoadedSchema {
    /// Compiles an already parsed document
    pub fn from_document(document: OpenAPI, strategy: Strategy) -> Result<Self, ContractError> {
        let engine = SchemaEngine::bind(&document)?;
        Ok(Self {
            document,
            engine,
            strategy,
        })
    }

    pub(crate) fn load(
        definition: &Definition,
        reader: &dyn SpecReader,
        cache: Option<SchemaCache<'_>>,
    ) -> Result<Self, ContractError> {
        let strategy = definition.strategy();
        let key = cache
            .as_ref()
            .map(|cache| cache_key(&cache.config.key_prefix, strategy, &definition.reference()));

        if let (Some(cache), Some(key)) = (&cache, &key) {
            if let Some(document) = cached_document(cache.store, key) {
                tracing::debug!(strategy = %strategy, key = %key, "Definition served from cache");
                return Self::from_document(document, strategy);
            }
        }

        let document = read_document(definition, strategy, reader)?;
        tracing::info!(
            strategy = %strategy,
            title = %document.info.title,
            version = %document.info.version,
            "Loaded OpenAPI definition"
        );

        if let (Some(cache), Some(key)) = (&cache, &key) {
            match serde_json::to_string(&document) {
                Ok(json) => cache.store.set(key, json, cache.config.ttl()),
                Err(e) => tracing::warn!(
                    key = %key,
                    error = %e,
                    "Failed to serialize definition for cache"
                ),
            }
        }

        Self::from_document(document, strategy)
    }

    pub fn document(&self) -> &OpenAPI {
        &self.document
    }

    pub fn engine(&self) -> &SchemaEngine {
        &self.engine
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

fn cached_document(store: &dyn CacheStore, key: &str) -> Option<OpenAPI> {
    if !store.has(key) {
        return None;
    }
    let cached = store.get(key)?;
    match serde_json::from_str(&cached) {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding undecodable cached definition");
            None
        }
    }
}

fn read_document(
    definition: &Definition,
    strategy: Strategy,
    reader: &dyn SpecReader,
) -> Result<OpenAPI, ContractError> {
    let format = strategy.format();
    let (text, origin): (Cow<'_, str>, String) = match &definition.source {
        Source::Url(url) => (Cow::Owned(reader.read_remote(url, format)?), url.to_string()),
        Source::File(path) => (
            Cow::Owned(reader.read_local_file(path, format)?),
            path.display().to_string(),
        ),
        Source::Text(text) => (Cow::Borrowed(text.as_str()), "inline definition".to_string()),
        Source::Auto(reference) => match strategy.kind() {
            SourceKind::Remote => {
                let url = Url::parse(reference)
                    .map_err(|e| ContractError::load(reference.as_str(), e))?;
                (Cow::Owned(reader.read_remote(&url, format)?), url.to_string())
            }
            SourceKind::File => (
                Cow::Owned(reader.read_local_file(Path::new(reference), format)?),
                reference.clone(),
            ),
            SourceKind::Inline => (
                Cow::Borrowed(reference.as_str()),
                "inline definition".to_string(),
            ),
        },
    };

    parse_definition(&text, format, &origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_depends_on_strategy_and_reference() {
        let a = cache_key("p", Strategy::InlineYaml, "openapi: 3.0.0");
        let b = cache_key("p", Strategy::InlineJson, "openapi: 3.0.0");
        let c = cache_key("p", Strategy::InlineYaml, "openapi: 3.0.1");

        assert!(a.starts_with("p:inline-yaml:"));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, cache_key("p", Strategy::InlineYaml, "openapi: 3.0.0"));
    }
}
