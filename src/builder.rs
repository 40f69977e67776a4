use crate::adapter::{
    AdapterRegistry, CacheAdapter, CacheStore, HttpMessageAdapter, MessageAdapter,
    SharedMessageAdapter,
};
use crate::config::{CacheConfig, ContractConfig};
use crate::definition::{DefaultSpecReader, Definition, SpecReader, Strategy};
use crate::error::ContractError;
use crate::schema::{LoadedSchema, SchemaCache};
use crate::validator::Validator;
use std::any::Any;
use std::sync::Arc;

/// Builds validators bound to one OpenAPI definition.
///
/// A builder starts empty, is bound to exactly one definition by
/// [`load`](Self::load), and can then hand out any number of validators
/// sharing the loaded schema. Adapters may be chosen at any point before
/// [`get_validator`](Self::get_validator).
///
/// ```no_run
/// use openapi_contract::{Definition, ValidatorBuilder};
///
/// # fn main() -> Result<(), openapi_contract::ContractError> {
/// let validator = ValidatorBuilder::new()
///     .load(Definition::yaml("tests/openapi.yaml"))?
///     .get_validator()?;
/// # Ok(())
/// # }
/// ```
pub struct ValidatorBuilder<M = HttpMessageAdapter> {
    reader: Arc<dyn SpecReader>,
    adapter: M,
    cache: Option<Arc<dyn CacheStore>>,
    cache_config: CacheConfig,
    schema: Option<Arc<LoadedSchema>>,
}

impl ValidatorBuilder {
    /// Builder using the default reader and the `http` crate adapter
    pub fn new() -> Self {
        Self::with_reader(Arc::new(DefaultSpecReader::default()))
    }

    /// Builder reading non-inline definitions through `reader`
    pub fn with_reader(reader: Arc<dyn SpecReader>) -> Self {
        Self {
            reader,
            adapter: HttpMessageAdapter::new(),
            cache: None,
            cache_config: CacheConfig::default(),
            schema: None,
        }
    }

    pub fn from_config(config: &ContractConfig) -> Self {
        Self::with_reader(Arc::new(DefaultSpecReader::new(config.reader.clone())))
            .set_cache_config(config.cache.clone())
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MessageAdapter> ValidatorBuilder<M> {
    /// Binds the builder to a definition, loading and compiling it.
    ///
    /// A builder is bound once; loading a second definition fails with
    /// [`ContractError::DefinitionAlreadyBound`].
    pub fn load(mut self, definition: Definition) -> Result<Self, ContractError> {
        if let Some(schema) = &self.schema {
            return Err(ContractError::DefinitionAlreadyBound(schema.strategy()));
        }

        let cache = self.cache.as_deref().map(|store| SchemaCache {
            store,
            config: &self.cache_config,
        });
        let schema = LoadedSchema::load(&definition, self.reader.as_ref(), cache)?;

        self.schema = Some(Arc::new(schema));
        Ok(self)
    }

    /// Uses `adapter` to read messages handed to the built validators
    pub fn set_message_adapter<N: MessageAdapter>(self, adapter: N) -> ValidatorBuilder<N> {
        ValidatorBuilder {
            reader: self.reader,
            adapter,
            cache: self.cache,
            cache_config: self.cache_config,
            schema: self.schema,
        }
    }

    /// Selects a message adapter by name; fails immediately when the name
    /// is unknown or the adapter does not read `Req`/`Res`
    pub fn set_message_adapter_named<Req: 'static, Res: 'static>(
        self,
        registry: &AdapterRegistry,
        name: &str,
    ) -> Result<ValidatorBuilder<SharedMessageAdapter<Req, Res>>, ContractError> {
        let adapter = registry.message_adapter::<Req, Res>(name)?;
        Ok(self.set_message_adapter(adapter))
    }

    /// Caches loaded definitions in `cache`, bridged by `adapter`
    pub fn set_cache_adapter<A: CacheAdapter>(self, adapter: &A, cache: A::Cache) -> Self {
        self.set_cache_store(adapter.wrap(cache))
    }

    /// Caches loaded definitions in `cache`, bridged by the adapter
    /// registered under `name`
    pub fn set_cache_adapter_named(
        self,
        registry: &AdapterRegistry,
        name: &str,
        cache: Box<dyn Any>,
    ) -> Result<Self, ContractError> {
        let store = registry.wrap_cache(name, cache)?;
        Ok(self.set_cache_store(store))
    }

    pub fn set_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        if self.schema.is_some() {
            tracing::debug!(
                "Cache attached after the definition was loaded, it applies to no schema"
            );
        }
        self.cache = Some(store);
        self
    }

    pub fn set_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Strategy the bound definition was loaded with
    pub fn strategy(&self) -> Option<Strategy> {
        self.schema.as_ref().map(|schema| schema.strategy())
    }

    pub fn is_bound(&self) -> bool {
        self.schema.is_some()
    }

    /// Builds a validator; every call returns an independent validator
    /// sharing the loaded schema
    pub fn get_validator(&self) -> Result<Validator<M>, ContractError>
    where
        M: Clone,
    {
        let schema = self.schema.as_ref().ok_or_else(|| {
            ContractError::IncompleteConfiguration(
                "no definition is loaded, call `load` first".to_string(),
            )
        })?;

        Ok(Validator::new(Arc::clone(schema), self.adapter.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{HashMapCacheAdapter, SharedMap};
    use crate::definition::Format;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    const DOC: &str = "openapi: 3.0.0\ninfo: {title: Users, version: '1'}\npaths: {}\n";

    #[derive(Default)]
    struct CountingReader {
        remote: AtomicUsize,
        files: AtomicUsize,
    }

    impl SpecReader for CountingReader {
        fn read_remote(&self, _url: &Url, _format: Format) -> Result<String, ContractError> {
            self.remote.fetch_add(1, Ordering::SeqCst);
            Ok(DOC.to_string())
        }

        fn read_local_file(&self, _path: &Path, _format: Format) -> Result<String, ContractError> {
            self.files.fetch_add(1, Ordering::SeqCst);
            Ok(DOC.to_string())
        }
    }

    #[test]
    fn get_validator_requires_a_definition() {
        let err = ValidatorBuilder::new().get_validator().err().unwrap();
        assert!(matches!(err, ContractError::IncompleteConfiguration(_)));
    }

    #[test]
    fn second_load_is_rejected() {
        let builder = ValidatorBuilder::new().load(Definition::yaml(DOC)).unwrap();
        let err = builder.load(Definition::yaml(DOC)).err().unwrap();
        assert!(matches!(
            err,
            ContractError::DefinitionAlreadyBound(Strategy::InlineYaml)
        ));
    }

    #[test]
    fn remote_definitions_go_through_injected_reader() {
        let reader = Arc::new(CountingReader::default());
        let builder = ValidatorBuilder::with_reader(reader.clone())
            .load(Definition::yaml("https://api.example.com/openapi.yaml"))
            .unwrap();

        assert_eq!(builder.strategy(), Some(Strategy::RemoteYaml));
        assert_eq!(reader.remote.load(Ordering::SeqCst), 1);
        assert_eq!(reader.files.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn validators_share_the_loaded_schema() {
        let builder = ValidatorBuilder::new().load(Definition::yaml(DOC)).unwrap();
        let first = builder.get_validator().unwrap();
        let second = builder.get_validator().unwrap();

        assert!(std::ptr::eq(first.schema(), second.schema()));
    }

    #[test]
    fn cached_definition_skips_the_reader() {
        let map = SharedMap::default();
        let reader = Arc::new(CountingReader::default());
        let url = "https://api.example.com/openapi.yaml";

        for _ in 0..2 {
            ValidatorBuilder::with_reader(reader.clone())
                .set_cache_adapter(&HashMapCacheAdapter, map.clone())
                .load(Definition::yaml(url))
                .unwrap();
        }

        assert_eq!(reader.remote.load(Ordering::SeqCst), 1);
        assert_eq!(map.lock().unwrap().len(), 1);
    }

    #[test]
    fn undecodable_cache_entry_is_replaced() {
        let map = SharedMap::default();
        let key = crate::schema::cache_key("openapi-contract", Strategy::InlineYaml, DOC);
        map.lock().unwrap().insert(key.clone(), "not json".to_string());

        ValidatorBuilder::new()
            .set_cache_adapter(&HashMapCacheAdapter, map.clone())
            .load(Definition::yaml(DOC))
            .unwrap();

        assert_ne!(map.lock().unwrap().get(&key).map(String::as_str), Some("not json"));
    }

    #[test]
    fn unknown_named_adapter_fails_before_loading() {
        let registry = AdapterRegistry::with_defaults();
        let err = ValidatorBuilder::new()
            .set_message_adapter_named::<http::Request<Vec<u8>>, http::Response<Vec<u8>>>(
                &registry, "laravel",
            )
            .err()
            .unwrap();

        assert!(matches!(err, ContractError::InvalidAdapter { .. }));
    }
}
