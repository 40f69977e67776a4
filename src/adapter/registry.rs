use super::cache::{CacheAdapter, CacheStore, HashMapCacheAdapter};
use super::message::{HttpMessageAdapter, MessageAdapter, SharedMessageAdapter};
use crate::error::ContractError;
use indexmap::IndexMap;
use std::any::{type_name, Any};
use std::sync::Arc;

struct RegisteredMessageAdapter {
    /// Holds a `SharedMessageAdapter<Req, Res>`
    adapter: Box<dyn Any + Send + Sync>,
    request_type: &'static str,
    response_type: &'static str,
}

type CacheWrapper = Box<dyn Fn(Box<dyn Any>) -> Option<Arc<dyn CacheStore>> + Send + Sync>;

struct RegisteredCacheAdapter {
    wrap: CacheWrapper,
    cache_type: &'static str,
}

/// Adapters selectable by name, e.g. from configuration.
///
/// Selection checks the capability up front: an unknown name, an adapter
/// for other message types, or a cache object the adapter cannot drive is
/// rejected with [`ContractError::InvalidAdapter`] before anything is
/// validated.
#[derive(Default)]
pub struct AdapterRegistry {
    messages: IndexMap<String, RegisteredMessageAdapter>,
    caches: IndexMap<String, RegisteredCacheAdapter>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the shipped adapters: `http` (`Vec<u8>` bodies),
    /// `http-string` (`String` bodies) and the `hashmap` cache adapter
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_message_adapter("http", HttpMessageAdapter::<Vec<u8>>::new());
        registry.register_message_adapter("http-string", HttpMessageAdapter::<String>::new());
        registry.register_cache_adapter("hashmap", HashMapCacheAdapter);
        registry
    }

    pub fn register_message_adapter<A>(&mut self, name: impl Into<String>, adapter: A)
    where
        A: MessageAdapter + 'static,
        A::Request: 'static,
        A::Response: 'static,
    {
        let shared: SharedMessageAdapter<A::Request, A::Response> = Arc::new(adapter);
        self.messages.insert(
            name.into(),
            RegisteredMessageAdapter {
                adapter: Box::new(shared),
                request_type: type_name::<A::Request>(),
                response_type: type_name::<A::Response>(),
            },
        );
    }

    pub fn register_cache_adapter<A>(&mut self, name: impl Into<String>, adapter: A)
    where
        A: CacheAdapter + Send + Sync + 'static,
        A::Cache: 'static,
    {
        let wrap: CacheWrapper = Box::new(move |cache: Box<dyn Any>| {
            cache
                .downcast::<A::Cache>()
                .ok()
                .map(|cache| adapter.wrap(*cache))
        });
        self.caches.insert(
            name.into(),
            RegisteredCacheAdapter {
                wrap,
                cache_type: type_name::<A::Cache>(),
            },
        );
    }

    /// Selects the message adapter registered under `name`, provided it
    /// adapts `Req`/`Res`
    pub fn message_adapter<Req: 'static, Res: 'static>(
        &self,
        name: &str,
    ) -> Result<SharedMessageAdapter<Req, Res>, ContractError> {
        let registered = self.messages.get(name).ok_or_else(|| {
            ContractError::invalid_adapter(name, "no message adapter is registered under this name")
        })?;

        registered
            .adapter
            .downcast_ref::<SharedMessageAdapter<Req, Res>>()
            .cloned()
            .ok_or_else(|| {
                ContractError::invalid_adapter(
                    name,
                    format!(
                        "adapts {} / {}, not {} / {}",
                        registered.request_type,
                        registered.response_type,
                        type_name::<Req>(),
                        type_name::<Res>()
                    ),
                )
            })
    }

    /// Wraps `cache` with the cache adapter registered under `name`
    pub fn wrap_cache(
        &self,
        name: &str,
        cache: Box<dyn Any>,
    ) -> Result<Arc<dyn CacheStore>, ContractError> {
        let registered = self.caches.get(name).ok_or_else(|| {
            ContractError::invalid_adapter(name, "no cache adapter is registered under this name")
        })?;

        (registered.wrap)(cache).ok_or_else(|| {
            ContractError::invalid_adapter(
                name,
                format!("can only wrap caches of type {}", registered.cache_type),
            )
        })
    }

    pub fn message_adapter_names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn cache_adapter_names(&self) -> impl Iterator<Item = &str> {
        self.caches.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SharedMap;

    type HttpRequest = http::Request<Vec<u8>>;
    type HttpResponse = http::Response<Vec<u8>>;

    #[test]
    fn selects_registered_message_adapter() {
        let registry = AdapterRegistry::with_defaults();
        let adapter = registry
            .message_adapter::<HttpRequest, HttpResponse>("http")
            .unwrap();

        let request = http::Request::get("/users/1").body(Vec::new()).unwrap();
        assert_eq!(adapter.adapt_request(&request).unwrap().uri, "/users/1");
    }

    #[test]
    fn unknown_message_adapter_is_rejected() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry
            .message_adapter::<HttpRequest, HttpResponse>("psr7")
            .err()
            .unwrap();

        match err {
            ContractError::InvalidAdapter { adapter, .. } => assert_eq!(adapter, "psr7"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn adapter_for_other_message_types_is_rejected() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry
            .message_adapter::<HttpRequest, HttpResponse>("http-string")
            .err()
            .unwrap();

        assert!(matches!(err, ContractError::InvalidAdapter { .. }));
        assert!(err.to_string().contains("http-string"));
    }

    #[test]
    fn cache_type_is_checked_at_selection() {
        let registry = AdapterRegistry::with_defaults();

        let store = registry
            .wrap_cache("hashmap", Box::new(SharedMap::default()))
            .unwrap();
        store.set("k", "v".into(), None);
        assert!(store.has("k"));

        let err = registry
            .wrap_cache("hashmap", Box::new(String::from("not a cache")))
            .err()
            .unwrap();
        assert!(matches!(err, ContractError::InvalidAdapter { .. }));

        let err = registry
            .wrap_cache("redis", Box::new(SharedMap::default()))
            .err()
            .unwrap();
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn lists_default_names() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(
            registry.message_adapter_names().collect::<Vec<_>>(),
            vec!["http", "http-string"]
        );
        assert_eq!(registry.cache_adapter_names().collect::<Vec<_>>(), vec!["hashmap"]);
    }
}
