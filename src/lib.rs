//! Contract testing of HTTP exchanges against OpenAPI definitions.
//!
//! A [`ValidatorBuilder`] is bound to one definition (a URL, a file or the
//! document text, in YAML or JSON), then produces [`Validator`]s that check
//! request/response pairs. Framework message types are read through a
//! [`MessageAdapter`]; parsed definitions can be cached in any store reachable
//! through a [`CacheAdapter`].

pub mod adapter;
pub mod builder;
pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod schema;
pub mod validator;
pub mod violation;

pub use adapter::{
    AdapterRegistry, CacheAdapter, CacheStore, CanonicalRequest, CanonicalResponse,
    HashMapCacheAdapter, HttpMessageAdapter, MessageAdapter, SharedMap, SharedMessageAdapter,
};
pub use builder::ValidatorBuilder;
pub use config::{CacheConfig, ContractConfig, ReaderConfig};
pub use definition::{
    classify, DefaultSpecReader, Definition, Format, Source, SourceKind, SpecReader, Strategy,
};
pub use engine::SchemaEngine;
pub use error::ContractError;
pub use schema::LoadedSchema;
pub use validator::{ValidationResult, Validator};
pub use violation::{Location, Rule, Violation};
