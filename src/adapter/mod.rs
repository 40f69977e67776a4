//! Bridges between caller-owned objects and the shapes the engine consumes.

pub mod cache;
pub mod message;
pub mod registry;

pub use cache::{CacheAdapter, CacheStore, HashMapCacheAdapter, SharedMap};
pub use message::{HttpMessageAdapter, MessageAdapter, SharedMessageAdapter};
pub use registry::AdapterRegistry;

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Framework-independent view of an HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub method: String,
    /// Origin-form (`/users/1?x=y`) or absolute URI
    pub uri: String,
    /// Headers in the order they were received
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CanonicalRequest {
    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Framework-independent view of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CanonicalResponse {
    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}
