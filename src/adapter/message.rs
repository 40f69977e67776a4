use super::{CanonicalRequest, CanonicalResponse};
use crate::error::ContractError;
use http::HeaderMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Converts framework-specific HTTP messages into canonical form.
///
/// Implement this for whatever request/response types the web framework
/// under test produces. Conformance is checked by the compiler wherever an
/// adapter is handed over as a value; [`AdapterRegistry`](super::AdapterRegistry)
/// performs the same check at selection time for adapters chosen by name.
pub trait MessageAdapter: Send + Sync {
    type Request;
    type Response;

    fn adapt_request(&self, request: &Self::Request) -> Result<CanonicalRequest, ContractError>;

    fn adapt_response(&self, response: &Self::Response) -> Result<CanonicalResponse, ContractError>;
}

/// Type-erased adapter, as returned by name-based selection
pub type SharedMessageAdapter<Req, Res> = Arc<dyn MessageAdapter<Request = Req, Response = Res>>;

impl<Req, Res> MessageAdapter for Arc<dyn MessageAdapter<Request = Req, Response = Res>> {
    type Request = Req;
    type Response = Res;

    fn adapt_request(&self, request: &Req) -> Result<CanonicalRequest, ContractError> {
        (**self).adapt_request(request)
    }

    fn adapt_response(&self, response: &Res) -> Result<CanonicalResponse, ContractError> {
        (**self).adapt_response(response)
    }
}

/// Adapter for the `http` crate's `Request<B>` and `Response<B>`, the types
/// shared by hyper, axum, reqwest and most of the ecosystem
pub struct HttpMessageAdapter<B = Vec<u8>> {
    _body: PhantomData<fn() -> B>,
}

impl<B> HttpMessageAdapter<B> {
    pub fn new() -> Self {
        Self { _body: PhantomData }
    }
}

impl<B> Default for HttpMessageAdapter<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for HttpMessageAdapter<B> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<B> fmt::Debug for HttpMessageAdapter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMessageAdapter").finish()
    }
}

fn canonical_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

impl<B: AsRef<[u8]>> MessageAdapter for HttpMessageAdapter<B> {
    type Request = http::Request<B>;
    type Response = http::Response<B>;

    fn adapt_request(&self, request: &http::Request<B>) -> Result<CanonicalRequest, ContractError> {
        Ok(CanonicalRequest {
            method: request.method().as_str().to_string(),
            uri: request.uri().to_string(),
            headers: canonical_headers(request.headers()),
            body: request.body().as_ref().to_vec(),
        })
    }

    fn adapt_response(
        &self,
        response: &http::Response<B>,
    ) -> Result<CanonicalResponse, ContractError> {
        Ok(CanonicalResponse {
            status: response.status().as_u16(),
            headers: canonical_headers(response.headers()),
            body: response.body().as_ref().to_vec(),
        })
    }
}
