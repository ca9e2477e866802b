//! Seam between the resource catalog and the transport core.

use async_trait::async_trait;
use quads_core::{ApiResponse, Endpoint, QuadsSession, Result};
use serde_json::Value;
use url::Url;

/// Anything that can carry catalog calls to a QUADS server.
///
/// [`QuadsSession`] is the production implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuadsTransport: Send + Sync {
    /// Send one request to `endpoint` and classify the response.
    async fn call(&self, endpoint: &Endpoint, body: Option<Value>) -> Result<ApiResponse>;

    /// Obtain a bearer token.
    async fn login(&self) -> Result<()>;

    /// Drop the bearer token.
    async fn logout(&self) -> Result<()>;

    /// Resolve a path against the base URL.
    fn url_for(&self, path: &str) -> Result<Url>;
}

#[async_trait]
impl QuadsTransport for QuadsSession {
    async fn call(&self, endpoint: &Endpoint, body: Option<Value>) -> Result<ApiResponse> {
        QuadsSession::call(self, endpoint, body.as_ref()).await
    }

    async fn login(&self) -> Result<()> {
        QuadsSession::login(self).await
    }

    async fn logout(&self) -> Result<()> {
        QuadsSession::logout(self).await
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        QuadsSession::url_for(self, path)
    }
}
