//! Outbound HTTP plumbing for the upstream feeds.
//!
//! All four upstream endpoints authenticate with one shared API key passed
//! as a query parameter, so fetching goes through an [`HttpClient`] trait
//! with a [`UrlParam`] wrapper that appends the key to each request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::error::{PipelineError, Result};

/// A trait abstracting HTTP request execution.
///
/// The indirection keeps auth handling out of the workers and lets tests
/// substitute canned transports.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// Plain client with generous per-request limits; the realtime worker
/// applies its own shared deadline across parallel fetches on top.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");
        Self(client)
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}

/// An [`HttpClient`] wrapper that appends the upstream API key as a URL
/// query parameter before delegating to the inner client.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub key: String,
}

impl UrlParam<BasicClient> {
    /// Convenience constructor for the upstream's legacy `api_key` scheme.
    pub fn api_key(key: &str) -> Self {
        UrlParam {
            inner: BasicClient::new(),
            param_name: "api_key".to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for UrlParam<C> {
    async fn execute(&self, mut req: Request) -> reqwest::Result<Response> {
        req.url_mut()
            .query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
        self.inner.execute(req).await
    }
}

/// Fetches `url` and returns the response body.
///
/// Non-2xx statuses are transport errors: callers abort the current run
/// rather than decode an error page.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let parsed = url
        .parse()
        .map_err(|e| PipelineError::Transport(format!("invalid url {url}: {e}")))?;
    let req = Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}
