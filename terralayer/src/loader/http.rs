//! HTTP loader for remote tile and dataset files.

use std::time::Duration;

use bytes::Bytes;
use futures::future::FutureExt;
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::{LoadFuture, Loader};

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Terrarium/2.0";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Errors raised while fetching remote data.
///
/// These never cross the [`Loader`] boundary; they are logged and folded
/// into `None` by [`HttpLoader::load`].
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request could not be sent or timed out
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be read
    #[error("failed to read response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Loads the raw body behind a URL.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    /// Creates a loader with its own connection pool.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, LoaderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(LoaderError::ClientBuild)?;

        Ok(Self { client })
    }

    /// Creates a loader sharing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetches `url`, surfacing every failure as a [`LoaderError`].
    pub async fn fetch(&self, url: &str) -> Result<Bytes, LoaderError> {
        fetch(&self.client, url).await
    }
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<Bytes, LoaderError> {
    trace!(url = url, "HTTP GET request starting");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| LoaderError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoaderError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|source| LoaderError::Body {
        url: url.to_string(),
        source,
    })?;
    trace!(url = url, bytes = bytes.len(), "HTTP response body read");
    Ok(bytes)
}

impl Loader<String, Bytes> for HttpLoader {
    fn load(&self, url: String) -> LoadFuture<Bytes> {
        let client = self.client.clone();
        async move {
            match fetch(&client, &url).await {
                Ok(bytes) => Some(bytes),
                // Sparse datasets answer missing tiles with 404
                Err(LoaderError::Status { status: 404, .. }) => {
                    debug!(url = %url, "remote file not found");
                    None
                }
                Err(LoaderError::Request { url, source }) => {
                    warn!(
                        url = %url,
                        error = %source,
                        is_connect = source.is_connect(),
                        is_timeout = source.is_timeout(),
                        "HTTP request failed"
                    );
                    None
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to load remote file");
                    None
                }
            }
        }
        .boxed()
    }
}
