// Shared HTTP plumbing for the source backends.
//
// A thin reqwest wrapper with a generic JSON GET helper. Each backend builds
// one with its own base URL and auth headers. Every request carries the
// configured timeout so a hung connection surfaces as a transient error
// instead of stalling the run.

use std::time::Duration;

use anyhow::Context;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// A failed request to the post source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    /// The response body wasn't the JSON we expected.
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Whether a single retry has a chance of succeeding.
    ///
    /// Timeouts, connection failures, rate limiting (429) and server errors
    /// (5xx) are transient. Auth failures, bad requests and decode errors are
    /// not. Retrying them just burns quota.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            FetchError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            FetchError::Decode { .. } => false,
        }
    }
}

/// JSON-over-HTTP client bound to one API host.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url`, sending `headers` with every request.
    pub fn new(base_url: &str, headers: HeaderMap, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("trendwatch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `path` with query `params` and deserialize the JSON response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        debug!(path = path, "GET request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                endpoint: path.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                endpoint: path.to_string(),
                status,
                body,
            });
        }

        response.json::<T>().await.map_err(|source| FetchError::Decode {
            endpoint: path.to_string(),
            source,
        })
    }
}
