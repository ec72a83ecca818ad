//! Repology HTTP transport.
//!
//! Fetches `GET <endpoint><project>` and decodes the JSON array of package records the
//! Repology project API returns. Transient failures (connection errors, timeouts,
//! `429` and `5xx` responses) are retried with exponential backoff; everything else
//! fails on the first attempt.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

use super::{VersionLookup, VersionRecord};
use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS, USER_AGENT};

/// [`VersionLookup`] backed by the Repology project API.
#[derive(Debug, Clone)]
pub struct RepologyClient {
    client: reqwest::Client,
    endpoint: String,
    retries: usize,
}

#[derive(Debug)]
enum FetchError {
    Transient(anyhow::Error),
    Permanent(anyhow::Error),
}

impl FetchError {
    const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    fn into_inner(self) -> anyhow::Error {
        match self {
            Self::Transient(e) | Self::Permanent(e) => e,
        }
    }
}

impl RepologyClient {
    /// Build a client for `endpoint` with a per-request `timeout` and `retries` extra
    /// attempts for transient failures.
    pub fn new(endpoint: impl Into<String>, timeout: Duration, retries: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }

        Ok(Self {
            client,
            endpoint,
            retries,
        })
    }

    /// URL queried for `project`.
    #[must_use]
    pub fn project_url(&self, project: &str) -> String {
        format!("{}{}", self.endpoint, project)
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<Vec<VersionRecord>, FetchError> {
        debug!(target: "version", "GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            let transient = e.is_timeout() || e.is_connect() || e.is_request();
            let err = anyhow!(e).context(format!("Request to {url} failed"));
            if transient { FetchError::Transient(err) } else { FetchError::Permanent(err) }
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = anyhow!("HTTP {status} from {url}");
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                FetchError::Transient(err)
            } else {
                FetchError::Permanent(err)
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transient(anyhow!(e).context("Failed to read response body")))?;

        parse_records(&body).map_err(FetchError::Permanent)
    }
}

/// Decode a Repology project response body.
pub fn parse_records(body: &str) -> Result<Vec<VersionRecord>> {
    serde_json::from_str(body).context("Invalid response from repology: expected a list of package records")
}

impl VersionLookup for RepologyClient {
    async fn lookup(&self, project: &str) -> Result<Vec<VersionRecord>> {
        let url = self.project_url(project);
        let strategy = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .take(self.retries);

        RetryIf::spawn(
            strategy,
            || self.fetch_once(&url),
            |e: &FetchError| {
                if e.is_transient() {
                    warn!(target: "version", "Transient lookup failure for '{}', retrying", project);
                }
                e.is_transient()
            },
        )
        .await
        .map_err(FetchError::into_inner)
    }
}
