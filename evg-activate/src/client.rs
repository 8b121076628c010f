#![doc = "Evergreen REST client: implements the core `EvergreenApi` contract over HTTP with retries."]
//
//! # Evergreen client (CLI <-> Core)
//!
//! This module bridges the [`EvergreenApi`] trait from `evg-activate-core` to
//! a real Evergreen deployment using `reqwest`.
//!
//! - `version_by_id`: `GET {host}/rest/v2/versions/{version_id}`
//! - `tasks_by_build`: `GET {host}/rest/v2/builds/{build_id}/tasks`, following
//!   `Link: <...>; rel="next"` pages
//! - `configure_task`: `PATCH {host}/rest/v2/tasks/{task_id}` with
//!   `{"activated": bool}`
//!
//! Credentials from [`EvergreenConfig`] are sent as `Api-User` / `Api-Key`
//! headers. Transport failures, 5xx and 429 responses are retried with
//! exponential backoff according to [`RetryConfig`]; any other failure is
//! returned immediately.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use evg_activate_core::contract::{EvergreenApi, Task, Version};
use evg_activate_core::error::EvergreenError;
use reqwest::header::{HeaderMap, HeaderValue, LINK};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::load_config::EvergreenConfig;

/// Retry policy for transient API failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): doubles each time, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// A successful response, fully read.
struct ApiResponse {
    headers: HeaderMap,
    body: Bytes,
}

pub struct EvergreenClient {
    client: Client,
    api_server_host: String,
    retry: RetryConfig,
}

impl EvergreenClient {
    pub fn new(config: &EvergreenConfig, retry: RetryConfig) -> Result<Self, EvergreenError> {
        let mut headers = HeaderMap::new();
        if let Some(user) = &config.user {
            let value = HeaderValue::from_str(user)
                .map_err(|e| EvergreenError::Config(format!("invalid user: {e}")))?;
            headers.insert("api-user", value);
        }
        if let Some(api_key) = &config.api_key {
            let mut value = HeaderValue::from_str(api_key)
                .map_err(|e| EvergreenError::Config(format!("invalid api_key: {e}")))?;
            value.set_sensitive(true);
            headers.insert("api-key", value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(format!("evg-activate/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| EvergreenError::Config(e.to_string()))?;

        tracing::info!(
            api_server_host = %config.api_server_host,
            authenticated = config.user.is_some() && config.api_key.is_some(),
            max_attempts = retry.max_attempts,
            "Initialized EvergreenClient"
        );

        Ok(Self {
            client,
            api_server_host: config.api_server_host.trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/v2/{}", self.api_server_host, path)
    }

    /// Send the request built by `build` and read its body, retrying transient
    /// failures. A body that breaks off mid-read counts as a transport failure.
    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<ApiResponse, EvergreenError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match build().send().await {
                Ok(resp) if resp.status().is_success() => {
                    let headers = resp.headers().clone();
                    match resp.bytes().await {
                        Ok(body) => return Ok(ApiResponse { headers, body }),
                        Err(e) => EvergreenError::Transport {
                            url: url.to_string(),
                            message: format!("failed to read response body: {e}"),
                        },
                    }
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let message = resp.text().await.unwrap_or_default();
                    EvergreenError::Http {
                        status,
                        url: url.to_string(),
                        message,
                    }
                }
                Err(e) if e.is_builder() => EvergreenError::Config(e.to_string()),
                Err(e) => EvergreenError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                },
            };

            if !err.is_transient() || attempt >= self.retry.max_attempts {
                tracing::error!(url, attempt, error = %err, "Evergreen API request failed");
                return Err(err);
            }

            let delay = self.retry.delay_for(attempt);
            tracing::warn!(
                url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient Evergreen API failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, EvergreenError> {
        serde_json::from_slice(body).map_err(|e| {
            tracing::error!(url, error = %e, "Failed to decode Evergreen response");
            EvergreenError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// Extract the `rel="next"` target from a `Link` header, if any.
pub fn next_page_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[async_trait]
impl EvergreenApi for EvergreenClient {
    async fn version_by_id(&self, version_id: &str) -> Result<Version, EvergreenError> {
        let url = self.url(&format!("versions/{version_id}"));
        tracing::debug!(version_id, url = %url, "Fetching version");
        let resp = self.send_with_retry(&url, || self.client.get(&url)).await?;
        let version: Version = Self::decode(&url, &resp.body)?;
        tracing::info!(
            version_id = %version.version_id,
            build_variants = version.build_variants_status.len(),
            "Fetched version"
        );
        Ok(version)
    }

    async fn tasks_by_build(&self, build_id: &str) -> Result<Vec<Task>, EvergreenError> {
        let mut tasks = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(self.url(&format!("builds/{build_id}/tasks")));

        while let Some(url) = next.take() {
            if !seen.insert(url.clone()) {
                tracing::error!(build_id, url = %url, "Pagination link points to a page already fetched");
                return Err(EvergreenError::Decode {
                    url,
                    message: "pagination link repeats an already fetched page".to_string(),
                });
            }
            tracing::debug!(build_id, url = %url, "Fetching tasks page");
            let resp = self.send_with_retry(&url, || self.client.get(&url)).await?;
            next = next_page_link(&resp.headers);
            let page: Vec<Task> = Self::decode(&url, &resp.body)?;
            tasks.extend(page);
        }
        let pages = seen.len();

        tracing::info!(build_id, task_count = tasks.len(), pages, "Fetched tasks for build");
        Ok(tasks)
    }

    async fn configure_task(&self, task_id: &str, activated: bool) -> Result<(), EvergreenError> {
        let url = self.url(&format!("tasks/{task_id}"));
        let body = serde_json::json!({ "activated": activated });
        tracing::debug!(task_id, activated, url = %url, "Configuring task");
        self.send_with_retry(&url, || self.client.patch(&url).json(&body))
            .await?;
        tracing::info!(task_id, activated, "Configured task");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_link(link: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(link).unwrap());
        headers
    }

    #[test]
    fn finds_next_link_among_several_relations() {
        let headers = headers_with_link(
            "<https://evg/rest/v2/builds/b1/tasks?start_at=t0>; rel=\"prev\", \
             <https://evg/rest/v2/builds/b1/tasks?start_at=t9&limit=100>; rel=\"next\"",
        );
        assert_eq!(
            next_page_link(&headers).as_deref(),
            Some("https://evg/rest/v2/builds/b1/tasks?start_at=t9&limit=100")
        );
    }

    #[test]
    fn no_link_header_means_last_page() {
        assert_eq!(next_page_link(&HeaderMap::new()), None);
        let headers = headers_with_link("<https://evg/rest/v2/builds/b1/tasks>; rel=\"prev\"");
        assert_eq!(next_page_link(&headers), None);
    }

    #[test]
    fn backoff_doubles_and_is_capped() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(1), Duration::from_secs(1));
        assert_eq!(retry.delay_for(2), Duration::from_secs(2));
        assert_eq!(retry.delay_for(3), Duration::from_secs(4));
        assert_eq!(retry.delay_for(10), Duration::from_secs(10));
        assert_eq!(RetryConfig::immediate(5).delay_for(4), Duration::ZERO);
    }
}
