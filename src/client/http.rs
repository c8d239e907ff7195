// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP client implementation for the Databricks SQL API.
//!
//! This module provides a low-level HTTP client with:
//! - Connection pooling
//! - Automatic retry with exponential backoff
//! - Bearer token header injection
//! - Configurable timeouts

use crate::error::{CatalogErrorHelper, Result};
use reqwest::{Client, Request, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Read timeout duration.
    pub read_timeout: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retry attempts (doubles each retry).
    pub retry_delay: Duration,
    /// Maximum number of idle connections per host.
    pub max_connections_per_host: usize,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            max_retries: 5,
            retry_delay: Duration::from_millis(1500),
            max_connections_per_host: 16,
            user_agent: format!("warehouse-metadata/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client for communicating with Databricks SQL endpoints.
///
/// The access token is supplied by the caller and sent verbatim as a bearer
/// token; it is never refreshed.
pub struct DatabricksHttpClient {
    client: Client,
    config: HttpClientConfig,
    access_token: String,
}

impl std::fmt::Debug for DatabricksHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabricksHttpClient")
            .field("config", &self.config)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl DatabricksHttpClient {
    /// Creates a new HTTP client with the given configuration and token.
    pub fn new(config: HttpClientConfig, access_token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .pool_max_idle_per_host(config.max_connections_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                CatalogErrorHelper::io().message(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            access_token: access_token.into(),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Returns the underlying reqwest client for building requests.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the authorization header value.
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Execute an HTTP request with automatic retry logic.
    ///
    /// Retries are performed for:
    /// - Connect and timeout errors
    /// - 429 Too Many Requests
    /// - 502 Bad Gateway
    /// - 503 Service Unavailable
    /// - 504 Gateway Timeout
    ///
    /// Non-retryable errors are returned immediately.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut attempts = 0;
        let mut last_error: Option<String> = None;

        let method = request.method().clone();
        let url = request.url().clone();
        let headers = request.headers().clone();
        let body_bytes = request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|b| b.to_vec());

        loop {
            attempts += 1;

            let mut req_builder = self
                .client
                .request(method.clone(), url.clone())
                .headers(headers.clone())
                .header("Authorization", self.auth_header());
            if let Some(ref body) = body_bytes {
                req_builder = req_builder.body(body.clone());
            }

            let request = req_builder.build().map_err(|e| {
                CatalogErrorHelper::io().message(format!("Failed to build request: {}", e))
            })?;

            debug!(
                "Executing {} {} (attempt {}/{})",
                method,
                url,
                attempts,
                self.config.max_retries + 1
            );

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response);
                    }

                    if Self::is_retryable_status(status) && attempts <= self.config.max_retries {
                        last_error = Some(format!("HTTP {}", status.as_u16()));
                        warn!(
                            "Request failed with {} (attempt {}/{}), retrying...",
                            status,
                            attempts,
                            self.config.max_retries + 1
                        );
                        self.wait_for_retry(attempts).await;
                        continue;
                    }

                    let error_body = response.text().await.unwrap_or_default();
                    return Err(CatalogErrorHelper::io().message(format!(
                        "HTTP {} - {}",
                        status.as_u16(),
                        error_body
                    )));
                }
                Err(e) => {
                    if Self::is_retryable_error(&e) && attempts <= self.config.max_retries {
                        last_error = Some(e.to_string());
                        warn!(
                            "Request failed with error (attempt {}/{}): {}, retrying...",
                            attempts,
                            self.config.max_retries + 1,
                            e
                        );
                        self.wait_for_retry(attempts).await;
                        continue;
                    }

                    return Err(CatalogErrorHelper::io().message(format!(
                        "HTTP request failed after {} attempts: {}",
                        attempts,
                        last_error.unwrap_or_else(|| e.to_string())
                    )));
                }
            }
        }
    }

    /// Check if the HTTP status code indicates a retryable error.
    fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
                | StatusCode::BAD_GATEWAY
        )
    }

    /// Check if the request error is retryable.
    fn is_retryable_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }

    /// Delay before retry `attempt`, doubling from the configured base.
    fn retry_delay_for(&self, attempt: u32) -> Duration {
        self.config.retry_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    async fn wait_for_retry(&self, attempt: u32) {
        let delay = self.retry_delay_for(attempt);
        debug!("Waiting {:?} before retry", delay);
        sleep(delay).await;
    }
}
