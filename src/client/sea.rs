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

//! SEA (Statement Execution API) client implementation.
//!
//! This module implements the `DatabricksClient` trait using the Databricks
//! SQL Statement Execution API (REST-based).

use crate::client::{
    DatabricksClient, DatabricksClientConfig, DatabricksHttpClient, ExecuteResponse, SessionInfo,
};
use crate::error::{CatalogErrorHelper, Error, Result};
use crate::types::sea::{
    CreateSessionRequest, CreateSessionResponse, ExecuteParams, ExecuteStatementRequest,
    ResultData, StatementExecutionResponse, StatementState, StatementStatus,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Error codes and message fragments the warehouse uses for a missing table.
const TABLE_NOT_FOUND_MARKERS: &[&str] = &["TABLE_OR_VIEW_NOT_FOUND", "Table or view not found"];

/// SEA client for the Databricks SQL Statement Execution API.
#[derive(Debug)]
pub struct SeaClient {
    http_client: Arc<DatabricksHttpClient>,
    host: String,
    warehouse_id: String,
    config: DatabricksClientConfig,
}

impl SeaClient {
    /// Create a new SEA client.
    pub fn new(
        http_client: Arc<DatabricksHttpClient>,
        host: impl Into<String>,
        warehouse_id: impl Into<String>,
        config: DatabricksClientConfig,
    ) -> Self {
        Self {
            http_client,
            host: host.into(),
            warehouse_id: warehouse_id.into(),
            config,
        }
    }

    /// Build the base URL for API requests.
    fn base_url(&self) -> String {
        format!("{}/api/2.0/sql", self.host.trim_end_matches('/'))
    }

    /// Send a request and deserialize its JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let request = request.build().map_err(|e| {
            CatalogErrorHelper::io().message(format!("Failed to build request: {}", e))
        })?;

        let response = self.http_client.execute(request).await?;
        let body = response.text().await.map_err(|e| {
            CatalogErrorHelper::io().message(format!("Failed to read response: {}", e))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            CatalogErrorHelper::io().message(format!(
                "Failed to parse {} response: {} - body: {}",
                what, e, body
            ))
        })
    }

    /// Send a request whose response body is irrelevant, logging failures.
    async fn send_best_effort(&self, method: Method, url: &str) {
        let request = match self.http_client.inner().request(method, url).build() {
            Ok(request) => request,
            Err(e) => {
                warn!("Failed to build cleanup request for {}: {}", url, e);
                return;
            }
        };
        if let Err(e) = self.http_client.execute(request).await {
            warn!("Cleanup request {} failed: {}", url, e);
        }
    }

    /// Map a FAILED status to an error, recognizing missing tables.
    fn statement_failure(status: &StatementStatus) -> Error {
        let error = status.error.as_ref();
        let code = error.and_then(|e| e.error_code.as_deref()).unwrap_or("");
        let message = error
            .and_then(|e| e.message.as_deref())
            .unwrap_or("Unknown error");

        let not_found = TABLE_NOT_FOUND_MARKERS
            .iter()
            .any(|marker| code.contains(marker) || message.contains(marker));
        if not_found {
            CatalogErrorHelper::not_found().message(message.to_string())
        } else {
            CatalogErrorHelper::io().message(format!("Statement failed: {}", message))
        }
    }

    /// Poll for statement status.
    async fn get_statement_status(&self, statement_id: &str) -> Result<ExecuteResponse> {
        let url = format!("{}/statements/{}", self.base_url(), statement_id);

        debug!("Getting statement status at {}", url);

        let sea_response: StatementExecutionResponse = self
            .send_json(self.http_client.inner().request(Method::GET, &url), "status")
            .await?;

        debug!(
            "Status response: statement_id={}, status={:?}",
            sea_response.statement_id, sea_response.status.state
        );

        Ok(Self::convert_response(sea_response))
    }

    /// Wait for statement to complete, polling status.
    ///
    /// On timeout the statement is canceled before the error is returned.
    async fn wait_for_completion(&self, response: ExecuteResponse) -> Result<ExecuteResponse> {
        let start = std::time::Instant::now();
        let mut current_response = response;

        loop {
            match current_response.status.state {
                StatementState::Succeeded => return Ok(current_response),
                StatementState::Failed => {
                    return Err(Self::statement_failure(&current_response.status));
                }
                StatementState::Canceled => {
                    return Err(CatalogErrorHelper::io().message("Statement was canceled"));
                }
                StatementState::Closed => {
                    // Inline results may arrive with the statement already closed.
                    if current_response.result.is_some() {
                        debug!("Statement closed with inline result data - treating as success");
                        return Ok(current_response);
                    }
                    return Err(CatalogErrorHelper::io().message("Statement was closed"));
                }
                StatementState::Pending | StatementState::Running => {
                    if start.elapsed() > self.config.poll_timeout {
                        if let Err(e) = self.cancel_statement(&current_response.statement_id).await {
                            warn!(
                                "Failed to cancel statement {}: {}",
                                current_response.statement_id, e
                            );
                        }
                        return Err(CatalogErrorHelper::io().message(format!(
                            "Statement execution timed out after {:?}",
                            self.config.poll_timeout
                        )));
                    }

                    tokio::time::sleep(self.config.poll_interval).await;

                    debug!(
                        "Polling statement status: {}",
                        current_response.statement_id
                    );
                    current_response = self
                        .get_statement_status(&current_response.statement_id)
                        .await?;
                }
            }
        }
    }

    /// Convert SEA response to internal ExecuteResponse.
    fn convert_response(response: StatementExecutionResponse) -> ExecuteResponse {
        ExecuteResponse {
            statement_id: response.statement_id,
            status: response.status,
            manifest: response.manifest,
            result: response.result,
        }
    }
}

#[async_trait]
impl DatabricksClient for SeaClient {
    async fn create_session(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        session_config: HashMap<String, String>,
    ) -> Result<SessionInfo> {
        let url = format!("{}/sessions", self.base_url());

        let request_body = CreateSessionRequest {
            warehouse_id: self.warehouse_id.clone(),
            catalog: catalog.map(|s| s.to_string()),
            schema: schema.map(|s| s.to_string()),
            session_configuration: session_config,
        };

        debug!("Creating session at {}", url);

        let session_response: CreateSessionResponse = self
            .send_json(
                self.http_client
                    .inner()
                    .request(Method::POST, &url)
                    .json(&request_body),
                "session",
            )
            .await?;

        debug!("Created session: {}", session_response.session_id);

        Ok(SessionInfo {
            session_id: session_response.session_id,
        })
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = format!("{}/sessions/{}", self.base_url(), session_id);
        debug!("Deleting session at {}", url);
        self.send_best_effort(Method::DELETE, &url).await;
        Ok(())
    }

    async fn execute_statement(
        &self,
        session_id: &str,
        sql: &str,
        params: &ExecuteParams,
    ) -> Result<ExecuteResponse> {
        let url = format!("{}/statements", self.base_url());
        let format = self.config.result_format;

        let request_body = ExecuteStatementRequest {
            warehouse_id: self.warehouse_id.clone(),
            statement: sql.to_string(),
            session_id: Some(session_id.to_string()),
            catalog: params.catalog.clone(),
            schema: params.schema.clone(),
            disposition: format.as_disposition().to_string(),
            format: format.as_format().to_string(),
            wait_timeout: params.wait_timeout.clone(),
            on_wait_timeout: params.on_wait_timeout.clone(),
        };

        debug!("Executing statement at {}: {}", url, sql);

        let sea_response: StatementExecutionResponse = self
            .send_json(
                self.http_client
                    .inner()
                    .request(Method::POST, &url)
                    .json(&request_body),
                "execute",
            )
            .await?;

        debug!(
            "Execute response: statement_id={}, status={:?}",
            sea_response.statement_id, sea_response.status.state
        );

        self.wait_for_completion(Self::convert_response(sea_response))
            .await
    }

    async fn get_result_chunk(&self, statement_id: &str, chunk_index: i64) -> Result<ResultData> {
        // The chunk_index is a path parameter, not a query parameter
        let url = format!(
            "{}/statements/{}/result/chunks/{}",
            self.base_url(),
            statement_id,
            chunk_index
        );

        debug!("Getting result chunk at {}", url);

        self.send_json(self.http_client.inner().request(Method::GET, &url), "chunk")
            .await
    }

    async fn cancel_statement(&self, statement_id: &str) -> Result<()> {
        let url = format!("{}/statements/{}/cancel", self.base_url(), statement_id);
        debug!("Canceling statement at {}", url);

        let request = self
            .http_client
            .inner()
            .request(Method::POST, &url)
            .build()
            .map_err(|e| {
                CatalogErrorHelper::io().message(format!("Failed to build request: {}", e))
            })?;
        self.http_client.execute(request).await?;
        Ok(())
    }

    async fn close_statement(&self, statement_id: &str) -> Result<()> {
        let url = format!("{}/statements/{}", self.base_url(), statement_id);
        debug!("Closing statement at {}", url);
        self.send_best_effort(Method::DELETE, &url).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpClientConfig;
    use crate::error::ErrorKind;
    use crate::types::sea::ServiceError;

    fn create_test_client(host: &str) -> SeaClient {
        let http_client =
            Arc::new(DatabricksHttpClient::new(HttpClientConfig::default(), "test-token").unwrap());
        SeaClient::new(
            http_client,
            host,
            "warehouse-123",
            DatabricksClientConfig::default(),
        )
    }

    fn failed_status(code: Option<&str>, message: &str) -> StatementStatus {
        StatementStatus {
            state: StatementState::Failed,
            error: Some(ServiceError {
                error_code: code.map(str::to_string),
                message: Some(message.to_string()),
            }),
        }
    }

    #[tokio::test]
    async fn test_base_url_strips_trailing_slash() {
        assert_eq!(
            create_test_client("https://test.databricks.com").base_url(),
            "https://test.databricks.com/api/2.0/sql"
        );
        assert_eq!(
            create_test_client("https://test.databricks.com/").base_url(),
            "https://test.databricks.com/api/2.0/sql"
        );
    }

    #[test]
    fn test_missing_table_failure_maps_to_not_found() {
        let status = failed_status(
            Some("BAD_REQUEST"),
            "[TABLE_OR_VIEW_NOT_FOUND] The table or view `missing_table` cannot be found.",
        );
        let err = SeaClient::statement_failure(&status);
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_other_failures_map_to_backend_unavailable() {
        let status = failed_status(Some("BAD_REQUEST"), "[PARSE_SYNTAX_ERROR] near 'FORMATTED'");
        let err = SeaClient::statement_failure(&status);
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert!(err.message_text().contains("PARSE_SYNTAX_ERROR"));

        let status = StatementStatus {
            state: StatementState::Failed,
            error: None,
        };
        assert!(SeaClient::statement_failure(&status)
            .message_text()
            .contains("Unknown error"));
    }

    #[tokio::test]
    async fn test_closed_with_inline_result_is_success() {
        let client = create_test_client("https://test.databricks.com");
        let response = ExecuteResponse {
            statement_id: "stmt-1".to_string(),
            status: StatementStatus {
                state: StatementState::Closed,
                error: None,
            },
            manifest: None,
            result: Some(ResultData::default()),
        };
        assert!(client.wait_for_completion(response).await.is_ok());
    }

    #[tokio::test]
    async fn test_canceled_statement_is_backend_unavailable() {
        let client = create_test_client("https://test.databricks.com");
        let response = ExecuteResponse {
            statement_id: "stmt-2".to_string(),
            status: StatementStatus {
                state: StatementState::Canceled,
                error: None,
            },
            manifest: None,
            result: None,
        };
        let err = client.wait_for_completion(response).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }
}
