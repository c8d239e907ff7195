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

//! Client implementations for communicating with Databricks SQL endpoints.
//!
//! This module provides:
//! - `DatabricksClient` trait: Abstract interface for statement execution backends
//! - `DatabricksHttpClient`: Low-level HTTP client with retry logic
//! - `SeaClient`: Implementation using the Statement Execution API (REST)

pub mod http;
pub mod sea;

use crate::error::Result;
use crate::types::sea::{
    ExecuteParams, ResultData, ResultFormat, ResultManifest, StatementStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

pub use http::{DatabricksHttpClient, HttpClientConfig};
pub use sea::SeaClient;

/// Session information returned from create_session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_id: String,
}

/// Response of a statement that reached a terminal state.
#[derive(Debug, Clone)]
pub struct ExecuteResponse {
    pub statement_id: String,
    pub status: StatementStatus,
    pub manifest: Option<ResultManifest>,
    pub result: Option<ResultData>,
}

/// Statement execution settings shared by every query on a client.
#[derive(Debug, Clone)]
pub struct DatabricksClientConfig {
    /// Interval between status polls while a statement is pending.
    pub poll_interval: Duration,
    /// Give up (and cancel the statement) after this long.
    pub poll_timeout: Duration,
    /// Result encoding requested from the warehouse.
    pub result_format: ResultFormat,
}

impl Default for DatabricksClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            poll_timeout: Duration::from_secs(600),
            result_format: ResultFormat::default(),
        }
    }
}

/// Abstract interface for statement execution backends.
///
/// Implementations handle protocol-specific details; `execute_statement`
/// only returns once the statement has succeeded, and maps every other
/// terminal state to an error.
#[async_trait]
pub trait DatabricksClient: Send + Sync + std::fmt::Debug {
    // --- Session Management ---

    /// Create a new session with the given catalog/schema context.
    async fn create_session(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        session_config: HashMap<String, String>,
    ) -> Result<SessionInfo>;

    /// Delete/close a session.
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    // --- Statement Execution ---

    /// Execute a SQL statement within a session and wait for it to finish.
    async fn execute_statement(
        &self,
        session_id: &str,
        sql: &str,
        params: &ExecuteParams,
    ) -> Result<ExecuteResponse>;

    /// Fetch one chunk of a succeeded statement's result.
    async fn get_result_chunk(&self, statement_id: &str, chunk_index: i64) -> Result<ResultData>;

    // --- Statement Lifecycle ---

    /// Cancel a running statement.
    async fn cancel_statement(&self, statement_id: &str) -> Result<()>;

    /// Close/cleanup a statement (release server resources).
    async fn close_statement(&self, statement_id: &str) -> Result<()>;
}
