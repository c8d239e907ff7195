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

//! Catalog query execution.
//!
//! [`CatalogQueryExecutor`] is the only collaborator the metadata engine
//! talks to: it runs one textual catalog command and hands back a
//! [`RowCursor`]. [`SeaExecutor`] implements it on top of a
//! [`DatabricksClient`] session, blocking on its own tokio runtime.
//!
//! `SeaExecutor` passes the backend's rows through untouched. Describe
//! results are only usable when the warehouse emits the Hive layout
//! described in the crate docs.

use crate::client::DatabricksClient;
use crate::error::{CatalogErrorHelper, Result};
use crate::reader::arrow::attachment_rows;
use crate::reader::{MemoryRowCursor, Row, RowCursor};
use crate::types::sea::{CompressionCodec, ExecuteParams, ResultData};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, warn};

/// Issues catalog commands and returns their rows.
///
/// Implementations must be usable from several threads at once so that
/// per-partition lookups can run on a worker pool.
pub trait CatalogQueryExecutor: Send + Sync + std::fmt::Debug {
    /// Run `query` and return a cursor positioned before its first row.
    ///
    /// Connection or execution failures are `BackendUnavailable`; a query
    /// naming a table the backend reports as missing may be `NotFound`.
    fn execute(&self, query: &str) -> Result<Box<dyn RowCursor>>;

    /// Runtime that per-partition lookups are fanned out on.
    ///
    /// Executors that own a tokio runtime return its handle so that parallel
    /// lookups share it. `execute` is called from that runtime's blocking
    /// pool, so it may itself block on the runtime.
    fn runtime_handle(&self) -> Option<Handle> {
        None
    }
}

/// Executor bound to one SEA session.
///
/// The session is created on construction and deleted on drop.
pub struct SeaExecutor {
    client: Arc<dyn DatabricksClient>,
    session_id: String,
    params: ExecuteParams,
    runtime: Arc<Runtime>,
}

impl std::fmt::Debug for SeaExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeaExecutor")
            .field("client", &self.client)
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl SeaExecutor {
    /// Open a session on `client`.
    pub fn connect(
        client: Arc<dyn DatabricksClient>,
        catalog: Option<&str>,
        schema: Option<&str>,
        runtime: Runtime,
    ) -> Result<Self> {
        let session_info =
            runtime.block_on(client.create_session(catalog, schema, HashMap::new()))?;

        debug!("Created session: {}", session_info.session_id);

        Ok(Self {
            client,
            session_id: session_info.session_id,
            params: ExecuteParams {
                wait_timeout: Some("30s".to_string()),
                on_wait_timeout: Some("CONTINUE".to_string()),
                ..Default::default()
            },
            runtime: Arc::new(runtime),
        })
    }

    /// Returns the session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl CatalogQueryExecutor for SeaExecutor {
    fn execute(&self, query: &str) -> Result<Box<dyn RowCursor>> {
        debug!("Executing catalog query: {}", query);

        let response = self.runtime.block_on(self.client.execute_statement(
            &self.session_id,
            query,
            &self.params,
        ))?;

        let compression = CompressionCodec::from_manifest(
            response
                .manifest
                .as_ref()
                .and_then(|m| m.result_compression.as_deref()),
        );
        let data = response.result.unwrap_or_default();

        let rows = match decode_result_rows(&data, compression) {
            Ok(rows) => rows,
            Err(e) => {
                if let Err(close_err) = self
                    .runtime
                    .block_on(self.client.close_statement(&response.statement_id))
                {
                    warn!(
                        "Failed to close statement {}: {}",
                        response.statement_id, close_err
                    );
                }
                return Err(e);
            }
        };

        debug!(
            "Statement {} returned {} rows in its first chunk",
            response.statement_id,
            rows.len()
        );

        Ok(Box::new(SeaRowCursor {
            client: self.client.clone(),
            runtime: self.runtime.clone(),
            statement_id: response.statement_id,
            compression,
            rows: MemoryRowCursor::new(rows),
            next_chunk_index: data.next_chunk_index,
            closed: false,
        }))
    }
    fn runtime_handle(&self) -> Option<Handle> {
        Some(self.runtime.handle().clone())
    }
}

impl Drop for SeaExecutor {
    fn drop(&mut self) {
        debug!("Closing session: {}", self.session_id);
        if let Err(e) = self
            .runtime
            .block_on(self.client.delete_session(&self.session_id))
        {
            warn!("Failed to delete session {}: {}", self.session_id, e);
        }
    }
}

/// Decode the rows carried inline by one result chunk.
fn decode_result_rows(data: &ResultData, compression: CompressionCodec) -> Result<Vec<Row>> {
    if data.external_links.as_ref().is_some_and(|l| !l.is_empty()) {
        return Err(CatalogErrorHelper::io()
            .message("Result was delivered as external links, which are not supported"));
    }
    if let Some(ref rows) = data.data_array {
        return Ok(rows.clone());
    }
    match data.attachment {
        Some(ref bytes) => attachment_rows(bytes, compression),
        None => Ok(Vec::new()),
    }
}

/// Forward-only cursor over a SEA statement result.
///
/// Further chunks are fetched only when the rows already held run out.
/// Closing (or dropping) the cursor closes the statement on the server.
pub struct SeaRowCursor {
    client: Arc<dyn DatabricksClient>,
    runtime: Arc<Runtime>,
    statement_id: String,
    compression: CompressionCodec,
    rows: MemoryRowCursor,
    next_chunk_index: Option<i64>,
    closed: bool,
}

impl SeaRowCursor {
    pub fn statement_id(&self) -> &str {
        &self.statement_id
    }
}

impl RowCursor for SeaRowCursor {
    fn next(&mut self) -> Result<bool> {
        loop {
            if self.closed {
                return Ok(false);
            }
            if self.rows.next()? {
                return Ok(true);
            }
            let Some(chunk_index) = self.next_chunk_index else {
                return Ok(false);
            };

            debug!(
                "Fetching chunk {} of statement {}",
                chunk_index, self.statement_id
            );
            let data = self
                .runtime
                .block_on(self.client.get_result_chunk(&self.statement_id, chunk_index))?;
            self.rows.extend(decode_result_rows(&data, self.compression)?);
            self.next_chunk_index = data.next_chunk_index;
        }
    }

    fn field(&self, index: usize) -> Result<&str> {
        self.rows.field(index)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.rows.close()?;
        self.runtime
            .block_on(self.client.close_statement(&self.statement_id))
    }
}

impl Drop for SeaRowCursor {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close statement {}: {}", self.statement_id, e);
        }
    }
}
