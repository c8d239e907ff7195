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

//! Open connection to a SQL warehouse.

use crate::client::DatabricksClient;
use crate::error::Result;
use crate::executor::SeaExecutor;
use crate::metadata::{MetadataOptions, MetadataService, Table};
use std::sync::Arc;

/// Configuration passed from Database to Connection.
pub struct ConnectionConfig {
    pub host: String,
    pub warehouse_id: String,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub client: Arc<dyn DatabricksClient>,
    pub metadata_options: MetadataOptions,
}

/// An open session on a SQL warehouse.
///
/// The session is closed when the connection is dropped.
#[derive(Debug)]
pub struct Connection {
    host: String,
    warehouse_id: String,
    executor: Arc<SeaExecutor>,
    metadata: MetadataService,
}

impl Connection {
    /// Called by `Database::connect()`.
    ///
    /// Takes ownership of the runtime the session's queries block on.
    pub(crate) fn new(config: ConnectionConfig, runtime: tokio::runtime::Runtime) -> Result<Self> {
        let executor = Arc::new(SeaExecutor::connect(
            config.client,
            config.catalog.as_deref(),
            config.schema.as_deref(),
            runtime,
        )?);
        let metadata = MetadataService::new(executor.clone(), config.metadata_options);

        Ok(Self {
            host: config.host,
            warehouse_id: config.warehouse_id,
            executor,
            metadata,
        })
    }

    /// Returns the Databricks host URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn warehouse_id(&self) -> &str {
        &self.warehouse_id
    }

    pub fn session_id(&self) -> &str {
        self.executor.session_id()
    }

    /// Extract the metadata of table `name`.
    ///
    /// See [`MetadataService::get_table`].
    pub fn get_table(&self, name: &str) -> Result<Table> {
        self.metadata.get_table(name)
    }

    /// Service bound to this connection's session, for callers that want to
    /// share it across threads.
    pub fn metadata_service(&self) -> &MetadataService {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ExecuteResponse, SessionInfo};
    use crate::error::{CatalogErrorHelper, ErrorKind};
    use crate::types::sea::{ExecuteParams, ResultData, StatementState, StatementStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Client answering each SQL text with fixed JSON rows.
    #[derive(Debug, Default)]
    struct CannedClient {
        answers: HashMap<String, Vec<Vec<Option<String>>>>,
        closed_statements: Mutex<Vec<String>>,
        deleted_sessions: Arc<Mutex<Vec<String>>>,
    }

    impl CannedClient {
        fn answer(mut self, sql: &str, rows: &[&[&str]]) -> Self {
            let rows: Vec<Vec<Option<String>>> = rows
                .iter()
                .map(|r| {
                    r.iter()
                        .map(|f| (*f != "NULL").then(|| f.to_string()))
                        .collect()
                })
                .collect();
            self.answers.insert(sql.to_string(), rows);
            self
        }
    }

    #[async_trait]
    impl DatabricksClient for CannedClient {
        async fn create_session(
            &self,
            _catalog: Option<&str>,
            _schema: Option<&str>,
            _session_config: HashMap<String, String>,
        ) -> Result<SessionInfo> {
            Ok(SessionInfo {
                session_id: "session-1".to_string(),
            })
        }

        async fn delete_session(&self, session_id: &str) -> Result<()> {
            self.deleted_sessions
                .lock()
                .unwrap()
                .push(session_id.to_string());
            Ok(())
        }

        async fn execute_statement(
            &self,
            _session_id: &str,
            sql: &str,
            _params: &ExecuteParams,
        ) -> Result<ExecuteResponse> {
            let rows = self.answers.get(sql).cloned().ok_or_else(|| {
                CatalogErrorHelper::not_found().message(format!("TABLE_OR_VIEW_NOT_FOUND: {}", sql))
            })?;
            Ok(ExecuteResponse {
                statement_id: sql.to_string(),
                status: StatementStatus {
                    state: StatementState::Succeeded,
                    error: None,
                },
                manifest: None,
                result: Some(ResultData {
                    data_array: Some(rows),
                    ..Default::default()
                }),
            })
        }

        async fn get_result_chunk(&self, statement_id: &str, _chunk_index: i64) -> Result<ResultData> {
            Err(CatalogErrorHelper::io().message(format!("unexpected chunk fetch for {}", statement_id)))
        }

        async fn cancel_statement(&self, _statement_id: &str) -> Result<()> {
            Ok(())
        }

        async fn close_statement(&self, statement_id: &str) -> Result<()> {
            self.closed_statements
                .lock()
                .unwrap()
                .push(statement_id.to_string());
            Ok(())
        }
    }

    fn connect(client: Arc<CannedClient>) -> Connection {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        connect_on(client, runtime, MetadataOptions::default())
    }

    fn connect_on(
        client: Arc<CannedClient>,
        runtime: tokio::runtime::Runtime,
        metadata_options: MetadataOptions,
    ) -> Connection {
        Connection::new(
            ConnectionConfig {
                host: "https://example.databricks.com".to_string(),
                warehouse_id: "w1".to_string(),
                catalog: Some("main".to_string()),
                schema: None,
                client,
                metadata_options,
            },
            runtime,
        )
        .unwrap()
    }

    #[test]
    fn test_get_table_over_session() {
        let client = Arc::new(
            CannedClient::default()
                .answer(
                    "DESCRIBE FORMATTED t",
                    &[
                        &["# col_name", "data_type", "comment"],
                        &["", "NULL", "NULL"],
                        &["id", "int", ""],
                        &["# Partition Information", "NULL", "NULL"],
                        &["# col_name", "data_type", "comment"],
                        &["", "NULL", "NULL"],
                        &["ds", "string", ""],
                        &["", "NULL", "NULL"],
                        &["Location:", "s3://bucket/t", ""],
                    ],
                )
                .answer("SHOW PARTITIONS t", &[&["ds=2024-01-01"]])
                .answer(
                    "DESCRIBE FORMATTED t PARTITION (ds=2024-01-01)",
                    &[
                        &["# Detailed Partition Information", "NULL", "NULL"],
                        &["Location:", "s3://bucket/t/ds=2024-01-01", ""],
                    ],
                ),
        );
        let connection = connect(client.clone());
        assert_eq!(connection.session_id(), "session-1");

        let table = connection.get_table("t").unwrap();
        assert_eq!(table.partition_keys().len(), 1);
        assert_eq!(
            table.partitions()[0].storage_descriptor().location(),
            "s3://bucket/t/ds=2024-01-01"
        );
        assert_eq!(client.closed_statements.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_parallel_partitions_over_session() {
        let mut client = CannedClient::default()
            .answer(
                "DESCRIBE FORMATTED t",
                &[
                    &["# col_name", "data_type", "comment"],
                    &["", "NULL", "NULL"],
                    &["id", "int", ""],
                    &["# Partition Information", "NULL", "NULL"],
                    &["# col_name", "data_type", "comment"],
                    &["", "NULL", "NULL"],
                    &["ds", "string", ""],
                    &["", "NULL", "NULL"],
                ],
            )
            .answer(
                "SHOW PARTITIONS t",
                &[&["ds=2024-01-01"], &["ds=2024-01-02"], &["ds=2024-01-03"]],
            );
        for day in ["01", "02", "03"] {
            let location = format!("s3://bucket/t/ds=2024-01-{}", day);
            client = client.answer(
                &format!("DESCRIBE FORMATTED t PARTITION (ds=2024-01-{})", day),
                &[
                    &["# Detailed Partition Information", "NULL", "NULL"],
                    &["Location:", location.as_str(), ""],
                ],
            );
        }
        let client = Arc::new(client);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let connection = connect_on(
            client.clone(),
            runtime,
            MetadataOptions {
                partition_workers: 2,
            },
        );

        let table = connection.get_table("t").unwrap();
        let locations: Vec<&str> = table
            .partitions()
            .iter()
            .map(|p| p.storage_descriptor().location())
            .collect();
        assert_eq!(
            locations,
            vec![
                "s3://bucket/t/ds=2024-01-01",
                "s3://bucket/t/ds=2024-01-02",
                "s3://bucket/t/ds=2024-01-03",
            ]
        );
        assert_eq!(client.closed_statements.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_missing_table_and_session_cleanup() {
        let client = Arc::new(CannedClient::default());
        let deleted = client.deleted_sessions.clone();
        let connection = connect(client);

        let err = connection.get_table("missing_table").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        drop(connection);
        assert_eq!(*deleted.lock().unwrap(), vec!["session-1".to_string()]);
    }
}
