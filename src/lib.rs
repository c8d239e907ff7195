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

//! Table metadata extraction for Databricks SQL warehouses.
//!
//! This crate turns the text returned by `DESCRIBE FORMATTED` and
//! `SHOW PARTITIONS` into a typed [`Table`]: columns, partition keys,
//! partitions and their storage descriptors.
//!
//! ## Overview
//!
//! - [`Database`] - Holds connection configuration
//! - [`Connection`] - Open session on a warehouse, exposes `get_table`
//! - [`MetadataService`] - Extraction engine over any [`CatalogQueryExecutor`]
//! - [`RowCursor`] - Forward-only row access the engine consumes
//!
//! Queries run through the SQL Statement Execution API, with results
//! requested either as JSON rows or as inline Arrow IPC attachments.
//!
//! ## Describe output format
//!
//! The scanner reads the Hive `DESCRIBE FORMATTED` layout: two header rows,
//! `NULL` type cells ending the column and partition-key lists, and
//! colon-terminated storage labels (`Location:`, `InputFormat:`,
//! `SerDe Library:`, `Storage Desc Params:`). The warehouse must answer in
//! that layout, as a Hive-compatible SQL endpoint does. Spark SQL's own
//! `DESCRIBE FORMATTED` (Databricks SQL on Delta or Unity Catalog tables)
//! has no header rows, uses empty separators and unsuffixed labels, and is
//! rejected with `MalformedProtocol`.
//!
//! ## Example
//!
//! ```ignore
//! use warehouse_metadata::Database;
//!
//! let mut database = Database::new();
//! database.set_option("uri", "https://my-workspace.databricks.com")?;
//! database.set_option("catalog.http_path", "/sql/1.0/warehouses/abc123")?;
//! database.set_option("catalog.access_token", "dapi...")?;
//!
//! let connection = database.connect()?;
//! let table = connection.get_table("sales.orders")?;
//! for partition in table.partitions() {
//!     println!("{:?} -> {}", partition.values(), partition.storage_descriptor().location());
//! }
//! ```
//!
//! ## Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `uri` | | Databricks workspace URL |
//! | `catalog.http_path` | | SQL warehouse HTTP path (extracts warehouse_id) |
//! | `catalog.warehouse_id` | | SQL warehouse ID directly |
//! | `catalog.access_token` | | Personal access token |
//! | `catalog.catalog` | | Default catalog |
//! | `catalog.schema` | | Default schema |
//! | `catalog.log_level` | `warn` | Log level, or `off` |
//! | `catalog.log_file` | stderr | Append logs to this file |
//! | `catalog.http.connect_timeout_ms` | 30000 | HTTP connect timeout |
//! | `catalog.http.read_timeout_ms` | 60000 | HTTP read timeout |
//! | `catalog.http.max_retries` | 5 | Retries on 429/502/503/504 |
//! | `catalog.poll_timeout_ms` | 600000 | Cancel statements running longer |
//! | `catalog.result_format` | `json_array` | `json_array` or `arrow_stream` |
//! | `catalog.metadata.partition_workers` | 1 | Parallel per-partition describes |

pub mod client;
pub mod connection;
pub mod database;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metadata;
pub mod reader;
pub mod types;

// Re-export main types
pub use connection::Connection;
pub use database::Database;
pub use error::{CatalogErrorHelper, Error, ErrorKind, Result};
pub use executor::{CatalogQueryExecutor, SeaExecutor};
pub use metadata::{Column, MetadataOptions, MetadataService, Partition, StorageDescriptor, Table};
pub use reader::{MemoryRowCursor, Row, RowCursor};

// Re-export client types for advanced users
pub use client::{
    DatabricksClient, DatabricksClientConfig, DatabricksHttpClient, HttpClientConfig, SeaClient,
};
