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

//! Integration tests against a real SQL warehouse.
//!
//! ## Setup Requirements
//!
//! These tests require the following environment variables to be set:
//! - `DATABRICKS_HOST`: The Databricks workspace URL (e.g., "https://example.databricks.com")
//! - `DATABRICKS_HTTP_PATH`: The SQL warehouse HTTP path (e.g., "/sql/1.0/warehouses/abc123")
//! - `DATABRICKS_TOKEN`: A valid personal access token
//! - `DATABRICKS_TEST_TABLE`: A table whose `DESCRIBE FORMATTED` output uses
//!   the Hive layout (header rows, `NULL` list terminators, `Location:`-style
//!   labels). Spark SQL's native describe output, as returned for Delta and
//!   Unity Catalog tables, does not qualify and fails with `MalformedProtocol`.
//!
//! Optionally:
//! - `DATABRICKS_TEST_PARTITIONED_TABLE`: A Hive-partitioned table with at least one partition
//!
//! ## Running Tests
//!
//! These tests are marked with `#[ignore]` to prevent them from running in CI
//! without proper credentials. To run them locally:
//!
//! ```bash
//! export DATABRICKS_HOST="https://your-workspace.databricks.com"
//! export DATABRICKS_HTTP_PATH="/sql/1.0/warehouses/your-warehouse-id"
//! export DATABRICKS_TOKEN="your-pat-token"
//! export DATABRICKS_TEST_TABLE="hive_metastore.default.events"
//!
//! cargo test --test integration -- --ignored --nocapture
//! ```

use std::env;
use warehouse_metadata::{Connection, Database, ErrorKind};

fn connect(result_format: &str) -> Connection {
    let mut database = Database::from_env().expect("Failed to read environment");
    database
        .set_option("catalog.result_format", result_format)
        .expect("Failed to set result format");
    database.connect().expect("Failed to connect")
}

fn test_table() -> String {
    env::var("DATABRICKS_TEST_TABLE").expect("DATABRICKS_TEST_TABLE not set")
}

#[test]
#[ignore]
fn test_get_table_json_rows() {
    let connection = connect("json_array");
    let table = connection.get_table(&test_table()).expect("get_table failed");

    println!("{}", serde_json::to_string_pretty(&table).unwrap());
    assert!(!table.columns().is_empty());
    assert!(table
        .columns()
        .iter()
        .all(|c| !c.name().is_empty() && !c.column_type().is_empty()));
}

#[test]
#[ignore]
fn test_get_table_arrow_rows_match_json_rows() {
    let name = test_table();
    let json = connect("json_array").get_table(&name).expect("json get_table failed");
    let arrow = connect("arrow_stream")
        .get_table(&name)
        .expect("arrow get_table failed");

    assert_eq!(json, arrow);
}

#[test]
#[ignore]
fn test_get_table_partitioned() {
    let Ok(name) = env::var("DATABRICKS_TEST_PARTITIONED_TABLE") else {
        println!("DATABRICKS_TEST_PARTITIONED_TABLE not set, skipping");
        return;
    };
    let connection = connect("json_array");
    let table = connection.get_table(&name).expect("get_table failed");

    assert!(table.has_partitions());
    for partition in table.partitions() {
        assert_eq!(partition.values().len(), table.partition_keys().len());
        assert!(!partition.storage_descriptor().location().is_empty());
    }
}

#[test]
#[ignore]
fn test_get_table_missing() {
    let connection = connect("json_array");
    let err = connection
        .get_table("warehouse_metadata_no_such_table_7f3a")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}
