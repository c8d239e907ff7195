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

//! Print a table's metadata as JSON.
//!
//! The warehouse must answer `DESCRIBE FORMATTED` in the Hive layout; see
//! the crate docs. Other layouts end with a `MalformedProtocol` error.
//!
//! ```bash
//! export DATABRICKS_HOST=... DATABRICKS_HTTP_PATH=... DATABRICKS_TOKEN=...
//! cargo run --example describe_table -- sales.orders [partition_workers]
//! ```

use std::process::ExitCode;
use warehouse_metadata::{Database, Result};

fn run(table: &str, workers: Option<&str>) -> Result<()> {
    let mut database = Database::from_env()?;
    database.set_option("catalog.log_level", "info")?;
    if let Some(workers) = workers {
        database.set_option("catalog.metadata.partition_workers", workers)?;
    }

    let connection = database.connect()?;
    let table = connection.get_table(table)?;

    match serde_json::to_string_pretty(&table) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to render {}: {}", table.name(), e),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(table) = args.first() else {
        eprintln!("usage: describe_table <table> [partition_workers]");
        return ExitCode::from(2);
    };

    match run(table, args.get(1).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
