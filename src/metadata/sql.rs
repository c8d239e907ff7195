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

//! SQL command builder for catalog description queries.
//!
//! Builds the three commands the metadata engine issues:
//! `DESCRIBE FORMATTED`, `SHOW PARTITIONS` and the per-partition
//! `DESCRIBE FORMATTED ... PARTITION (...)`.

use crate::error::{CatalogErrorHelper, Result};

/// Builds catalog commands for one table.
///
/// The table name is used verbatim so that qualified (`db.table`) and
/// already-quoted names pass through unchanged.
///
/// # Examples
///
/// ```ignore
/// let sql = SqlCommandBuilder::for_table("sales.orders")?.build_show_partitions();
/// assert_eq!(sql, "SHOW PARTITIONS sales.orders");
/// ```
#[derive(Debug, Clone)]
pub struct SqlCommandBuilder {
    table: String,
}

impl SqlCommandBuilder {
    /// Create a builder for `table`.
    ///
    /// Rejects empty names and names that could smuggle a second statement
    /// (`;` or a line break) with `InvalidArgument`.
    pub fn for_table(table: &str) -> Result<Self> {
        let table = table.trim();
        if table.is_empty() {
            return Err(CatalogErrorHelper::invalid_argument().message("table name is empty"));
        }
        if table.contains(|c: char| matches!(c, ';' | '\n' | '\r')) {
            return Err(CatalogErrorHelper::invalid_argument()
                .message(format!("table name {:?} contains a statement separator", table)));
        }
        Ok(Self {
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Build `DESCRIBE FORMATTED {table}`.
    pub fn build_describe_table(&self) -> String {
        format!("DESCRIBE FORMATTED {}", self.table)
    }

    /// Build `SHOW PARTITIONS {table}`.
    pub fn build_show_partitions(&self) -> String {
        format!("SHOW PARTITIONS {}", self.table)
    }

    /// Build `DESCRIBE FORMATTED {table} PARTITION ({identifier})`.
    ///
    /// `identifier` is the `key=value,...` form produced by
    /// [`to_partition_identifier`](super::partition::to_partition_identifier).
    pub fn build_describe_partition(&self, identifier: &str) -> String {
        format!("DESCRIBE FORMATTED {} PARTITION ({})", self.table, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_sql_command_builder_describe_table() {
        let builder = SqlCommandBuilder::for_table("sales.orders").unwrap();
        assert_eq!(builder.build_describe_table(), "DESCRIBE FORMATTED sales.orders");
    }

    #[test]
    fn test_sql_command_builder_show_partitions() {
        let builder = SqlCommandBuilder::for_table("t").unwrap();
        assert_eq!(builder.build_show_partitions(), "SHOW PARTITIONS t");
    }

    #[test]
    fn test_sql_command_builder_describe_partition() {
        let builder = SqlCommandBuilder::for_table("t").unwrap();
        assert_eq!(
            builder.build_describe_partition("year=2020,month=03"),
            "DESCRIBE FORMATTED t PARTITION (year=2020,month=03)"
        );
    }

    #[test]
    fn test_sql_command_builder_trims_and_keeps_quoting() {
        let builder = SqlCommandBuilder::for_table("  `my db`.`t`  ").unwrap();
        assert_eq!(builder.table(), "`my db`.`t`");
    }

    #[test]
    fn test_sql_command_builder_rejects_bad_names() {
        for name in ["", "   ", "t; DROP TABLE t", "t\nSHOW TABLES"] {
            let err = SqlCommandBuilder::for_table(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "name {:?}", name);
        }
    }
}
