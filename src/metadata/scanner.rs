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

//! Single-pass scanner over `DESCRIBE FORMATTED` output.
//!
//! A describe result is a loosely structured row stream:
//!
//! ```text
//! # col_name             data_type   comment      <- banner
//!                        NULL        NULL         <- header separator
//! id                     int                      <- columns ...
//! name                   string
//! # Partition Information NULL       NULL         <- column list sentinel
//! # col_name             data_type   comment
//!                        NULL        NULL
//! year                   string                   <- partition keys ...
//!                        NULL        NULL         <- key list sentinel
//! Location:              /warehouse/t             <- storage section
//! InputFormat:           orc
//! SerDe Library:         orc.Serde
//! Storage Desc Params:   NULL        NULL
//!                        serialization.format 1   <- serde params ...
//! ```
//!
//! [`DescribeScanner`] walks that stream forward exactly once. Its
//! [`ScanState`] records which section the cursor is in, so each reader can
//! only run when the rows it expects are the next ones on the cursor.
//!
//! Fields are compared and stored with surrounding whitespace trimmed; the
//! warehouse pads labels and values to column width.

use crate::error::{CatalogErrorHelper, Result};
use crate::metadata::types::{Column, StorageDescriptor};
use crate::reader::{RowCursor, NULL_FIELD};
use std::collections::BTreeMap;
use tracing::debug;

pub const LOCATION_MARKER: &str = "Location:";
pub const INPUT_FORMAT_MARKER: &str = "InputFormat:";
pub const SERDE_LIBRARY_MARKER: &str = "SerDe Library:";
pub const STORAGE_PARAMS_MARKER: &str = "Storage Desc Params:";
pub const PARTITION_INFORMATION_MARKER: &str = "Partition Information";
pub const DETAILED_PARTITION_MARKER: &str = "Detailed Partition Information";

/// Section of the describe result the scanner is positioned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// On the first row of the column list.
    Columns,
    /// On the row that ended the column list.
    PartitionKeyHeader,
    /// On the first row of the partition-key list.
    PartitionKeys,
    /// Before the storage descriptor rows.
    StorageParams,
    /// The cursor has been drained.
    Done,
}

/// Columns, partition keys and storage descriptor of one describe result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub columns: Vec<Column>,
    pub partition_keys: Vec<Column>,
    pub storage_descriptor: StorageDescriptor,
}

/// Forward-only reader of a describe result.
pub struct DescribeScanner<'a> {
    cursor: &'a mut dyn RowCursor,
    state: ScanState,
}

impl<'a> DescribeScanner<'a> {
    /// Start scanning a table describe result.
    ///
    /// Skips the banner and header rows and positions on the first column
    /// row. Returns `None` when the result has no rows at all.
    ///
    /// # Errors
    ///
    /// `MalformedProtocol` when the result ends inside the two header rows
    /// or right after them (no column list and no sentinel).
    pub fn begin(cursor: &'a mut dyn RowCursor) -> Result<Option<Self>> {
        if !cursor.next()? {
            return Ok(None);
        }
        let mut scanner = Self {
            cursor,
            state: ScanState::Columns,
        };
        scanner.advance_required("describe header")?;
        scanner.advance_required("column list")?;
        Ok(Some(scanner))
    }

    /// Start scanning a per-partition describe result.
    ///
    /// Skips every row up to and including the one whose first field
    /// contains `Detailed Partition Information`; the scanner is then ready
    /// for [`read_storage_descriptor`](Self::read_storage_descriptor).
    ///
    /// # Errors
    ///
    /// `MalformedProtocol` when the marker never appears.
    pub fn begin_partition(cursor: &'a mut dyn RowCursor) -> Result<Self> {
        let mut scanner = Self {
            cursor,
            state: ScanState::StorageParams,
        };
        while scanner.cursor.next()? {
            if scanner.field(1)?.contains(DETAILED_PARTITION_MARKER) {
                return Ok(scanner);
            }
        }
        Err(CatalogErrorHelper::malformed_protocol().message(format!(
            "'{}' marker not found in partition describe result",
            DETAILED_PARTITION_MARKER
        )))
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Read the data columns.
    ///
    /// Leaves the cursor on the sentinel row that ended the list.
    pub fn read_columns(&mut self) -> Result<Vec<Column>> {
        self.expect_state(ScanState::Columns, "read columns")?;
        let columns = self.read_column_list("column list")?;
        debug!("Read {} columns", columns.len());
        self.state = ScanState::PartitionKeyHeader;
        Ok(columns)
    }

    /// Read the partition keys, or an empty list for an unpartitioned table.
    ///
    /// The row that ended the column list is inspected; unless it carries
    /// the `Partition Information` marker the cursor does not move.
    pub fn resolve_partition_keys(&mut self) -> Result<Vec<Column>> {
        self.expect_state(ScanState::PartitionKeyHeader, "resolve partition keys")?;

        if !self.field(1)?.contains(PARTITION_INFORMATION_MARKER) {
            self.state = ScanState::StorageParams;
            return Ok(Vec::new());
        }

        debug!("Found partition information section");
        self.advance_required("partition key header")?;
        self.advance_required("partition key separator")?;
        self.advance_required("partition key list")?;
        self.state = ScanState::PartitionKeys;

        let keys = self.read_column_list("partition key list")?;
        debug!("Read {} partition keys", keys.len());
        self.state = ScanState::StorageParams;
        Ok(keys)
    }

    /// Drain the rest of the cursor into a storage descriptor.
    ///
    /// Rows without a recognized marker are ignored. Once the
    /// `Storage Desc Params:` row is seen, every later row is a serde
    /// parameter `(field 2, field 3)`.
    pub fn read_storage_descriptor(&mut self) -> Result<StorageDescriptor> {
        self.expect_state(ScanState::StorageParams, "read storage descriptor")?;

        let mut location = String::new();
        let mut input_format = String::new();
        let mut serialization_lib = String::new();
        let mut serde_params = BTreeMap::new();
        let mut in_params = false;

        while self.cursor.next()? {
            if in_params {
                let key = self.field(2)?.to_string();
                let value = self.field(3)?.to_string();
                serde_params.insert(key, value);
                continue;
            }

            let label = self.field(1)?;
            if label == LOCATION_MARKER {
                location = self.field(2)?.to_string();
            } else if label == INPUT_FORMAT_MARKER {
                input_format = self.field(2)?.to_string();
            } else if label == SERDE_LIBRARY_MARKER {
                serialization_lib = self.field(2)?.to_string();
            } else if label == STORAGE_PARAMS_MARKER {
                debug!("Reading storage descriptor parameters");
                in_params = true;
            }
        }

        self.state = ScanState::Done;
        Ok(StorageDescriptor::new(
            location,
            serialization_lib,
            input_format,
            serde_params,
        ))
    }

    /// Read `(field 1, field 2)` pairs until a row whose type is `NULL`.
    fn read_column_list(&mut self, section: &str) -> Result<Vec<Column>> {
        let mut columns = Vec::new();
        loop {
            let column_type = self.field(2)?;
            if column_type == NULL_FIELD {
                return Ok(columns);
            }
            let column_type = column_type.to_string();
            columns.push(Column::new(self.field(1)?, column_type));
            self.advance_required(section)?;
        }
    }

    fn advance_required(&mut self, section: &str) -> Result<()> {
        if self.cursor.next()? {
            return Ok(());
        }
        self.state = ScanState::Done;
        Err(CatalogErrorHelper::malformed_protocol()
            .message(format!("describe result ended inside the {}", section)))
    }

    fn expect_state(&self, expected: ScanState, operation: &str) -> Result<()> {
        if self.state == expected {
            return Ok(());
        }
        Err(CatalogErrorHelper::invalid_state().message(format!(
            "cannot {} while scanner is in state {:?}",
            operation, self.state
        )))
    }

    fn field(&self, index: usize) -> Result<&str> {
        Ok(self.cursor.field(index)?.trim())
    }
}

/// Scan a complete table describe result.
///
/// Returns `None` when the result has no rows.
pub fn scan_table_description(cursor: &mut dyn RowCursor) -> Result<Option<TableDescription>> {
    let Some(mut scanner) = DescribeScanner::begin(cursor)? else {
        return Ok(None);
    };
    let columns = scanner.read_columns()?;
    let partition_keys = scanner.resolve_partition_keys()?;
    let storage_descriptor = scanner.read_storage_descriptor()?;
    Ok(Some(TableDescription {
        columns,
        partition_keys,
        storage_descriptor,
    }))
}

/// Scan a per-partition describe result into the partition's descriptor.
pub fn scan_partition_description(cursor: &mut dyn RowCursor) -> Result<StorageDescriptor> {
    DescribeScanner::begin_partition(cursor)?.read_storage_descriptor()
}
