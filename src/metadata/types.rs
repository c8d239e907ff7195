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

//! Table metadata model.
//!
//! Every entity here is built once, fully, by the metadata service and is
//! read-only afterwards. Refreshing metadata means extracting a new
//! [`Table`] and discarding the old one.

use crate::error::{CatalogErrorHelper, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// A column or partition key: name plus opaque warehouse type string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Column {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type exactly as the warehouse printed it, e.g. `decimal(10,2)`.
    pub fn column_type(&self) -> &str {
        &self.column_type
    }
}

/// Physical storage facts of a table or of one partition.
///
/// Attributes the describe output never mentioned are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDescriptor {
    location: String,
    serialization_lib: String,
    input_format: String,
    serde_params: BTreeMap<String, String>,
}

impl StorageDescriptor {
    pub fn new(
        location: impl Into<String>,
        serialization_lib: impl Into<String>,
        input_format: impl Into<String>,
        serde_params: BTreeMap<String, String>,
    ) -> Self {
        Self {
            location: location.into(),
            serialization_lib: serialization_lib.into(),
            input_format: input_format.into(),
            serde_params,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn serialization_lib(&self) -> &str {
        &self.serialization_lib
    }

    pub fn input_format(&self) -> &str {
        &self.input_format
    }

    pub fn serde_params(&self) -> &BTreeMap<String, String> {
        &self.serde_params
    }
}

/// One partition of a partitioned table.
///
/// `values()[i]` is the value of the table's `partition_keys()[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    values: Vec<String>,
    #[serde(flatten)]
    storage: StorageDescriptor,
}

impl Partition {
    pub fn new(values: Vec<String>, storage: StorageDescriptor) -> Self {
        Self { values, storage }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn storage_descriptor(&self) -> &StorageDescriptor {
        &self.storage
    }
}

/// Fully resolved table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    name: String,
    storage_descriptor: StorageDescriptor,
    columns: Vec<Column>,
    partition_keys: Vec<Column>,
    partitions: Vec<Partition>,
}

impl Table {
    /// Assemble a table, checking that partitions line up with the keys.
    ///
    /// # Errors
    ///
    /// `MalformedProtocol` if partitions are given for an unpartitioned
    /// table, or a partition has a different number of values than there are
    /// partition keys.
    pub fn try_new(
        name: impl Into<String>,
        storage_descriptor: StorageDescriptor,
        columns: Vec<Column>,
        partition_keys: Vec<Column>,
        partitions: Vec<Partition>,
    ) -> Result<Self> {
        let name = name.into();
        if partition_keys.is_empty() && !partitions.is_empty() {
            return Err(CatalogErrorHelper::malformed_protocol().message(format!(
                "table {} has {} partitions but no partition keys",
                name,
                partitions.len()
            )));
        }
        if let Some(p) = partitions
            .iter()
            .find(|p| p.values().len() != partition_keys.len())
        {
            return Err(CatalogErrorHelper::malformed_protocol().message(format!(
                "partition {:?} of table {} has {} values for {} partition keys",
                p.values(),
                name,
                p.values().len(),
                partition_keys.len()
            )));
        }

        Ok(Self {
            name,
            storage_descriptor,
            columns,
            partition_keys,
            partitions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_descriptor(&self) -> &StorageDescriptor {
        &self.storage_descriptor
    }

    /// Data columns in declaration order. Partition keys are not included.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn partition_keys(&self) -> &[Column] {
        &self.partition_keys
    }

    /// Partitions in the order the warehouse listed them.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn has_partitions(&self) -> bool {
        !self.partition_keys.is_empty()
    }
}
