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

//! Table metadata extraction from catalog description queries.
//!
//! ## Module Structure
//!
//! - `types`: Table, column, partition and storage descriptor model
//! - `sql`: SQL command builder for the describe and listing queries
//! - `scanner`: Section scanner over `DESCRIBE FORMATTED` rows
//! - `partition`: Partition spec parsing and identifier construction
//! - `service`: `get_table` orchestration over a query executor

pub mod partition;
pub mod scanner;
pub mod service;
pub mod sql;
pub mod types;

pub use scanner::{DescribeScanner, ScanState, TableDescription};
pub use service::{MetadataOptions, MetadataService};
pub use sql::SqlCommandBuilder;
pub use types::{Column, Partition, StorageDescriptor, Table};
