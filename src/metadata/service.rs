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

//! Table metadata extraction.
//!
//! [`MetadataService::get_table`] runs the primary `DESCRIBE FORMATTED`,
//! then `SHOW PARTITIONS`, then one describe per partition. Every cursor is
//! closed before the next query is issued, on success and on failure.

use crate::error::{CatalogErrorHelper, Error, Result};
use crate::executor::CatalogQueryExecutor;
use crate::metadata::partition::{parse_partition_values, to_partition_identifier};
use crate::metadata::scanner::{scan_partition_description, scan_table_description};
use crate::metadata::sql::SqlCommandBuilder;
use crate::metadata::types::{Column, Partition, Table};
use crate::reader::RowCursor;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Tuning for metadata extraction.
#[derive(Debug, Clone)]
pub struct MetadataOptions {
    /// Number of per-partition describes allowed in flight at once.
    ///
    /// `1` resolves partitions one after another on the calling thread.
    pub partition_workers: usize,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            partition_workers: 1,
        }
    }
}

/// Builds [`Table`]s from catalog queries run on an executor.
///
/// Holds no state between calls; two calls against an unchanged backend
/// return equal tables.
#[derive(Debug, Clone)]
pub struct MetadataService {
    executor: Arc<dyn CatalogQueryExecutor>,
    options: MetadataOptions,
}

impl MetadataService {
    pub fn new(executor: Arc<dyn CatalogQueryExecutor>, options: MetadataOptions) -> Self {
        Self { executor, options }
    }

    pub fn options(&self) -> &MetadataOptions {
        &self.options
    }

    /// Extract the full metadata of table `name`.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty or multi-statement table name
    /// - `NotFound` when the describe result has no rows
    /// - `BackendUnavailable` when any query fails
    /// - `MalformedProtocol` when a describe or partition listing does not
    ///   have the expected layout
    pub fn get_table(&self, name: &str) -> Result<Table> {
        let sql = SqlCommandBuilder::for_table(name)?;

        let description = self
            .with_cursor(&sql.build_describe_table(), |cursor| {
                scan_table_description(cursor)
            })?
            .ok_or_else(|| {
                CatalogErrorHelper::not_found().message(format!("Table not found: {}", sql.table()))
            })?;

        let partitions = self.enumerate_partitions(&sql, &description.partition_keys)?;

        debug!(
            "Resolved table {}: {} columns, {} partition keys, {} partitions",
            sql.table(),
            description.columns.len(),
            description.partition_keys.len(),
            partitions.len()
        );

        Table::try_new(
            sql.table(),
            description.storage_descriptor,
            description.columns,
            description.partition_keys,
            partitions,
        )
    }

    /// Run `query`, hand its cursor to `read`, and close the cursor.
    fn with_cursor<T>(
        &self,
        query: &str,
        read: impl FnOnce(&mut dyn RowCursor) -> Result<T>,
    ) -> Result<T> {
        debug!("Executing catalog query: {}", query);
        let mut cursor = self.executor.execute(query).map_err(|e| e.context(query))?;

        let result = read(cursor.as_mut());
        if let Err(e) = cursor.close() {
            warn!("Failed to close cursor for '{}': {}", query, e);
        }
        result.map_err(|e| e.context(query))
    }

    fn enumerate_partitions(
        &self,
        sql: &SqlCommandBuilder,
        keys: &[Column],
    ) -> Result<Vec<Partition>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let specs = self.with_cursor(&sql.build_show_partitions(), |cursor| {
            let mut specs = Vec::new();
            while cursor.next()? {
                specs.push(cursor.field(1)?.trim().to_string());
            }
            Ok(specs)
        })?;
        debug!("Table {} lists {} partitions", sql.table(), specs.len());

        let values = specs
            .iter()
            .map(|spec| parse_partition_values(spec, keys))
            .collect::<Result<Vec<_>>>()?;

        if self.options.partition_workers <= 1 || values.len() <= 1 {
            values
                .into_iter()
                .map(|v| self.resolve_partition(sql, keys, v))
                .collect()
        } else {
            self.resolve_partitions_parallel(sql, keys, values)
        }
    }

    fn resolve_partition(
        &self,
        sql: &SqlCommandBuilder,
        keys: &[Column],
        values: Vec<String>,
    ) -> Result<Partition> {
        let identifier = to_partition_identifier(keys, &values);
        let storage = self.with_cursor(&sql.build_describe_partition(&identifier), |cursor| {
            scan_partition_description(cursor)
        })?;
        Ok(Partition::new(values, storage))
    }

    /// Resolve partitions as blocking tasks on a tokio runtime, at most
    /// `partition_workers` at a time.
    ///
    /// Tasks run on the executor's runtime when it has one, otherwise on a
    /// runtime built for this call. Results are put back in listing order.
    /// After the first failure no new describes are started, and the failure
    /// of the earliest listed partition is returned.
    fn resolve_partitions_parallel(
        &self,
        sql: &SqlCommandBuilder,
        keys: &[Column],
        values: Vec<Vec<String>>,
    ) -> Result<Vec<Partition>> {
        let total = values.len();
        let workers = self.options.partition_workers.min(total);
        debug!("Resolving {} partitions on {} workers", total, workers);

        let owned_runtime;
        let handle = match self.executor.runtime_handle() {
            Some(handle) => handle,
            None => {
                owned_runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| {
                        CatalogErrorHelper::io()
                            .message(format!("Failed to create partition runtime: {}", e))
                    })?;
                owned_runtime.handle().clone()
            }
        };

        let service = self.clone();
        let sql = sql.clone();
        let keys: Arc<[Column]> = Arc::from(keys);

        let finished = handle.block_on(async move {
            let mut pending = values.into_iter().enumerate();
            let mut tasks = JoinSet::new();
            let mut finished = Vec::with_capacity(total);
            let mut failed = false;

            loop {
                while !failed && tasks.len() < workers {
                    let Some((index, values)) = pending.next() else {
                        break;
                    };
                    let service = service.clone();
                    let sql = sql.clone();
                    let keys = keys.clone();
                    tasks.spawn_blocking(move || {
                        (index, service.resolve_partition(&sql, &keys, values))
                    });
                }

                let Some(joined) = tasks.join_next().await else {
                    break;
                };
                let (index, result) = joined.map_err(|e| {
                    CatalogErrorHelper::invalid_state()
                        .message(format!("Partition describe task failed: {}", e))
                })?;
                failed |= result.is_err();
                finished.push((index, result));
            }
            Ok::<_, Error>(finished)
        })?;

        let mut slots: Vec<Option<Partition>> = (0..total).map(|_| None).collect();
        let mut first_error: Option<(usize, Error)> = None;
        for (index, result) in finished {
            match result {
                Ok(partition) => slots[index] = Some(partition),
                Err(e) => {
                    if first_error.as_ref().map_or(true, |(i, _)| index < *i) {
                        first_error = Some((index, e));
                    }
                }
            }
        }
        if let Some((_, e)) = first_error {
            return Err(e);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    CatalogErrorHelper::invalid_state()
                        .message(format!("partition {} was never resolved", index))
                })
            })
            .collect()
    }
}
