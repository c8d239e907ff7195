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

//! Connection configuration.
//!
//! A [`Database`] collects the warehouse address, credentials and tuning
//! options, then opens [`Connection`]s. Each connection gets its own HTTP
//! client, runtime and session, so several can coexist in one process.

use crate::client::{
    DatabricksClient, DatabricksClientConfig, DatabricksHttpClient, HttpClientConfig, SeaClient,
};
use crate::connection::{Connection, ConnectionConfig};
use crate::error::{CatalogErrorHelper, Result};
use crate::logging::{init_logging, LogConfig};
use crate::metadata::MetadataOptions;
use crate::types::sea::ResultFormat;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Holds connection configuration and opens connections.
#[derive(Debug, Default, Clone)]
pub struct Database {
    // Core configuration
    uri: Option<String>,
    warehouse_id: Option<String>,
    access_token: Option<String>,
    catalog: Option<String>,
    schema: Option<String>,

    http_config: HttpClientConfig,
    client_config: DatabricksClientConfig,
    metadata_options: MetadataOptions,
    log_config: LogConfig,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure from the standard `DATABRICKS_*` environment variables.
    ///
    /// Reads `DATABRICKS_HOST`, `DATABRICKS_HTTP_PATH`, `DATABRICKS_TOKEN`,
    /// `DATABRICKS_CATALOG` and `DATABRICKS_SCHEMA`; unset variables are
    /// left unconfigured.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut db = Self::new();
        for (var, option) in [
            ("DATABRICKS_HOST", "uri"),
            ("DATABRICKS_HTTP_PATH", "catalog.http_path"),
            ("DATABRICKS_TOKEN", "catalog.access_token"),
            ("DATABRICKS_CATALOG", "catalog.catalog"),
            ("DATABRICKS_SCHEMA", "catalog.schema"),
        ] {
            if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
                db.set_option(option, value)?;
            }
        }
        Ok(db)
    }

    /// Returns the configured URI.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Returns the configured warehouse ID.
    pub fn warehouse_id(&self) -> Option<&str> {
        self.warehouse_id.as_deref()
    }

    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn metadata_options(&self) -> &MetadataOptions {
        &self.metadata_options
    }

    /// Set one option by its string key.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown key or a value that does not parse.
    pub fn set_option(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        match key {
            "uri" => self.uri = Some(Self::normalize_host(&value)),
            "catalog.http_path" => {
                let wid = Self::extract_warehouse_id(&value)
                    .ok_or_else(|| CatalogErrorHelper::set_invalid_option(key, &value))?;
                self.warehouse_id = Some(wid);
            }
            "catalog.warehouse_id" => self.warehouse_id = Some(value),
            "catalog.access_token" => self.access_token = Some(value),
            "catalog.catalog" => self.catalog = Some(value),
            "catalog.schema" => self.schema = Some(value),
            "catalog.log_level" => self.log_config.level = Some(value),
            "catalog.log_file" => self.log_config.file = Some(value),

            // HTTP client options
            "catalog.http.connect_timeout_ms" => {
                self.http_config.connect_timeout =
                    Duration::from_millis(Self::parse_int_option(key, &value)?);
            }
            "catalog.http.read_timeout_ms" => {
                self.http_config.read_timeout =
                    Duration::from_millis(Self::parse_int_option(key, &value)?);
            }
            "catalog.http.max_retries" => {
                self.http_config.max_retries = u32::try_from(Self::parse_int_option(key, &value)?)
                    .map_err(|_| CatalogErrorHelper::set_invalid_option(key, &value))?;
            }

            // Statement execution options
            "catalog.poll_timeout_ms" => {
                self.client_config.poll_timeout =
                    Duration::from_millis(Self::parse_int_option(key, &value)?);
            }
            "catalog.result_format" => {
                self.client_config.result_format = value
                    .parse::<ResultFormat>()
                    .map_err(|_| CatalogErrorHelper::set_invalid_option(key, &value))?;
            }

            // Metadata options
            "catalog.metadata.partition_workers" => {
                let workers = Self::parse_int_option(key, &value)?;
                if workers == 0 {
                    return Err(CatalogErrorHelper::set_invalid_option(key, &value));
                }
                self.metadata_options.partition_workers = usize::try_from(workers)
                    .map_err(|_| CatalogErrorHelper::set_invalid_option(key, &value))?;
            }

            _ => return Err(CatalogErrorHelper::set_unknown_option(key)),
        }
        Ok(())
    }

    /// Read back a string-valued option.
    pub fn get_option(&self, key: &str) -> Result<String> {
        let value = match key {
            "uri" => self.uri.clone(),
            "catalog.warehouse_id" => self.warehouse_id.clone(),
            "catalog.catalog" => self.catalog.clone(),
            "catalog.schema" => self.schema.clone(),
            "catalog.result_format" => {
                Some(self.client_config.result_format.as_format().to_string())
            }
            "catalog.metadata.partition_workers" => {
                Some(self.metadata_options.partition_workers.to_string())
            }
            _ => return Err(CatalogErrorHelper::set_unknown_option(key)),
        };
        value.ok_or_else(|| {
            CatalogErrorHelper::invalid_state().message(format!("option '{}' is not set", key))
        })
    }

    /// Open a connection: HTTP client, SEA client, runtime and session.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the URI, warehouse or access token is missing;
    /// `BackendUnavailable` when the session cannot be created.
    pub fn connect(&self) -> Result<Connection> {
        let host = self
            .uri
            .as_ref()
            .ok_or_else(|| CatalogErrorHelper::invalid_argument().message("uri not set"))?;
        let warehouse_id = self.warehouse_id.as_ref().ok_or_else(|| {
            CatalogErrorHelper::invalid_argument().message(
                "warehouse_id not set (set via catalog.http_path or catalog.warehouse_id)",
            )
        })?;
        let access_token = self
            .access_token
            .as_ref()
            .ok_or_else(|| CatalogErrorHelper::invalid_argument().message("access_token not set"))?;

        init_logging(&self.log_config);

        debug!(
            "Creating connection to {} with warehouse {}",
            host, warehouse_id
        );

        let http_client = Arc::new(DatabricksHttpClient::new(
            self.http_config.clone(),
            access_token.as_str(),
        )?);

        let client: Arc<dyn DatabricksClient> = Arc::new(SeaClient::new(
            http_client,
            host.as_str(),
            warehouse_id.as_str(),
            self.client_config.clone(),
        ));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                CatalogErrorHelper::io().message(format!("Failed to create runtime: {}", e))
            })?;

        Connection::new(
            ConnectionConfig {
                host: host.clone(),
                warehouse_id: warehouse_id.clone(),
                catalog: self.catalog.clone(),
                schema: self.schema.clone(),
                client,
                metadata_options: self.metadata_options.clone(),
            },
            runtime,
        )
    }

    /// Extract warehouse ID from HTTP path.
    /// Format: /sql/1.0/warehouses/{warehouse_id}
    fn extract_warehouse_id(http_path: &str) -> Option<String> {
        http_path
            .strip_prefix("/sql/1.0/warehouses/")
            .or_else(|| http_path.strip_prefix("sql/1.0/warehouses/"))
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
    }

    /// Workspace hosts are often given without a scheme.
    fn normalize_host(host: &str) -> String {
        if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }

    fn parse_int_option(key: &str, value: &str) -> Result<u64> {
        value
            .trim()
            .parse()
            .map_err(|_| CatalogErrorHelper::set_invalid_option(key, value))
    }
}
