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

//! Logging configuration.
//!
//! Initializes a `tracing-subscriber` with file or stderr output.
//!
//! ## Configuration priority
//!
//! 1. `catalog.log_level` / `catalog.log_file` database options (highest)
//! 2. `RUST_LOG` environment variable
//! 3. Default: `warn`
//!
//! ## Usage
//!
//! ```bash
//! # Via environment variable
//! RUST_LOG=warehouse_metadata=debug ./describe_table sales.orders
//! ```
//!
//! Or programmatically via database options:
//! ```ignore
//! database.set_option("catalog.log_level", "debug")?;
//! database.set_option("catalog.log_file", "/tmp/warehouse-metadata.log")?;
//! ```

use std::sync::OnceLock;
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

const LOG_TARGET: &str = "warehouse_metadata";

/// Logging configuration passed via database options.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Log level: "OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE".
    pub level: Option<String>,
    /// Log file path. If unset, logs go to stderr.
    pub file: Option<String>,
}

/// Filter for `config`, or `None` when logging is switched off.
fn log_filter(config: &LogConfig) -> Option<EnvFilter> {
    match config.level.as_deref() {
        Some(level) if level.eq_ignore_ascii_case("off") => None,
        Some(level) => Some(EnvFilter::new(format!(
            "{}={}",
            LOG_TARGET,
            level.to_lowercase()
        ))),
        None => Some(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{}=warn", LOG_TARGET))),
        ),
    }
}

/// Initialize the tracing subscriber.
///
/// Uses `OnceLock` to ensure this is called at most once per process.
/// The first `Database::connect()` call configures logging;
/// subsequent calls are no-ops, as is installing a subscriber when the
/// host application already set a global one.
pub fn init_logging(config: &LogConfig) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let Some(filter) = log_filter(config) else {
            return;
        };

        let Some(ref path) = config.file else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_timer(SystemTime),
                )
                .try_init()
                .ok();
            return;
        };

        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(file)
                            .with_target(false)
                            .with_ansi(false)
                            .with_timer(SystemTime),
                    )
                    .try_init()
                    .ok();
            }
            Err(e) => {
                eprintln!("warehouse-metadata: failed to open log file {}: {}", path, e);
            }
        }
    });
}
