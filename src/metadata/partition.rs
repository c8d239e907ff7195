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

//! Partition spec parsing and identifier construction.
//!
//! `SHOW PARTITIONS` prints each partition as `k1=v1/k2=v2`; the per-partition
//! describe addresses it as `k1=v1,k2=v2`.

use crate::error::{CatalogErrorHelper, Result};
use crate::metadata::types::Column;

/// Parse a `SHOW PARTITIONS` spec into its values, in key order.
///
/// Each `/`-separated segment is split on its first `=`. The segment keys
/// must name `keys` in order (ASCII case-insensitive) and there must be
/// exactly one segment per key.
///
/// # Errors
///
/// `MalformedProtocol` for a segment without `=`, a key mismatch or a
/// segment count that differs from the key count.
pub fn parse_partition_values(spec: &str, keys: &[Column]) -> Result<Vec<String>> {
    let segments: Vec<&str> = spec.split('/').collect();
    if segments.len() != keys.len() {
        return Err(CatalogErrorHelper::malformed_protocol().message(format!(
            "partition spec '{}' has {} segments, table has {} partition keys",
            spec,
            segments.len(),
            keys.len()
        )));
    }

    segments
        .iter()
        .zip(keys)
        .map(|(segment, key)| {
            let (name, value) = segment.split_once('=').ok_or_else(|| {
                CatalogErrorHelper::malformed_protocol().message(format!(
                    "partition spec segment '{}' in '{}' has no '='",
                    segment, spec
                ))
            })?;
            if !name.eq_ignore_ascii_case(key.name()) {
                return Err(CatalogErrorHelper::malformed_protocol().message(format!(
                    "partition spec '{}' names key '{}' where '{}' was expected",
                    spec,
                    name,
                    key.name()
                )));
            }
            Ok(value.to_string())
        })
        .collect()
}

/// Build the `key1=value1,key2=value2` identifier for a partition.
///
/// Keys and values are paired positionally; the caller guarantees equal
/// lengths.
pub fn to_partition_identifier(keys: &[Column], values: &[String]) -> String {
    keys.iter()
        .zip(values)
        .map(|(key, value)| format!("{}={}", key.name(), value))
        .collect::<Vec<_>>()
        .join(",")
}
