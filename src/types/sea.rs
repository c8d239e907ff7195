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

//! SEA (Statement Execution API) request/response types.
//!
//! These types map directly to the JSON structures used by the Databricks
//! SQL Statement Execution API. They are primarily used by `SeaClient`.

use crate::error::{CatalogErrorHelper, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Response from statement execution or status polling.
#[derive(Debug, Clone, Deserialize)]
pub struct StatementExecutionResponse {
    pub statement_id: String,
    pub status: StatementStatus,
    #[serde(default)]
    pub manifest: Option<ResultManifest>,
    #[serde(default)]
    pub result: Option<ResultData>,
}

/// Status of a statement execution.
#[derive(Debug, Clone, Deserialize)]
pub struct StatementStatus {
    pub state: StatementState,
    #[serde(default)]
    pub error: Option<ServiceError>,
}

/// Possible states of a statement during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
}

/// Error information from the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Manifest describing the result set structure.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultManifest {
    pub format: String,
    pub schema: ResultSchema,
    #[serde(default)]
    pub total_chunk_count: Option<i64>,
    #[serde(default)]
    pub total_row_count: Option<i64>,
    #[serde(default)]
    pub truncated: bool,
    /// Compression codec used for result data ("LZ4_FRAME" or absent for none)
    #[serde(default)]
    pub result_compression: Option<String>,
}

/// Schema of the result set.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultSchema {
    pub column_count: i32,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

/// Information about a single column in the result.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub type_text: Option<String>,
    pub position: i32,
}

/// Result data from the initial execution response or a chunk fetch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultData {
    #[serde(default)]
    pub chunk_index: Option<i64>,
    #[serde(default)]
    pub row_offset: Option<i64>,
    #[serde(default)]
    pub row_count: Option<i64>,
    #[serde(default)]
    pub next_chunk_index: Option<i64>,
    #[serde(default)]
    pub next_chunk_internal_link: Option<String>,
    /// Presigned cloud storage links; not consumed by this crate.
    #[serde(default)]
    pub external_links: Option<Vec<ExternalLink>>,
    /// Inline rows for `JSON_ARRAY` results. JSON nulls are SQL NULLs.
    #[serde(default)]
    pub data_array: Option<Vec<Vec<Option<String>>>>,
    /// Inline Arrow IPC data (base64-encoded in JSON, decoded by serde).
    #[serde(default, deserialize_with = "deserialize_base64_attachment")]
    pub attachment: Option<Vec<u8>>,
}

/// Deserialize base64-encoded attachment field from JSON.
fn deserialize_base64_attachment<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) if !s.is_empty() => STANDARD
            .decode(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// External link for cloud storage download.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalLink {
    pub external_link: String,
    #[serde(default)]
    pub chunk_index: Option<i64>,
    #[serde(default)]
    pub row_count: Option<i64>,
    #[serde(default)]
    pub http_headers: Option<HashMap<String, String>>,
}

/// Request body for statement execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteStatementRequest {
    pub warehouse_id: String,
    pub statement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub disposition: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_wait_timeout: Option<String>,
}

/// Parameters for statement execution (passed to client methods).
#[derive(Debug, Clone, Default)]
pub struct ExecuteParams {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub wait_timeout: Option<String>,
    pub on_wait_timeout: Option<String>, // "CONTINUE" or "CANCEL"
}

/// Wire encoding requested for statement results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFormat {
    /// Rows of strings inline in the JSON response.
    #[default]
    JsonArray,
    /// Arrow IPC attachment inline in the JSON response.
    ArrowStream,
}

impl ResultFormat {
    /// `format` field value of the execute request.
    pub fn as_format(&self) -> &'static str {
        match self {
            ResultFormat::JsonArray => "JSON_ARRAY",
            ResultFormat::ArrowStream => "ARROW_STREAM",
        }
    }

    /// `disposition` field value of the execute request.
    ///
    /// Arrow attachments are only returned under `INLINE_OR_EXTERNAL_LINKS`;
    /// JSON rows are only returned under `INLINE`.
    pub fn as_disposition(&self) -> &'static str {
        match self {
            ResultFormat::JsonArray => "INLINE",
            ResultFormat::ArrowStream => "INLINE_OR_EXTERNAL_LINKS",
        }
    }
}

impl FromStr for ResultFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "JSON_ARRAY" | "JSON" => Ok(ResultFormat::JsonArray),
            "ARROW_STREAM" | "ARROW" => Ok(ResultFormat::ArrowStream),
            other => Err(CatalogErrorHelper::invalid_argument()
                .message(format!("unknown result format '{}'", other))),
        }
    }
}

/// Compression codec for result data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionCodec {
    #[default]
    None,
    Lz4Frame,
}

impl CompressionCodec {
    /// Parse compression codec from manifest field value.
    pub fn from_manifest(value: Option<&str>) -> Self {
        match value {
            Some("LZ4_FRAME") => Self::Lz4Frame,
            _ => Self::None,
        }
    }
}

/// Request body for session creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    pub warehouse_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub session_configuration: HashMap<String, String>,
}

/// Response from session creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_codec_from_manifest() {
        assert_eq!(
            CompressionCodec::from_manifest(Some("LZ4_FRAME")),
            CompressionCodec::Lz4Frame
        );
        assert_eq!(
            CompressionCodec::from_manifest(Some("UNKNOWN")),
            CompressionCodec::None
        );
        assert_eq!(CompressionCodec::from_manifest(None), CompressionCodec::None);
    }

    #[test]
    fn test_result_format_parsing() {
        assert_eq!("json_array".parse::<ResultFormat>().unwrap(), ResultFormat::JsonArray);
        assert_eq!("arrow".parse::<ResultFormat>().unwrap(), ResultFormat::ArrowStream);
        assert!("csv".parse::<ResultFormat>().is_err());
        assert_eq!(ResultFormat::JsonArray.as_disposition(), "INLINE");
        assert_eq!(ResultFormat::ArrowStream.as_format(), "ARROW_STREAM");
    }

    #[test]
    fn test_execute_statement_request_serialization() {
        let req = ExecuteStatementRequest {
            warehouse_id: "abc123".to_string(),
            statement: "DESCRIBE FORMATTED t".to_string(),
            session_id: Some("session-1".to_string()),
            catalog: None,
            schema: None,
            disposition: "INLINE".to_string(),
            format: "JSON_ARRAY".to_string(),
            wait_timeout: Some("30s".to_string()),
            on_wait_timeout: None,
        };

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"warehouse_id\":\"abc123\""));
        assert!(json.contains("\"session_id\":\"session-1\""));
        assert!(!json.contains("\"catalog\""));
    }

    #[test]
    fn test_json_array_result_with_nulls() {
        let json = r##"{
            "statement_id": "stmt-1",
            "status": {"state": "SUCCEEDED"},
            "manifest": {
                "format": "JSON_ARRAY",
                "schema": {"column_count": 3, "columns": [
                    {"name": "col_name", "type_name": "STRING", "position": 0}
                ]},
                "total_chunk_count": 1
            },
            "result": {
                "chunk_index": 0,
                "data_array": [["# Partition Information", null, null], ["year", "string", ""]]
            }
        }"##;

        let response: StatementExecutionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status.state, StatementState::Succeeded);
        let rows = response.result.unwrap().data_array.unwrap();
        assert_eq!(rows[0][1], None);
        assert_eq!(rows[1][1].as_deref(), Some("string"));
    }

    #[test]
    fn test_failed_status_deserialization() {
        let json = r#"{
            "statement_id": "stmt-2",
            "status": {
                "state": "FAILED",
                "error": {"error_code": "BAD_REQUEST", "message": "[TABLE_OR_VIEW_NOT_FOUND] t"}
            }
        }"#;

        let response: StatementExecutionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status.state, StatementState::Failed);
        let error = response.status.error.unwrap();
        assert_eq!(error.error_code.as_deref(), Some("BAD_REQUEST"));
    }

    #[test]
    fn test_result_data_with_base64_attachment() {
        let json = r#"{
            "chunk_index": 0,
            "row_count": 10,
            "attachment": "SGVsbG8sIFdvcmxkIQ=="
        }"#;

        let result: ResultData = serde_json::from_str(json).unwrap();
        assert_eq!(result.attachment.unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_result_data_with_empty_or_null_attachment() {
        let result: ResultData = serde_json::from_str(r#"{"attachment": ""}"#).unwrap();
        assert!(result.attachment.is_none());

        let result: ResultData = serde_json::from_str(r#"{"attachment": null}"#).unwrap();
        assert!(result.attachment.is_none());
    }
}
