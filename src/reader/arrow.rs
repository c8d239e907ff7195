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

//! Arrow IPC decoding for inline `ARROW_STREAM` results.
//!
//! Inline attachments are Arrow IPC streaming format bytes, optionally LZ4
//! frame compressed. Describe and partition listings only ever return string
//! columns, so batches are flattened into textual [`Row`]s.

use crate::error::{CatalogErrorHelper, Result};
use crate::reader::Row;
use crate::types::sea::CompressionCodec;
use arrow_array::cast::AsArray;
use arrow_array::{Array, RecordBatch};
use arrow_ipc::reader::StreamReader;
use arrow_schema::DataType;
use lz4_flex::frame::FrameDecoder;
use std::io::{Cursor, Read};

/// Parse an Arrow IPC stream into RecordBatches.
///
/// # Errors
/// - If LZ4 decompression fails
/// - If Arrow IPC parsing fails
pub fn parse_arrow_ipc(data: &[u8], compression: CompressionCodec) -> Result<Vec<RecordBatch>> {
    let decompressed: Vec<u8>;
    let bytes: &[u8] = match compression {
        CompressionCodec::Lz4Frame => {
            let mut decoder = FrameDecoder::new(Cursor::new(data));
            let mut buf = Vec::new();
            decoder.read_to_end(&mut buf).map_err(|e| {
                CatalogErrorHelper::io().message(format!("LZ4 decompression failed: {}", e))
            })?;
            decompressed = buf;
            &decompressed
        }
        CompressionCodec::None => data,
    };

    let reader = StreamReader::try_new(Cursor::new(bytes), None).map_err(|e| {
        CatalogErrorHelper::io().message(format!("Failed to create Arrow IPC reader: {}", e))
    })?;

    reader
        .into_iter()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| CatalogErrorHelper::io().message(format!("Failed to read Arrow batches: {}", e)))
}

/// Flatten a batch of string columns into rows.
pub fn record_batch_rows(batch: &RecordBatch) -> Result<Vec<Row>> {
    let mut rows: Vec<Row> = (0..batch.num_rows())
        .map(|_| Vec::with_capacity(batch.num_columns()))
        .collect();

    for (col_idx, array) in batch.columns().iter().enumerate() {
        match array.data_type() {
            DataType::Utf8 => {
                let values = array.as_string::<i32>();
                for (row, value) in rows.iter_mut().zip(values.iter()) {
                    row.push(value.map(str::to_string));
                }
            }
            DataType::LargeUtf8 => {
                let values = array.as_string::<i64>();
                for (row, value) in rows.iter_mut().zip(values.iter()) {
                    row.push(value.map(str::to_string));
                }
            }
            DataType::Null => {
                for row in rows.iter_mut() {
                    row.push(None);
                }
            }
            dt => {
                return Err(CatalogErrorHelper::malformed_row().message(format!(
                    "Expected string column '{}', got {:?}",
                    batch.schema().field(col_idx).name(),
                    dt
                )));
            }
        }
    }

    Ok(rows)
}

/// Decode an inline attachment straight into rows.
pub fn attachment_rows(data: &[u8], compression: CompressionCodec) -> Result<Vec<Row>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let batches = parse_arrow_ipc(data, compression)?;
    tracing::debug!(
        "Parsed inline Arrow data: {} batches, {} total rows",
        batches.len(),
        batches.iter().map(|b| b.num_rows()).sum::<usize>()
    );

    let mut rows = Vec::new();
    for batch in &batches {
        rows.extend(record_batch_rows(batch)?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use arrow_array::{Int32Array, LargeStringArray, StringArray};
    use arrow_ipc::writer::StreamWriter;
    use arrow_schema::{Field, Schema};
    use lz4_flex::frame::FrameEncoder;
    use std::io::Write;
    use std::sync::Arc;

    fn describe_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("col_name", DataType::Utf8, true),
            Field::new("data_type", DataType::Utf8, true),
            Field::new("comment", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("id"), Some("Location:")])),
                Arc::new(StringArray::from(vec![Some("int"), Some("/warehouse/t")])),
                Arc::new(StringArray::from(vec![None::<&str>, None])),
            ],
        )
        .unwrap()
    }

    fn to_ipc(batches: &[RecordBatch]) -> Vec<u8> {
        let schema = batches[0].schema();
        let mut buffer = Vec::new();
        {
            let mut writer = StreamWriter::try_new(&mut buffer, &schema).unwrap();
            for batch in batches {
                writer.write(batch).unwrap();
            }
            writer.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_record_batch_rows_keeps_nulls() {
        let rows = record_batch_rows(&describe_batch()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![Some("id".to_string()), Some("int".to_string()), None]
        );
        assert_eq!(rows[1][0].as_deref(), Some("Location:"));
    }

    #[test]
    fn test_record_batch_rows_large_utf8() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "partition",
            DataType::LargeUtf8,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(LargeStringArray::from(vec!["year=2020/month=03"]))],
        )
        .unwrap();

        let rows = record_batch_rows(&batch).unwrap();
        assert_eq!(rows, vec![vec![Some("year=2020/month=03".to_string())]]);
    }

    #[test]
    fn test_record_batch_rows_rejects_non_string_columns() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int32, false)]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1]))]).unwrap();

        let err = record_batch_rows(&batch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedRow);
    }

    #[test]
    fn test_attachment_rows_uncompressed_and_lz4() {
        let ipc = to_ipc(&[describe_batch(), describe_batch()]);
        let rows = attachment_rows(&ipc, CompressionCodec::None).unwrap();
        assert_eq!(rows.len(), 4);

        let mut compressed = Vec::new();
        {
            let mut encoder = FrameEncoder::new(&mut compressed);
            encoder.write_all(&ipc).unwrap();
            encoder.finish().unwrap();
        }
        let rows = attachment_rows(&compressed, CompressionCodec::Lz4Frame).unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_attachment_rows_invalid_data() {
        let err = attachment_rows(b"not arrow", CompressionCodec::None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert!(attachment_rows(&[], CompressionCodec::None).unwrap().is_empty());
    }
}
