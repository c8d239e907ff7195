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

//! Row-oriented access to catalog query results.
//!
//! This module provides:
//! - [`RowCursor`]: forward-only cursor with 1-indexed textual field access
//! - [`MemoryRowCursor`]: cursor over rows already held in memory
//! - `arrow`: conversion of Arrow IPC result data into rows

pub mod arrow;

use crate::error::{CatalogErrorHelper, Result};
use std::collections::VecDeque;

/// Textual rendering of a SQL NULL field.
///
/// Describe output marks list ends and blank separator rows with NULL type
/// fields, so NULL must stay distinguishable from the empty string.
pub const NULL_FIELD: &str = "NULL";

/// One result row. `None` is a SQL NULL.
pub type Row = Vec<Option<String>>;

/// Ordered, forward-only sequence of rows.
///
/// A freshly returned cursor is positioned *before* the first row; call
/// [`RowCursor::next`] to move onto it. Once a row has been left it cannot be
/// read again.
pub trait RowCursor: Send {
    /// Advance to the next row. Returns `false` at the end of the sequence.
    fn next(&mut self) -> Result<bool>;

    /// 1-indexed textual field of the current row.
    ///
    /// Fails with `MalformedRow` when `index` is zero or exceeds the row's
    /// field count, and with `InvalidState` when not positioned on a row.
    fn field(&self, index: usize) -> Result<&str>;

    /// Release the underlying result. Further `next` calls return `false`.
    fn close(&mut self) -> Result<()>;
}

/// Resolve a 1-indexed field on `row`, shared by the cursor implementations.
pub(crate) fn row_field(row: Option<&Row>, index: usize) -> Result<&str> {
    let row = row.ok_or_else(|| {
        CatalogErrorHelper::invalid_state().message("cursor is not positioned on a row")
    })?;
    if index == 0 || index > row.len() {
        return Err(CatalogErrorHelper::malformed_row().message(format!(
            "field {} requested from a row with {} fields",
            index,
            row.len()
        )));
    }
    Ok(row[index - 1].as_deref().unwrap_or(NULL_FIELD))
}

/// Cursor over rows held in memory.
///
/// Used for inline JSON results and as the synthetic cursor in tests.
#[derive(Debug, Default)]
pub struct MemoryRowCursor {
    pending: VecDeque<Row>,
    current: Option<Row>,
    closed: bool,
}

impl MemoryRowCursor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            pending: VecDeque::from(rows),
            current: None,
            closed: false,
        }
    }

    /// Build a cursor from non-null textual rows.
    pub fn from_text_rows<R, F>(rows: R) -> Self
    where
        R: IntoIterator<Item = F>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|f| Some(f.into())).collect())
                .collect(),
        )
    }

    /// Append rows behind the ones not yet read.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.pending.extend(rows);
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RowCursor for MemoryRowCursor {
    fn next(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        self.current = self.pending.pop_front();
        Ok(self.current.is_some())
    }

    fn field(&self, index: usize) -> Result<&str> {
        row_field(self.current.as_ref(), index)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.current = None;
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_memory_cursor_is_forward_only() {
        let mut cursor = MemoryRowCursor::from_text_rows(vec![vec!["a", "1"], vec!["b", "2"]]);

        assert!(cursor.next().unwrap());
        assert_eq!(cursor.field(1).unwrap(), "a");
        assert_eq!(cursor.field(2).unwrap(), "1");

        assert!(cursor.next().unwrap());
        assert_eq!(cursor.field(1).unwrap(), "b");

        assert!(!cursor.next().unwrap());
        assert!(!cursor.next().unwrap());
    }

    #[test]
    fn test_field_out_of_range_is_malformed_row() {
        let mut cursor = MemoryRowCursor::from_text_rows(vec![vec!["only"]]);
        cursor.next().unwrap();

        assert_eq!(cursor.field(2).unwrap_err().kind(), ErrorKind::MalformedRow);
        assert_eq!(cursor.field(0).unwrap_err().kind(), ErrorKind::MalformedRow);
    }

    #[test]
    fn test_field_before_first_row_is_invalid_state() {
        let cursor = MemoryRowCursor::from_text_rows(vec![vec!["x"]]);
        assert_eq!(cursor.field(1).unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_null_field_renders_as_null_text() {
        let mut cursor = MemoryRowCursor::new(vec![vec![Some("# Partition Information".into()), None]]);
        cursor.next().unwrap();
        assert_eq!(cursor.field(2).unwrap(), NULL_FIELD);
    }

    #[test]
    fn test_close_discards_remaining_rows() {
        let mut cursor = MemoryRowCursor::from_text_rows(vec![vec!["a"], vec!["b"]]);
        cursor.next().unwrap();
        cursor.close().unwrap();

        assert!(cursor.is_closed());
        assert_eq!(cursor.remaining(), 0);
        assert!(!cursor.next().unwrap());
    }
}
