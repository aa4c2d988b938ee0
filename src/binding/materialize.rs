// ABOUTME: Row materializer that drains a cursor into the bound destination
// ABOUTME: Handles single-row vs collection semantics and the bytes-to-text coercion for mappings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::destination::{Destination, RecordTarget};
use super::BindingContext;
use crate::database_plugins::RowCursor;
use crate::errors::{BindError, BindResult};
use crate::value::{MapRow, Value};
use tracing::debug;

/// Populate the context's destination from `cursor`
///
/// Dispatches on the destination captured at bind time:
/// - record: exactly one row is scanned; an empty cursor is `NotFound`,
///   further rows are left unread
/// - record list: every row is scanned into a fresh copy of the template and
///   appended in arrival order
/// - mapping: every row is written into the same map, so the last row wins
/// - mapping list: one new map per row, appended in arrival order
///
/// Rows appended before a failing row stay appended. The cursor is not
/// closed here; its owner drops it.
///
/// Returns the number of rows materialized.
///
/// # Errors
///
/// Returns `NotFound` for an empty single-record read, a scan error when a row
/// does not fit the destination, the cursor's own error when advancing fails,
/// and a bind value error for table-name destinations.
pub async fn materialize(
    cursor: &mut (dyn RowCursor + '_),
    context: &mut BindingContext<'_>,
) -> BindResult<usize> {
    let BindingContext {
        shape,
        fields,
        row_limit,
        target,
        ..
    } = context;

    let count = match target {
        Destination::Record(record) => scan_one(cursor, fields, record.as_mut()).await?,
        Destination::RecordList(records) => {
            scan_records(cursor, fields, *row_limit, records.as_mut()).await?
        }
        Destination::Mapping(row) => {
            scan_map_rows(cursor, *row_limit, |values| row.extend(values)).await?
        }
        Destination::MappingList(rows) => {
            scan_map_rows(cursor, *row_limit, |values| rows.push(values)).await?
        }
        Destination::Table(_) | Destination::Unsupported(_) => {
            return Err(BindError::bind_value());
        }
    };

    debug!(shape = %shape, rows = count, "Materialized rows");
    Ok(count)
}

async fn scan_one(
    cursor: &mut (dyn RowCursor + '_),
    fields: &[String],
    record: &mut (dyn RecordTarget + '_),
) -> BindResult<usize> {
    let Some(values) = cursor.next_row().await? else {
        return Err(BindError::not_found());
    };
    record.scan_row(fields, values)?;
    Ok(1)
}

async fn scan_records(
    cursor: &mut (dyn RowCursor + '_),
    fields: &[String],
    limit: Option<usize>,
    records: &mut (dyn RecordTarget + '_),
) -> BindResult<usize> {
    let mut count = 0;
    while limit.is_none_or(|limit| count < limit) {
        let Some(values) = cursor.next_row().await? else {
            break;
        };
        records.scan_row(fields, values).map_err(|e| {
            BindError::scan(format!(
                "row {count} into {}: {}",
                records.type_name(),
                e.message
            ))
        })?;
        count += 1;
    }
    Ok(count)
}

async fn scan_map_rows<F>(
    cursor: &mut (dyn RowCursor + '_),
    limit: Option<usize>,
    mut sink: F,
) -> BindResult<usize>
where
    F: FnMut(MapRow) + Send,
{
    let mut columns: Option<Vec<String>> = None;
    let mut count = 0;
    while limit.is_none_or(|limit| count < limit) {
        let Some(values) = cursor.next_row().await? else {
            break;
        };
        // Column list is stable for the whole cursor
        let columns = columns.get_or_insert_with(|| cursor.columns().to_vec());
        if columns.len() != values.len() {
            return Err(BindError::scan(format!(
                "row {count} has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }

        let row: MapRow = columns
            .iter()
            .cloned()
            .zip(values.into_iter().map(Value::into_text_if_bytes))
            .collect();
        sink(row);
        count += 1;
    }
    Ok(count)
}
