// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Column access helpers for WKB geometry and string columns.

use arrow::array::{Array, AsArray};
use arrow::record_batch::RecordBatch;
use arrow::datatypes::DataType;
use geo::Geometry;
use geo_traits::to_geo::ToGeoGeometry;

use super::QueryError;

/// Look up a column by name.
pub(crate) fn column<'a>(batch: &'a RecordBatch, table: &str, name: &str) -> Result<&'a dyn Array, QueryError> {
    batch
        .column_by_name(name)
        .map(|c| c.as_ref())
        .ok_or_else(|| QueryError::MissingColumn {
            table: table.to_string(),
            column: name.to_string(),
        })
}

/// Raw bytes of a binary cell, `None` for null.
fn binary_value<'a>(array: &'a dyn Array, column: &str, row: usize) -> Result<Option<&'a [u8]>, QueryError> {
    if array.is_null(row) {
        return Ok(None);
    }
    let bytes = match array.data_type() {
        DataType::Binary => array.as_binary::<i32>().value(row),
        DataType::LargeBinary => array.as_binary::<i64>().value(row),
        DataType::BinaryView => array.as_binary_view().value(row),
        other => {
            return Err(QueryError::UnsupportedType {
                column: column.to_string(),
                data_type: other.clone(),
            })
        }
    };
    Ok(Some(bytes))
}

/// Decode the WKB geometry stored at `row`, `None` for null.
pub(crate) fn geometry_at(array: &dyn Array, column: &str, row: usize) -> Result<Option<Geometry<f64>>, QueryError> {
    let Some(bytes) = binary_value(array, column, row)? else {
        return Ok(None);
    };
    let wkb = wkb::reader::read_wkb(bytes).map_err(|e| QueryError::Geometry {
        column: column.to_string(),
        row,
        reason: e.to_string(),
    })?;
    Ok(Some(wkb.to_geometry()))
}

/// String value stored at `row`, `None` for null.
pub(crate) fn string_at<'a>(array: &'a dyn Array, column: &str, row: usize) -> Result<Option<&'a str>, QueryError> {
    if array.is_null(row) {
        return Ok(None);
    }
    let value = match array.data_type() {
        DataType::Utf8 => array.as_string::<i32>().value(row),
        DataType::LargeUtf8 => array.as_string::<i64>().value(row),
        DataType::Utf8View => array.as_string_view().value(row),
        other => {
            return Err(QueryError::UnsupportedType {
                column: column.to_string(),
                data_type: other.clone(),
            })
        }
    };
    Ok(Some(value))
}
