// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Backend integration tests against small Parquet datasets.
//!
//! DuckDB runs without the spatial extension so no network access is needed;
//! the Arrow backend runs its native queries end to end.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arrow::array::{ArrayRef, BinaryArray, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

use spatialbench_core::{BenchError, Engine, QueryId, ScaleFactor};
use spatialbench_engines::{ArrowEngine, DuckDbEngine};

const TIMEOUT: Duration = Duration::from_secs(30);

fn q(name: &str) -> QueryId {
    QueryId::new(name).unwrap()
}

fn point_wkb(x: f64, y: f64) -> Vec<u8> {
    let mut buf = vec![1u8];
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.extend_from_slice(&x.to_le_bytes());
    buf.extend_from_slice(&y.to_le_bytes());
    buf
}

/// Little-endian WKB for a polygon with a single ring.
fn polygon_wkb(ring: &[(f64, f64)]) -> Vec<u8> {
    let mut buf = vec![1u8];
    buf.extend_from_slice(&3u32.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.extend_from_slice(&(ring.len() as u32).to_le_bytes());
    for (x, y) in ring {
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
    }
    buf
}

fn write_parquet(path: &Path, batch: &RecordBatch) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    let file = File::create(path).expect("Failed to create parquet file");
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).expect("Failed to open writer");
    writer.write(batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn trip_batch(keys: &[i64], pickups: &[(f64, f64)]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("t_tripkey", DataType::Int64, false),
        Field::new("t_pickuploc", DataType::Binary, true),
    ]));
    let wkbs: Vec<Vec<u8>> = pickups.iter().map(|(x, y)| point_wkb(*x, *y)).collect();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(keys.to_vec())),
        Arc::new(BinaryArray::from_iter_values(wkbs.iter())),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

fn zone_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("z_zonekey", DataType::Int64, false),
        Field::new("z_name", DataType::Utf8, true),
        Field::new("z_boundary", DataType::Binary, true),
    ]));
    let coconino = polygon_wkb(&[
        (-112.5, 34.5),
        (-111.0, 34.5),
        (-111.0, 35.5),
        (-112.5, 35.5),
        (-112.5, 34.5),
    ]);
    let elsewhere = polygon_wkb(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2])),
        Arc::new(StringArray::from(vec!["Coconino County", "Null Island"])),
        Arc::new(BinaryArray::from_iter_values([coconino, elsewhere].iter())),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

/// Three trips near Sedona (one split into its own partition) and one far away.
fn write_dataset(root: &Path) {
    write_parquet(
        &root.join("trip/part-0.parquet"),
        &trip_batch(&[1, 2], &[(-111.7610, 34.8697), (-111.70, 34.90)]),
    );
    write_parquet(
        &root.join("trip/part-1.parquet"),
        &trip_batch(&[3, 4], &[(-111.5, 35.0), (-80.0, 25.0)]),
    );
    write_parquet(&root.join("zone.parquet"), &zone_batch());
}

#[test]
fn test_arrow_engine_end_to_end() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_dataset(temp_dir.path());

    let mut engine = ArrowEngine::new();
    engine.connect().unwrap();
    engine.load_data(temp_dir.path(), ScaleFactor::default()).unwrap();
    assert_eq!(engine.loaded_rows("trip"), 4);
    assert_eq!(engine.loaded_rows("zone"), 2);

    let q1 = engine.run_query(&q("q1"), "", TIMEOUT);
    assert!(q1.is_success(), "{:?}", q1.error_message());
    assert_eq!(q1.row_count(), 3);

    let q2 = engine.run_query(&q("q2"), "", TIMEOUT);
    assert!(q2.is_success(), "{:?}", q2.error_message());
    assert_eq!(q2.row_count(), 1);

    let q3 = engine.run_query(&q("q3"), "", TIMEOUT);
    assert!(!q3.is_success());
    assert_eq!(q3.error_message(), Some("Query function 'q3' not found"));

    engine.close();
    engine.close();
    assert_eq!(engine.loaded_rows("trip"), 0);
}

#[test]
fn test_arrow_engine_requires_trip_table() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_parquet(&temp_dir.path().join("zone.parquet"), &zone_batch());

    let mut engine = ArrowEngine::new();
    engine.connect().unwrap();
    let err = engine
        .load_data(temp_dir.path(), ScaleFactor::default())
        .unwrap_err();
    assert!(matches!(err, BenchError::Load { ref table, .. } if table == "trip"));
}

#[test]
fn test_arrow_engine_missing_data_dir() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let mut engine = ArrowEngine::new();
    engine.connect().unwrap();
    let err = engine
        .load_data(&temp_dir.path().join("missing"), ScaleFactor::default())
        .unwrap_err();
    assert!(matches!(err, BenchError::DataDirNotFound { .. }));
}

#[test]
fn test_duckdb_views_over_parquet() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_dataset(temp_dir.path());

    let mut engine = DuckDbEngine::without_spatial();
    engine.connect().unwrap();
    engine.load_data(temp_dir.path(), ScaleFactor::default()).unwrap();
    assert_eq!(engine.views(), &["trip", "zone"]);
    assert!(engine.version().starts_with('v'));

    let record = engine.run_query(&q("q1"), "SELECT t_tripkey FROM trip ORDER BY t_tripkey", TIMEOUT);
    assert!(record.is_success(), "{:?}", record.error_message());
    assert_eq!(record.row_count(), 4);
    assert!(record.duration_seconds() >= 0.0);

    let record = engine.run_query(&q("q2"), "SELECT * FROM no_such_table", TIMEOUT);
    assert!(!record.is_success());
    assert_eq!(record.row_count(), 0);
    assert!(record.error_message().unwrap().contains("no_such_table"));

    engine.warmup().unwrap();
    engine.close();
    engine.close();

    let record = engine.run_query(&q("q1"), "SELECT 1", TIMEOUT);
    assert!(!record.is_success());
}

#[test]
fn test_duckdb_load_before_connect() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut engine = DuckDbEngine::without_spatial();

    let err = engine
        .load_data(temp_dir.path(), ScaleFactor::default())
        .unwrap_err();
    assert!(matches!(err, BenchError::Connection { .. }));
}

#[test]
fn test_duckdb_missing_data_dir() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut engine = DuckDbEngine::without_spatial();
    engine.connect().unwrap();

    let err = engine
        .load_data(&temp_dir.path().join("missing"), ScaleFactor::default())
        .unwrap_err();
    assert!(matches!(err, BenchError::DataDirNotFound { .. }));
    engine.close();
}
