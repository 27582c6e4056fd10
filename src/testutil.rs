//! Test and benchmark utilities.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::sync::Arc;

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use object_store::PutPayload;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use crate::conf::Config;
use crate::core::{ColumnSchema, DType, TableSchema};
use crate::session::Session;

/// Three-row pipe-delimited sample: integer, string and date columns.
pub const SCENARIO_TEXT: &str = "1|A|2020-01-01\n2|B|2020-01-02\n3|A|2020-01-03\n";

/// RNG seed for deterministic synthetic data
pub const RNG_SEED: u64 = 42;

const CHANNELS: &[&str] = &["R", "B", "C"];

/// Session over a LocalFileSystem rooted at a fresh temp dir.
/// Returns the TempDir too; keep it alive for the session's lifetime.
pub fn local_session() -> (Session, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = LocalFileSystem::new_with_prefix(dir.path()).unwrap();
    let session = Session::with_store(Arc::new(store), Config::default()).unwrap();
    (session, dir)
}

pub async fn put_text(session: &Session, path: &str, text: &str) {
    session
        .store()
        .put(
            &ObjectPath::from(path),
            PutPayload::from(text.as_bytes().to_vec()),
        )
        .await
        .unwrap();
}

pub async fn get_text(session: &Session, path: &ObjectPath) -> String {
    let bytes = session
        .store()
        .get(path)
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Joins rows with `delimiter`, one line per row.
pub fn delimited_text(rows: &[Vec<String>], delimiter: char) -> String {
    rows.iter()
        .map(|row| format!("{}\n", row.join(&delimiter.to_string())))
        .collect()
}

/// Deterministic loan-like rows:
/// id (int), channel (string), rate (float), balance (int), origination (date).
pub fn generate_loan_rows(num_rows: usize, seed: u64) -> Vec<Vec<String>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_rows)
        .map(|i| {
            vec![
                (i + 1).to_string(),
                CHANNELS[rng.gen_range(0..CHANNELS.len())].to_string(),
                format!("{:.3}", rng.gen_range(2.0..8.0)),
                rng.gen_range(10_000..500_000).to_string(),
                format!(
                    "2020-{:02}-{:02}",
                    rng.gen_range(1..=12),
                    rng.gen_range(1..=28)
                ),
            ]
        })
        .collect()
}

/// Explicit schema matching what inference yields for `generate_loan_rows`.
pub fn loan_schema() -> TableSchema {
    TableSchema::new(vec![
        ColumnSchema::new("_c0", DType::Int64),
        ColumnSchema::new("_c1", DType::Utf8),
        ColumnSchema::new("_c2", DType::Float64),
        ColumnSchema::new("_c3", DType::Int64),
        ColumnSchema::new("_c4", DType::Date),
    ])
}

/// Display strings of one column, None for nulls.
pub fn column_values(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let index = batch.schema().index_of(name).unwrap();
    let column = batch.column(index);
    (0..column.len())
        .map(|row| {
            if column.is_null(row) {
                None
            } else {
                Some(array_value_to_string(column.as_ref(), row).unwrap())
            }
        })
        .collect()
}
