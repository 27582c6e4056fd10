use std::io::Cursor;
use std::sync::Arc;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use bytes::Bytes;
use log::{debug, info};
use object_store::ObjectStore;
use object_store::path::Path as ObjectPath;

use crate::conf::ReadConfig;
use crate::core::{SchemaMode, TableSchema, TabulaError};
use crate::frame::DataFrame;
use crate::session::Session;

use super::store::{is_data_file, list_objects};

/// Resolved read settings, validated from `ReadConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOptions {
    pub delimiter: u8,
    pub header: bool,
    pub schema: SchemaMode,
    pub infer_max_records: usize,
    pub partition_rows: usize,
}

impl TryFrom<&ReadConfig> for ReadOptions {
    type Error = TabulaError;

    fn try_from(config: &ReadConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            delimiter: config.delimiter_byte()?,
            header: config.header,
            schema: config.schema_mode()?,
            infer_max_records: config.infer_max_records,
            partition_rows: config.partition_rows,
        })
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: false,
            schema: SchemaMode::Strings,
            infer_max_records: 1000,
            partition_rows: 8192,
        }
    }
}

/// Builder that loads delimited text into a [DataFrame].
///
/// Created by [Session::read], starting from the session's read defaults.
#[derive(Debug, Clone)]
pub struct CsvReader {
    session: Session,
    options: ReadOptions,
}

impl CsvReader {
    pub fn new(session: Session, options: ReadOptions) -> Self {
        Self { session, options }
    }

    /// Field separator, e.g. `b'|'`.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.options.delimiter = delimiter;
        self
    }

    /// Whether the first line of every input holds column names.
    pub fn header(mut self, header: bool) -> Self {
        self.options.header = header;
        self
    }

    pub fn infer_schema(mut self) -> Self {
        self.options.schema = SchemaMode::Infer;
        self
    }

    pub fn schema(mut self, schema: TableSchema) -> Self {
        self.options.schema = SchemaMode::Explicit(schema);
        self
    }

    /// Read every column as a string.
    pub fn strings(mut self) -> Self {
        self.options.schema = SchemaMode::Strings;
        self
    }

    pub fn infer_max_records(mut self, records: usize) -> Self {
        self.options.infer_max_records = records;
        self
    }

    /// Maximum rows per partition.
    pub fn partition_rows(mut self, rows: usize) -> Self {
        self.options.partition_rows = rows;
        self
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Loads a single object, or every data file under the `path` prefix.
    pub async fn csv(self, path: &str) -> Result<DataFrame, TabulaError> {
        if self.options.partition_rows == 0 {
            return Err(TabulaError::InvalidArgument(
                "partition_rows must be positive".to_string(),
            ));
        }

        let store = self.session.store();
        let location = ObjectPath::from(path);
        let inputs = resolve_inputs(&store, &location).await?;

        info!("Loading {} file(s) from '{}'", inputs.len(), location);

        let mut contents = Vec::with_capacity(inputs.len());
        for input in &inputs {
            let bytes = store.get(input).await?.bytes().await?;
            debug!("Fetched '{}' ({} bytes)", input, bytes.len());
            contents.push(bytes);
        }

        let schema = self.resolve_schema(&contents)?;

        let mut partitions = Vec::new();
        for bytes in contents {
            let reader = ReaderBuilder::new(schema.clone())
                .with_format(self.format())
                .with_batch_size(self.options.partition_rows)
                .build(Cursor::new(bytes))?;
            for batch in reader {
                partitions.push(batch?);
            }
        }

        let frame = DataFrame::new(self.session, schema, partitions)?;
        info!(
            "Loaded {} rows into {} partitions from '{}'",
            frame.count(),
            frame.num_partitions(),
            location
        );
        Ok(frame)
    }

    fn format(&self) -> Format {
        Format::default()
            .with_delimiter(self.options.delimiter)
            .with_header(self.options.header)
    }

    fn resolve_schema(&self, inputs: &[Bytes]) -> Result<SchemaRef, TabulaError> {
        match &self.options.schema {
            SchemaMode::Explicit(schema) => Ok(schema.to_arrow()),
            SchemaMode::Infer => {
                let inferred = self.infer(inputs)?;
                // a column left empty by the whole sample still holds text
                Ok(Arc::new(self.default_names(&inferred, |field| {
                    match field.data_type() {
                        DataType::Null => DataType::Utf8,
                        data_type => data_type.clone(),
                    }
                })))
            }
            SchemaMode::Strings => {
                let inferred = self.infer(inputs)?;
                Ok(Arc::new(self.default_names(&inferred, |_| DataType::Utf8)))
            }
        }
    }

    /// Infers every input in order, `infer_max_records` rows in total, and
    /// widens the per-input schemas into one.
    fn infer(&self, inputs: &[Bytes]) -> Result<Schema, TabulaError> {
        let mut merged: Option<Schema> = None;
        let mut remaining = self.options.infer_max_records;

        for bytes in inputs {
            let (schema, records) = self
                .format()
                .infer_schema(Cursor::new(bytes.clone()), Some(remaining))?;
            debug!(
                "Inferred {} columns from {} records",
                schema.fields().len(),
                records
            );
            merged = Some(match merged {
                Some(previous) => merge_schemas(&previous, &schema),
                None => schema,
            });

            remaining = remaining.saturating_sub(records);
            if remaining == 0 {
                break;
            }
        }

        merged.ok_or_else(|| TabulaError::SchemaError("no input to infer a schema from".to_string()))
    }

    /// Headerless columns are named `_c0`, `_c1`, ...
    fn default_names(&self, schema: &Schema, data_type: impl Fn(&Field) -> DataType) -> Schema {
        let fields: Vec<Field> = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let name = if self.options.header {
                    field.name().clone()
                } else {
                    format!("_c{index}")
                };
                Field::new(name, data_type(field), true)
            })
            .collect();
        Schema::new(fields)
    }
}

/// Positional merge; the wider input decides the column count and the
/// first input that has a column names it.
fn merge_schemas(left: &Schema, right: &Schema) -> Schema {
    let width = left.fields().len().max(right.fields().len());
    let fields: Vec<Field> = (0..width)
        .filter_map(|index| match (left.fields().get(index), right.fields().get(index)) {
            (Some(a), Some(b)) => Some(Field::new(
                a.name(),
                widen(a.data_type(), b.data_type()),
                true,
            )),
            (a, b) => a.or(b).map(|field| field.as_ref().clone()),
        })
        .collect();
    Schema::new(fields)
}

/// Smallest type both inferred types parse as.
fn widen(left: &DataType, right: &DataType) -> DataType {
    match (left, right) {
        (a, b) if a == b => a.clone(),
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }
        _ => DataType::Utf8,
    }
}

async fn resolve_inputs(
    store: &Arc<dyn ObjectStore>,
    location: &ObjectPath,
) -> Result<Vec<ObjectPath>, TabulaError> {
    match store.head(location).await {
        Ok(meta) => return Ok(vec![meta.location]),
        // a prefix, not an object
        Err(object_store::Error::NotFound { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    let inputs: Vec<ObjectPath> = list_objects(store, location)
        .await?
        .into_iter()
        .filter(|path| is_data_file(path))
        .collect();

    if inputs.is_empty() {
        return Err(TabulaError::ObjectNotFound(location.to_string()));
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ColumnSchema, DType};
    use arrow::array::{AsArray, Array};
    use arrow::datatypes::{Float64Type, Int64Type};
    use object_store::PutPayload;

    async fn session_with(files: &[(&str, &str)]) -> Session {
        let session = Session::in_memory();
        for (path, text) in files {
            session
                .store()
                .put(&ObjectPath::from(*path), PutPayload::from(text.as_bytes().to_vec()))
                .await
                .unwrap();
        }
        session
    }

    #[tokio::test]
    async fn test_strings_mode_is_default() {
        let session = session_with(&[("in.txt", "1|A\n2|B\n")]).await;
        let frame = session.read().delimiter(b'|').csv("in.txt").await.unwrap();

        assert_eq!(frame.columns(), vec!["_c0", "_c1"]);
        for field in frame.schema().fields() {
            assert_eq!(field.data_type(), &DataType::Utf8);
        }
        assert_eq!(frame.count(), 2);
    }

    #[tokio::test]
    async fn test_infer_headerless() {
        let session = session_with(&[("in.txt", "1|A|2020-01-01\n2|B|2020-01-02\n")]).await;
        let frame = session
            .read()
            .delimiter(b'|')
            .infer_schema()
            .csv("in.txt")
            .await
            .unwrap();

        let schema = frame.schema();
        assert_eq!(schema.field(0).name(), "_c0");
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Date32);
    }

    #[tokio::test]
    async fn test_header_names_kept() {
        let session = session_with(&[("in.csv", "id,name\n7,x\n8,y\n")]).await;
        let frame = session
            .read()
            .header(true)
            .infer_schema()
            .csv("in.csv")
            .await
            .unwrap();

        assert_eq!(frame.columns(), vec!["id", "name"]);
        let batch = frame.collect().unwrap();
        let ids = batch.column(0).as_primitive::<Int64Type>();
        assert_eq!(ids.values().to_vec(), vec![7, 8]);
    }

    #[tokio::test]
    async fn test_explicit_schema() {
        let session = session_with(&[("in.txt", "1|A\n2|\n")]).await;
        let schema = TableSchema::new(vec![
            ColumnSchema::new("id", DType::Int32),
            ColumnSchema::new("label", DType::Utf8),
        ]);
        let frame = session
            .read()
            .delimiter(b'|')
            .schema(schema)
            .csv("in.txt")
            .await
            .unwrap();

        assert_eq!(frame.columns(), vec!["id", "label"]);
        assert_eq!(frame.schema().field(0).data_type(), &DataType::Int32);
    }

    #[tokio::test]
    async fn test_explicit_schema_type_mismatch_fails() {
        let session = session_with(&[("in.txt", "1|A\nnot-a-number|B\n")]).await;
        let schema = TableSchema::new(vec![
            ColumnSchema::new("id", DType::Int64),
            ColumnSchema::new("label", DType::Utf8),
        ]);
        let result = session
            .read()
            .delimiter(b'|')
            .schema(schema)
            .csv("in.txt")
            .await;

        assert!(matches!(result, Err(TabulaError::ArrowError(_))));
    }

    #[tokio::test]
    async fn test_partition_rows_splits_batches() {
        let session = session_with(&[("in.txt", "1\n2\n3\n4\n5\n")]).await;
        let frame = session
            .read()
            .partition_rows(2)
            .csv("in.txt")
            .await
            .unwrap();

        assert_eq!(frame.num_partitions(), 3);
        assert_eq!(frame.count(), 5);
    }

    #[tokio::test]
    async fn test_prefix_reads_data_files_in_order() {
        let session = session_with(&[
            ("dir/part-00001.csv", "3\n"),
            ("dir/part-00000.csv", "1\n2\n"),
            ("dir/_SUCCESS", ""),
        ])
        .await;
        let frame = session.read().infer_schema().csv("dir").await.unwrap();

        let batch = frame.collect().unwrap();
        assert_eq!(batch.num_rows(), 3);
        let values = batch.column(0).as_primitive::<Int64Type>();
        assert_eq!(values.values().to_vec(), vec![1, 2, 3]);
        assert_eq!(values.null_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_sample_column_reads_as_text() {
        let session = session_with(&[("in.txt", "1|\n2|\n3|late\n")]).await;
        let frame = session
            .read()
            .delimiter(b'|')
            .infer_schema()
            .infer_max_records(2)
            .csv("in.txt")
            .await
            .unwrap();

        assert_eq!(frame.schema().field(1).data_type(), &DataType::Utf8);
        let batch = frame.collect().unwrap();
        let late = batch.column(1).as_string::<i32>();
        assert_eq!(late.null_count(), 2);
        assert_eq!(late.value(2), "late");
    }

    #[tokio::test]
    async fn test_later_input_fills_empty_column() {
        let session = session_with(&[
            ("dir/part-00000.csv", "1|\n2|\n"),
            ("dir/part-00001.csv", "3|x\n4|y\n"),
        ])
        .await;
        let frame = session
            .read()
            .delimiter(b'|')
            .infer_schema()
            .csv("dir")
            .await
            .unwrap();

        assert_eq!(frame.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(frame.schema().field(1).data_type(), &DataType::Utf8);
        let batch = frame.collect().unwrap();
        let labels: Vec<Option<&str>> = batch.column(1).as_string::<i32>().iter().collect();
        assert_eq!(labels, vec![None, None, Some("x"), Some("y")]);
    }

    #[tokio::test]
    async fn test_inputs_widen_integer_to_double() {
        let session = session_with(&[("d/a.txt", "1\n2\n"), ("d/b.txt", "2.5\n")]).await;
        let frame = session.read().infer_schema().csv("d").await.unwrap();

        assert_eq!(frame.schema().field(0).data_type(), &DataType::Float64);
        let batch = frame.collect().unwrap();
        let values = batch.column(0).as_primitive::<Float64Type>();
        assert_eq!(values.values().to_vec(), vec![1.0, 2.0, 2.5]);
    }

    #[tokio::test]
    async fn test_inference_budget_spans_inputs() {
        // the budget runs out on the first input, so the second is not sampled
        let session = session_with(&[("d/a.txt", "1\n2\n"), ("d/b.txt", "x\n")]).await;
        let result = session
            .read()
            .infer_schema()
            .infer_max_records(2)
            .csv("d")
            .await;
        assert!(matches!(result, Err(TabulaError::ArrowError(_))));

        let frame = session.read().infer_schema().csv("d").await.unwrap();
        assert_eq!(frame.schema().field(0).data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_widen() {
        assert_eq!(widen(&DataType::Int64, &DataType::Int64), DataType::Int64);
        assert_eq!(widen(&DataType::Null, &DataType::Date32), DataType::Date32);
        assert_eq!(widen(&DataType::Boolean, &DataType::Null), DataType::Boolean);
        assert_eq!(widen(&DataType::Float64, &DataType::Int64), DataType::Float64);
        assert_eq!(widen(&DataType::Int64, &DataType::Boolean), DataType::Utf8);
        assert_eq!(widen(&DataType::Date32, &DataType::Float64), DataType::Utf8);
    }

    #[test]
    fn test_merge_keeps_wider_input() {
        let narrow = Schema::new(vec![Field::new("a", DataType::Int64, true)]);
        let wide = Schema::new(vec![
            Field::new("b", DataType::Float64, true),
            Field::new("c", DataType::Utf8, true),
        ]);
        let merged = merge_schemas(&narrow, &wide);

        assert_eq!(merged.fields().len(), 2);
        assert_eq!(merged.field(0).name(), "a");
        assert_eq!(merged.field(0).data_type(), &DataType::Float64);
        assert_eq!(merged.field(1).name(), "c");
    }

    #[tokio::test]
    async fn test_missing_input() {
        let session = Session::in_memory();
        let result = session.read().csv("nope.txt").await;
        assert_eq!(
            result.unwrap_err(),
            TabulaError::ObjectNotFound("nope.txt".to_string())
        );
    }

    #[tokio::test]
    async fn test_zero_partition_rows_rejected() {
        let session = session_with(&[("in.txt", "1\n")]).await;
        let result = session.read().partition_rows(0).csv("in.txt").await;
        assert!(matches!(result, Err(TabulaError::InvalidArgument(_))));
    }
}
