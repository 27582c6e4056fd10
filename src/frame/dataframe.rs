use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::core::{TabulaError, type_name};
use crate::io::CsvWriter;
use crate::session::Session;

use super::describe;

/// Immutable handle to a partitioned table.
///
/// Every transformation returns a new frame. Partitions are Arrow
/// record batches that share one schema; column order is preserved by
/// projection and renames.
#[derive(Debug, Clone)]
pub struct DataFrame {
    session: Session,
    schema: SchemaRef,
    partitions: Vec<RecordBatch>,
}

impl DataFrame {
    pub(crate) fn new(
        session: Session,
        schema: SchemaRef,
        partitions: Vec<RecordBatch>,
    ) -> Result<Self, TabulaError> {
        for (index, batch) in partitions.iter().enumerate() {
            if batch.schema().fields() != schema.fields() {
                return Err(TabulaError::SchemaError(format!(
                    "partition {index} schema {:?} does not match frame schema {:?}",
                    batch.schema(),
                    schema
                )));
            }
        }
        Ok(Self {
            session,
            schema,
            partitions,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn columns(&self) -> Vec<String> {
        self.schema.fields().iter().map(|f| f.name().clone()).collect()
    }

    /// `(column, type)` pairs in column order.
    pub fn dtypes(&self) -> Vec<(String, String)> {
        self.schema
            .fields()
            .iter()
            .map(|f| (f.name().clone(), type_name(f.data_type())))
            .collect()
    }

    /// Tree rendering of the schema.
    pub fn print_schema(&self) -> String {
        let mut out = String::from("root\n");
        for field in self.schema.fields() {
            let _ = writeln!(
                out,
                " |-- {}: {} (nullable = {})",
                field.name(),
                type_name(field.data_type()),
                field.is_nullable()
            );
        }
        out
    }

    pub fn partitions(&self) -> &[RecordBatch] {
        &self.partitions
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn count(&self) -> usize {
        self.partitions.iter().map(|b| b.num_rows()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Materializes every partition into one batch.
    pub fn collect(&self) -> Result<RecordBatch, TabulaError> {
        Ok(concat_batches(&self.schema, &self.partitions)?)
    }

    /// First `n` rows in partition order.
    pub fn head(&self, n: usize) -> Result<RecordBatch, TabulaError> {
        let mut remaining = n;
        let mut slices = Vec::new();
        for batch in &self.partitions {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(batch.num_rows());
            slices.push(batch.slice(0, take));
            remaining -= take;
        }
        Ok(concat_batches(&self.schema, &slices)?)
    }

    /// Renders the first `n` rows as an ASCII table.
    pub fn show(&self, n: usize) -> Result<String, TabulaError> {
        let head = self.head(n)?;
        Ok(pretty_format_batches(&[head])?.to_string())
    }

    /// Projects the named columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> Result<DataFrame, TabulaError> {
        let indices = columns
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>, _>>()?;

        let schema = Arc::new(self.schema.project(&indices)?);
        let partitions = self
            .partitions
            .iter()
            .map(|batch| batch.project(&indices))
            .collect::<Result<Vec<_>, _>>()?;

        DataFrame::new(self.session.clone(), schema, partitions)
    }

    pub fn with_column_renamed(&self, existing: &str, new: &str) -> Result<DataFrame, TabulaError> {
        let index = self.column_index(existing)?;
        let mut names = self.columns();
        names[index] = new.to_string();
        self.with_names(names)
    }

    /// Applies renames one at a time, so later pairs see earlier results.
    pub fn with_columns_renamed<'a, I>(&self, renames: I) -> Result<DataFrame, TabulaError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut names = self.columns();
        for (existing, new) in renames {
            let index = names
                .iter()
                .position(|name| name == existing)
                .ok_or_else(|| TabulaError::ColumnNotFound(existing.to_string()))?;
            names[index] = new.to_string();
            check_unique(&names)?;
        }
        self.with_names(names)
    }

    /// Replaces every column name at once.
    pub fn to_df(&self, names: &[&str]) -> Result<DataFrame, TabulaError> {
        if names.len() != self.schema.fields().len() {
            return Err(TabulaError::SchemaError(format!(
                "expected {} column names, got {}",
                self.schema.fields().len(),
                names.len()
            )));
        }
        self.with_names(names.iter().map(|n| n.to_string()).collect())
    }

    /// count, mean, stddev, min and max per column, as strings.
    ///
    /// `None` summarizes every numeric or string column.
    pub fn describe(&self, columns: Option<&[&str]>) -> Result<DataFrame, TabulaError> {
        describe::describe(self, columns)
    }

    /// Merges adjacent partitions down to at most `num_partitions`.
    pub fn coalesce(&self, num_partitions: usize) -> Result<DataFrame, TabulaError> {
        if num_partitions == 0 {
            return Err(TabulaError::InvalidArgument(
                "coalesce requires at least one partition".to_string(),
            ));
        }

        let current = self.partitions.len();
        if num_partitions >= current {
            return Ok(self.clone());
        }

        let mut groups: Vec<Vec<RecordBatch>> = vec![Vec::new(); num_partitions];
        for (index, batch) in self.partitions.iter().enumerate() {
            groups[index * num_partitions / current].push(batch.clone());
        }

        let partitions = groups
            .iter()
            .map(|group| concat_batches(&self.schema, group))
            .collect::<Result<Vec<_>, _>>()?;

        DataFrame::new(self.session.clone(), self.schema.clone(), partitions)
    }

    /// Starts a CSV write using the session's write defaults.
    pub fn write(&self) -> CsvWriter {
        CsvWriter::new(self.clone(), self.session.write_options().clone())
    }

    pub(crate) fn column_index(&self, name: &str) -> Result<usize, TabulaError> {
        self.schema
            .index_of(name)
            .map_err(|_| TabulaError::ColumnNotFound(name.to_string()))
    }

    fn with_names(&self, names: Vec<String>) -> Result<DataFrame, TabulaError> {
        check_unique(&names)?;

        let fields: Vec<Field> = self
            .schema
            .fields()
            .iter()
            .zip(names)
            .map(|(field, name)| field.as_ref().clone().with_name(name))
            .collect();
        let schema = Arc::new(Schema::new_with_metadata(fields, self.schema.metadata().clone()));

        let partitions = self
            .partitions
            .iter()
            .map(|batch| RecordBatch::try_new(schema.clone(), batch.columns().to_vec()))
            .collect::<Result<Vec<_>, _>>()?;

        DataFrame::new(self.session.clone(), schema, partitions)
    }
}

fn check_unique(names: &[String]) -> Result<(), TabulaError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(TabulaError::SchemaError(format!(
                "duplicate column name '{name}'"
            )));
        }
    }
    Ok(())
}
