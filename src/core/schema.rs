use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use serde::{Deserialize, Serialize};

use crate::core::TabulaError;

/// Column types accepted by an explicit schema.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Utf8,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    Date,
    Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: DType,
    #[serde(default = "ColumnSchema::default_nullable")]
    pub nullable: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            dtype,
            nullable: true,
        }
    }

    pub fn default_nullable() -> bool {
        true
    }
}

/// Ordered column list. Order is the on-disk field order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TableSchema {
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    pub fn from_json(json: &str) -> Result<Self, TabulaError> {
        serde_json::from_str(json).map_err(|e| TabulaError::SchemaError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, TabulaError> {
        serde_json::to_string_pretty(self).map_err(|e| TabulaError::SchemaError(e.to_string()))
    }

    /// Builds a TableSchema from an Arrow schema, failing on types
    /// that have no `DType` counterpart.
    pub fn try_from_arrow(schema: &Schema) -> Result<Self, TabulaError> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                Ok(ColumnSchema {
                    name: field.name().clone(),
                    dtype: DType::try_from(field.data_type())?,
                    nullable: field.is_nullable(),
                })
            })
            .collect::<Result<Vec<_>, TabulaError>>()?;
        Ok(Self { columns })
    }

    pub fn to_arrow(&self) -> SchemaRef {
        Arc::new(Schema::from(self))
    }
}

impl From<DType> for DataType {
    fn from(dtype: DType) -> Self {
        match dtype {
            DType::Utf8 => DataType::Utf8,
            DType::Int32 => DataType::Int32,
            DType::Int64 => DataType::Int64,
            DType::Float32 => DataType::Float32,
            DType::Float64 => DataType::Float64,
            DType::Bool => DataType::Boolean,
            DType::Date => DataType::Date32,
            DType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        }
    }
}

impl TryFrom<&DataType> for DType {
    type Error = TabulaError;

    fn try_from(data_type: &DataType) -> Result<Self, Self::Error> {
        match data_type {
            DataType::Utf8 => Ok(DType::Utf8),
            DataType::Int32 => Ok(DType::Int32),
            DataType::Int64 => Ok(DType::Int64),
            DataType::Float32 => Ok(DType::Float32),
            DataType::Float64 => Ok(DType::Float64),
            DataType::Boolean => Ok(DType::Bool),
            DataType::Date32 => Ok(DType::Date),
            DataType::Timestamp(_, None) => Ok(DType::Timestamp),
            other => Err(TabulaError::SchemaError(format!(
                "unsupported column type {other}"
            ))),
        }
    }
}

impl From<&TableSchema> for Schema {
    fn from(schema: &TableSchema) -> Self {
        let fields: Vec<Field> = schema
            .columns
            .iter()
            .map(|column| Field::new(&column.name, DataType::from(column.dtype), column.nullable))
            .collect();
        Schema::new(fields)
    }
}

/// Schema acquisition strategy for a CSV load.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SchemaMode {
    /// Sample rows and infer a type per column.
    Infer,
    /// Use the given schema; unparsable rows fail the load.
    Explicit(TableSchema),
    /// Every column is read as a string.
    #[default]
    Strings,
}

/// Short SQL-style name for a column type, as reported by `dtypes()`.
pub fn type_name(data_type: &DataType) -> String {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 => "string".to_string(),
        DataType::Int8 => "tinyint".to_string(),
        DataType::Int16 => "smallint".to_string(),
        DataType::Int32 => "int".to_string(),
        DataType::Int64 => "bigint".to_string(),
        DataType::Float32 => "float".to_string(),
        DataType::Float64 => "double".to_string(),
        DataType::Boolean => "boolean".to_string(),
        DataType::Date32 | DataType::Date64 => "date".to_string(),
        DataType::Timestamp(_, _) => "timestamp".to_string(),
        other => other.to_string().to_lowercase(),
    }
}
