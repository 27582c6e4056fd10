use serde::{Deserialize, Serialize};

use crate::core::{ColumnSchema, SchemaMode, TableSchema, TabulaError};

use super::single_byte;

/// How column types are acquired on load.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Infer,
    Explicit,
    #[default]
    Strings,
}

/// Defaults for `Session::read()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReadConfig {
    #[serde(default = "ReadConfig::default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub header: bool,
    #[serde(default)]
    pub schema: SchemaKind,
    /// Column list for `schema = "explicit"`.
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
    #[serde(default = "ReadConfig::default_infer_max_records")]
    pub infer_max_records: usize,
    #[serde(default = "ReadConfig::default_partition_rows")]
    pub partition_rows: usize,
}

impl ReadConfig {
    fn default_delimiter() -> String {
        String::from(",")
    }

    fn default_infer_max_records() -> usize {
        1000
    }

    fn default_partition_rows() -> usize {
        8192
    }

    pub fn delimiter_byte(&self) -> Result<u8, TabulaError> {
        single_byte("read.delimiter", &self.delimiter)
    }

    pub fn schema_mode(&self) -> Result<SchemaMode, TabulaError> {
        match (self.schema, self.columns.is_empty()) {
            (SchemaKind::Explicit, true) => Err(TabulaError::ConfigParsingError(
                "read.schema = \"explicit\" requires read.columns".to_string(),
            )),
            (SchemaKind::Explicit, false) => {
                Ok(SchemaMode::Explicit(TableSchema::new(self.columns.clone())))
            }
            (_, false) => Err(TabulaError::ConfigParsingError(
                "read.columns is only valid with read.schema = \"explicit\"".to_string(),
            )),
            (SchemaKind::Infer, true) => Ok(SchemaMode::Infer),
            (SchemaKind::Strings, true) => Ok(SchemaMode::Strings),
        }
    }
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            delimiter: Self::default_delimiter(),
            header: false,
            schema: SchemaKind::default(),
            columns: Vec::new(),
            infer_max_records: Self::default_infer_max_records(),
            partition_rows: Self::default_partition_rows(),
        }
    }
}
