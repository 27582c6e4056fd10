use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TabulaError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Arrow error: {0}")]
    ArrowError(String),
    #[error("Storage error: {0}")]
    StoreError(String),
    #[error("Object not found: {0}")]
    ObjectNotFound(String),
    #[error("Column not found: '{0}'")]
    ColumnNotFound(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Path already exists: {0}")]
    PathAlreadyExists(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<std::io::Error> for TabulaError {
    fn from(err: std::io::Error) -> Self {
        TabulaError::IoError(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for TabulaError {
    fn from(err: arrow::error::ArrowError) -> Self {
        TabulaError::ArrowError(err.to_string())
    }
}

impl From<object_store::Error> for TabulaError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => TabulaError::ObjectNotFound(path),
            other => TabulaError::StoreError(other.to_string()),
        }
    }
}
