mod args;
mod error;
mod logger;
mod schema;

pub use args::CliArgs;
pub use error::TabulaError;
pub use logger::setup_logging;
pub use schema::{ColumnSchema, DType, SchemaMode, TableSchema, type_name};
