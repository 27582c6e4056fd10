mod reader;
mod store;
mod writer;

pub use reader::{CsvReader, ReadOptions};
pub use store::{create_local_store, create_s3_store, create_store, is_data_file, list_objects};
pub use writer::{CsvWriter, WriteOptions, encode_csv};
