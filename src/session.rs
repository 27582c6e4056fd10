use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use log::info;
use object_store::ObjectStore;
use object_store::memory::InMemory;

use crate::conf::Config;
use crate::core::TabulaError;
use crate::frame::DataFrame;
use crate::io::{CsvReader, ReadOptions, WriteOptions, create_store};

/// Shared entry point: the object store plus read and write defaults.
///
/// Cheap to clone; every [DataFrame] carries one.
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<dyn ObjectStore>,
    config: Arc<Config>,
    read: ReadOptions,
    write: WriteOptions,
}

impl Session {
    pub fn new(config: Config) -> Result<Self, TabulaError> {
        let store = create_store(&config.storage)?;
        info!("Opened storage {}", store);
        Self::with_store(store, config)
    }

    pub fn with_store(store: Arc<dyn ObjectStore>, config: Config) -> Result<Self, TabulaError> {
        let read = ReadOptions::try_from(&config.read)?;
        let write = WriteOptions::try_from(&config.write)?;
        Ok(Self {
            store,
            config: Arc::new(config),
            read,
            write,
        })
    }

    /// Session over an empty in-memory store with default options.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            config: Arc::new(Config::default()),
            read: ReadOptions::default(),
            write: WriteOptions::default(),
        }
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn read(&self) -> CsvReader {
        CsvReader::new(self.clone(), self.read.clone())
    }

    pub(crate) fn write_options(&self) -> &WriteOptions {
        &self.write
    }

    /// Wraps in-memory batches; the first batch fixes the schema.
    pub fn create_dataframe(&self, batches: Vec<RecordBatch>) -> Result<DataFrame, TabulaError> {
        let schema = batches.first().map(|b| b.schema()).ok_or_else(|| {
            TabulaError::InvalidArgument("cannot create a frame from zero batches".to_string())
        })?;
        self.create_dataframe_with_schema(schema, batches)
    }

    pub fn create_dataframe_with_schema(
        &self,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Result<DataFrame, TabulaError> {
        DataFrame::new(self.clone(), schema, batches)
    }
}
