use std::sync::Arc;

use log::debug;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::prefix::PrefixStore;
use object_store::ClientOptions;
use tokio_stream::StreamExt;

use crate::conf::{LocalStorageConfig, S3StorageConfig, StorageConfig};
use crate::core::TabulaError;

/// Creates the ObjectStore described by the storage config.
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, TabulaError> {
    match config {
        StorageConfig::Local(local) => create_local_store(local),
        StorageConfig::S3(s3) => create_s3_store(s3),
        StorageConfig::Memory => Ok(Arc::new(InMemory::new())),
    }
}

/// Creates a LocalFileSystem rooted at `config.root`.
pub fn create_local_store(config: &LocalStorageConfig) -> Result<Arc<dyn ObjectStore>, TabulaError> {
    let store = LocalFileSystem::new_with_prefix(&config.root).map_err(|e| {
        TabulaError::StoreError(format!(
            "Failed to open local storage at '{}': {}",
            config.root.display(),
            e
        ))
    })?;
    Ok(Arc::new(store))
}

/// Creates an S3 ObjectStore, optionally scoped to a key prefix.
pub fn create_s3_store(config: &S3StorageConfig) -> Result<Arc<dyn ObjectStore>, TabulaError> {
    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(&config.bucket)
        .with_region(&config.region)
        .with_client_options(ClientOptions::new().with_timeout(config.timeout));

    // MinIO, LocalStack and friends
    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint);
        if endpoint.starts_with("http://") {
            builder = builder.with_allow_http(true);
        }
    }

    let store = builder.build().map_err(|e| {
        TabulaError::StoreError(format!(
            "Failed to create S3 store for bucket '{}': {}",
            config.bucket, e
        ))
    })?;

    match &config.prefix {
        Some(prefix) if !prefix.is_empty() => Ok(Arc::new(PrefixStore::new(store, prefix.as_str()))),
        _ => Ok(Arc::new(store)),
    }
}

/// Lists every object under `prefix`, sorted by path.
pub async fn list_objects(
    store: &Arc<dyn ObjectStore>,
    prefix: &ObjectPath,
) -> Result<Vec<ObjectPath>, TabulaError> {
    let mut paths = Vec::new();
    let mut stream = store.list(Some(prefix));

    while let Some(result) = stream.next().await {
        let meta = result?;
        paths.push(meta.location);
    }

    paths.sort();
    debug!("Listed {} objects under '{}'", paths.len(), prefix);
    Ok(paths)
}

/// Whether `path` names a data file rather than a marker or hidden file.
pub fn is_data_file(path: &ObjectPath) -> bool {
    match path.filename() {
        Some(name) => !name.starts_with('_') && !name.starts_with('.'),
        None => false,
    }
}

/// Returns the path to the _SUCCESS marker under an output prefix.
pub fn success_marker_path(prefix: &ObjectPath) -> ObjectPath {
    prefix.child("_SUCCESS")
}
