mod config;
mod read;
mod storage;
mod walkthrough;
mod write;

pub use config::Config;
pub use read::{ReadConfig, SchemaKind};
pub use storage::{LocalStorageConfig, S3StorageConfig, StorageConfig};
pub use walkthrough::{RenameConfig, WalkthroughConfig};
pub use write::{SaveMode, WriteConfig};

use crate::core::TabulaError;

fn single_byte(key: &str, value: &str) -> Result<u8, TabulaError> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(TabulaError::ConfigParsingError(format!(
            "{key} must be a single byte, got {value:?}"
        ))),
    }
}
