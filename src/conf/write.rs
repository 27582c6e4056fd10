use serde::{Deserialize, Serialize};

use crate::core::TabulaError;

use super::single_byte;

/// Behavior when the output prefix already holds objects.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    #[default]
    ErrorIfExists,
    Overwrite,
    Append,
    Ignore,
}

/// Defaults for `DataFrame::write()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WriteConfig {
    #[serde(default = "WriteConfig::default_header")]
    pub header: bool,
    #[serde(default = "WriteConfig::default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub mode: SaveMode,
}

impl WriteConfig {
    fn default_header() -> bool {
        true
    }

    fn default_delimiter() -> String {
        String::from(",")
    }

    pub fn delimiter_byte(&self) -> Result<u8, TabulaError> {
        single_byte("write.delimiter", &self.delimiter)
    }
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            header: Self::default_header(),
            delimiter: Self::default_delimiter(),
            mode: SaveMode::default(),
        }
    }
}
