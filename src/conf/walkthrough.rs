use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RenameConfig {
    pub from: String,
    pub to: String,
}

/// Inputs for the fixed load/inspect/summarize/write sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WalkthroughConfig {
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub select: Vec<String>,
    #[serde(default)]
    pub rename: Vec<RenameConfig>,
    /// Empty means every numeric or string column.
    #[serde(default)]
    pub summary_columns: Vec<String>,
    #[serde(default = "WalkthroughConfig::default_show_rows")]
    pub show_rows: usize,
    #[serde(default)]
    pub coalesce: Option<usize>,
}

impl WalkthroughConfig {
    fn default_show_rows() -> usize {
        5
    }
}
