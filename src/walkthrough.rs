//! The fixed load, inspect, project, summarize, persist sequence.

use log::info;
use object_store::path::Path as ObjectPath;

use crate::conf::WalkthroughConfig;
use crate::core::TabulaError;
use crate::frame::{DataFrame, STATISTICS};
use crate::session::Session;

/// What a walkthrough run observed and produced.
#[derive(Debug)]
pub struct WalkthroughReport {
    pub rows: usize,
    pub dtypes: Vec<(String, String)>,
    pub summary: DataFrame,
    pub written: Vec<ObjectPath>,
}

pub async fn run(
    session: &Session,
    config: &WalkthroughConfig,
) -> Result<WalkthroughReport, TabulaError> {
    let frame = session.read().csv(&config.input).await?;

    let rows = frame.count();
    let dtypes = frame.dtypes();
    info!("'{}' has {} rows", config.input, rows);
    info!("Schema:\n{}", frame.print_schema());
    info!("First {} rows:\n{}", config.show_rows, frame.show(config.show_rows)?);

    let mut derived = frame;
    if !config.select.is_empty() {
        let columns: Vec<&str> = config.select.iter().map(String::as_str).collect();
        derived = derived.select(&columns)?;
    }
    derived = derived.with_columns_renamed(
        config
            .rename
            .iter()
            .map(|rename| (rename.from.as_str(), rename.to.as_str())),
    )?;
    info!("Derived columns: {:?}", derived.columns());

    let summary_columns: Vec<&str> = config.summary_columns.iter().map(String::as_str).collect();
    let summary = if summary_columns.is_empty() {
        derived.describe(None)?
    } else {
        derived.describe(Some(summary_columns.as_slice()))?
    };
    info!("Summary:\n{}", summary.show(STATISTICS.len())?);

    let output = match config.coalesce {
        Some(partitions) => summary.coalesce(partitions)?,
        None => summary.clone(),
    };
    let written = output.write().csv(&config.output).await?;

    Ok(WalkthroughReport {
        rows,
        dtypes,
        summary,
        written,
    })
}
