use anyhow::Context;
use clap::Parser;
use log::info;

use tabula::Session;
use tabula::conf::Config;
use tabula::core::{CliArgs, setup_logging};
use tabula::walkthrough;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();
    let args = CliArgs::parse();
    info!(args = args; "Tabula started.");

    let config = Config::load(args.config.as_deref())?;
    let steps = config
        .walkthrough
        .clone()
        .context("config has no [walkthrough] section")?;

    let session = Session::new(config)?;
    let report = walkthrough::run(&session, &steps).await?;

    info!(
        "Summarized {} rows, wrote {} file(s) to '{}'",
        report.rows,
        report.written.len(),
        steps.output
    );
    Ok(())
}
