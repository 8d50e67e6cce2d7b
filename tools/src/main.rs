//! pipeline-runner: headless attribution pipeline runner.
//!
//! Usage:
//!   pipeline-runner
//!   pipeline-runner --start-date 2024-01-01 --end-date 2024-01-31
//!   pipeline-runner --db data/db/attribution.db --sql-dir sql --data-dir data
//!
//! The scoring-service credential comes from the IHC_API_TOKEN environment
//! variable (a `.env` file is honored).

use std::path::PathBuf;

use anyhow::Result;
use attribution_core::{
    config::PipelineConfig,
    pipeline::Pipeline,
    store::PipelineStore,
    types::DateWindow,
};
use chrono::NaiveDate;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pipeline-runner",
    about = "Process customer journeys with an optional date range"
)]
struct Args {
    /// Start date (YYYY-MM-DD) for conversions and sessions of interest.
    #[arg(long, value_parser = parse_date, requires = "end_date")]
    start_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD) for conversions and sessions of interest.
    #[arg(long, value_parser = parse_date, requires = "start_date")]
    end_date: Option<NaiveDate>,

    /// SQLite database path.
    #[arg(long, default_value = "data/db/attribution.db")]
    db: String,

    /// Root of the SQL script tree.
    #[arg(long, default_value = "sql")]
    sql_dir: PathBuf,

    /// Root of the data tree (training holdout, exports, optional config).
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("the date format is not valid: {raw}. Use 'YYYY-MM-DD'"))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    // Window validation happens before any store access.
    let window = match (args.start_date, args.end_date) {
        (Some(start), Some(end)) => Some(DateWindow::new(start, end)?),
        _ => None,
    };

    log::info!("starting attribution pipeline run (db: {})", args.db);
    let config = PipelineConfig::from_env(&args.sql_dir, &args.data_dir)?;
    let export_path = config.export_path.clone();

    let store = PipelineStore::open(&args.db)?;
    let pipeline = Pipeline::new(config, store);
    let summary = pipeline.run(window.as_ref())?;

    println!("=== RUN SUMMARY ===");
    match window {
        Some(w) => println!("  window:        {} .. {}", w.start, w.end),
        None => println!("  window:        (none)"),
    }
    println!("  journeys:      {}", summary.journeys);
    println!("  chunks:        {}", summary.chunks);
    println!("  failed chunks: {}", summary.failed_chunks);
    println!("  report rows:   {}", summary.report_rows);
    println!("  export:        {}", export_path.display());

    Ok(())
}
