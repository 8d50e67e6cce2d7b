//! Channel-level report: rebuild and CSV export.

use std::fs;
use std::path::Path;

use crate::{
    error::PipelineResult,
    sql::{SqlCatalog, REPORT_CHANNEL_BUILD, REPORT_CHANNEL_EXPORT},
    store::{PipelineStore, REPORT_TABLE},
};

/// Recompute `channel_reporting` wholesale from the four upstream tables
/// (session_sources, session_costs, conversions,
/// attribution_customer_journey).
///
/// Purge and rebuild run in one transaction: readers either see the prior
/// report or the finished new one, and a failed rebuild rolls back with the
/// prior report intact.
pub fn build_channel_report(store: &PipelineStore, catalog: &SqlCatalog) -> PipelineResult<()> {
    let sql = catalog.load(REPORT_CHANNEL_BUILD)?;
    log::info!("purging and rebuilding {REPORT_TABLE}");
    store.rebuild_channel_report(&sql)?;
    log::info!("successfully created channel report");
    Ok(())
}

/// Run the ad-hoc per-channel metrics query (cost, credit, revenue, CPO,
/// ROAS per date and channel) and serialize it to a CSV with a header row.
pub fn export_channel_report(
    store: &PipelineStore,
    catalog: &SqlCatalog,
    export_path: &Path,
) -> PipelineResult<()> {
    let sql = catalog.load(REPORT_CHANNEL_EXPORT)?;

    log::info!("running export query ...");
    let (headers, rows) = store.query_text_rows(&sql)?;

    if let Some(parent) = export_path.parent() {
        fs::create_dir_all(parent)?;
    }
    log::info!("writing results to '{}'", export_path.display());
    let mut writer = csv::Writer::from_path(export_path)?;
    writer.write_record(&headers)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    log::info!(
        "successfully exported {} report rows to '{}'",
        rows.len(),
        export_path.display()
    );
    Ok(())
}
