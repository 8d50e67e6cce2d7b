//! Idempotent write-back of scored results.
//!
//! Stage-then-merge: incoming rows land in an isolated staging table first,
//! then a keyed upsert folds them into the permanent table, then the
//! staging table is dropped. Re-running any chunk is safe: the permanent
//! table never holds more than one row per (conversion_id, session_id).
//!
//! An absent (or empty) payload purges the permanent table instead. That
//! conflates "no new data" with "clear everything"; see DESIGN.md for why
//! the reference behavior is kept.

use crate::{
    attribution::AttributionResult,
    error::PipelineResult,
    sql::{SqlCatalog, UPSERT_ATTRIBUTION},
    store::{PipelineStore, RESULT_TABLE},
};

/// Write one chunk's outcome to the permanent result table.
pub fn write_results(
    store: &PipelineStore,
    catalog: &SqlCatalog,
    payload: Option<Vec<AttributionResult>>,
) -> PipelineResult<()> {
    match payload {
        Some(rows) if !rows.is_empty() => stage_and_merge(store, catalog, &rows),
        _ => {
            log::info!("no records to process to {RESULT_TABLE}");
            store.purge_table(RESULT_TABLE)
        }
    }
}

fn stage_and_merge(
    store: &PipelineStore,
    catalog: &SqlCatalog,
    rows: &[AttributionResult],
) -> PipelineResult<()> {
    let staging = format!("temp_{RESULT_TABLE}");
    // Resolve the merge script before touching the store, so a missing
    // script fails with no mutation.
    let upsert_sql = catalog.load(UPSERT_ATTRIBUTION)?;

    // A staging table may survive a killed run; start from a clean slate.
    store.drop_table_if_exists(&staging)?;
    store.create_staging_table(&staging)?;

    let merged = merge_staged(store, &staging, rows, &upsert_sql);

    // The staging table is scoped to this call: drop it on every exit
    // path, including statement failure.
    log::info!("dropping '{staging}'");
    if let Err(e) = store.drop_table_if_exists(&staging) {
        log::warn!("could not drop staging table '{staging}': {e}");
    }

    let count = merged?;
    log::info!("successfully wrote {count} records to table '{RESULT_TABLE}'");
    Ok(())
}

fn merge_staged(
    store: &PipelineStore,
    staging: &str,
    rows: &[AttributionResult],
    upsert_sql: &str,
) -> PipelineResult<usize> {
    log::info!("inserting records to '{staging}'");
    let count = store.insert_attribution_rows(staging, rows)?;

    log::info!("performing upsert from '{staging}' into '{RESULT_TABLE}'");
    store.execute_batch(upsert_sql)?;
    Ok(count)
}
