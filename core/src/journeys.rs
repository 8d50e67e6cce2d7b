//! Journey extraction.
//!
//! Pulls customer touchpoints from the store with an optional date window
//! and strips every journey reserved in the training holdout set. The
//! holdout invariant: a conversion_id listed in the holdout file never
//! reaches the scoring service.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::PipelineResult,
    sql::{SqlCatalog, INGESTION_CUSTOMER_JOURNEYS},
    store::PipelineStore,
    types::{ConversionId, DateWindow, SessionId},
};

/// One customer touchpoint. Engagement and conversion flags are 0/1
/// integers, exactly as stored and as the scoring service expects them on
/// the wire. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyRecord {
    pub conversion_id: ConversionId,
    pub session_id: SessionId,
    pub timestamp: String,
    pub channel_label: String,
    pub holder_engagement: i64,
    pub closer_engagement: i64,
    pub conversion: i64,
    pub impression_interaction: i64,
}

/// Holdout entries carry full journey records; only the conversion_id
/// matters for exclusion.
#[derive(Debug, Deserialize)]
struct HoldoutRecord {
    conversion_id: ConversionId,
}

/// Load the training holdout set: a JSON array of journey records, reduced
/// to the set of reserved conversion_ids.
pub fn load_holdout_set(path: &Path) -> PipelineResult<HashSet<ConversionId>> {
    let raw = fs::read_to_string(path)?;
    let records: Vec<HoldoutRecord> = serde_json::from_str(&raw)?;
    Ok(records.into_iter().map(|r| r.conversion_id).collect())
}

/// Serialize journey records to the holdout file format (pretty-printed
/// JSON array). This is the writing counterpart of `load_holdout_set` and
/// keeps the file format defined in one place.
pub fn write_holdout_file(records: &[JourneyRecord], path: &Path) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    log::info!("writing holdout data to '{}'", path.display());
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

/// Extract all eligible journeys for the (optional) date window.
///
/// Read-only: runs the ingestion query, then drops every record whose
/// conversion_id appears in the holdout set. Records come back in query
/// order (journey by journey, touchpoints in time order).
pub fn extract_journeys(
    store: &PipelineStore,
    catalog: &SqlCatalog,
    training_data_path: &Path,
    window: Option<&DateWindow>,
) -> PipelineResult<Vec<JourneyRecord>> {
    let query = catalog.load(INGESTION_CUSTOMER_JOURNEYS)?;
    let holdout = load_holdout_set(training_data_path)?;

    match window {
        Some(w) => log::info!(
            "running ingestion query for records between '{}' and '{}'",
            w.start_param(),
            w.end_param()
        ),
        None => log::info!("running ingestion query without a date filter"),
    }
    let journeys = store.query_journeys(&query, window)?;

    let before = journeys.len();
    let journeys: Vec<JourneyRecord> = journeys
        .into_iter()
        .filter(|j| !holdout.contains(&j.conversion_id))
        .collect();
    log::info!(
        "extracted {} journey records ({} held out for training)",
        journeys.len(),
        before - journeys.len()
    );
    Ok(journeys)
}
