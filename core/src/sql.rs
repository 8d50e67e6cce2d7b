//! Named SQL script loading.
//!
//! All query, DDL and transformation text lives in external `.sql` files
//! treated as opaque configuration. Scripts are read at call time so an
//! operator can adjust them without rebuilding; a missing file fails loudly.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

pub const SCHEMA_ATTRIBUTION: &str = "schemas/attribution_customer_journey.sql";
pub const SCHEMA_CHANNEL_REPORTING: &str = "schemas/channel_reporting.sql";
pub const SCHEMA_SESSION_COSTS: &str = "schemas/session_costs.sql";
pub const INGESTION_CUSTOMER_JOURNEYS: &str = "ingestion/customer_journeys.sql";
pub const UPSERT_ATTRIBUTION: &str = "transformation/upsert_attribution_customer_journey.sql";
pub const REPORT_CHANNEL_BUILD: &str = "reporting/build_report_customer_journey_channel.sql";
pub const REPORT_CHANNEL_EXPORT: &str = "adhoc/channel_report.sql";

/// Resolves script names against a base directory and reads their text.
#[derive(Debug, Clone)]
pub struct SqlCatalog {
    base: PathBuf,
}

impl SqlCatalog {
    pub fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
        }
    }

    /// Read a script relative to the catalog root, e.g.
    /// `catalog.load(sql::INGESTION_CUSTOMER_JOURNEYS)`.
    pub fn load(&self, name: &str) -> PipelineResult<String> {
        let path = self.base.join(name);
        log::info!("reading SQL file '{}'", path.display());
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::error!("SQL file not found in '{}'", path.display());
                Err(PipelineError::SqlFileNotFound { path })
            }
            Err(e) => Err(e.into()),
        }
    }
}
