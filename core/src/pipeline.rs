//! The pipeline driver.
//!
//! STAGE ORDER (fixed, documented, never reordered):
//!   1. Extract: pull eligible journeys for the optional date window
//!   2. Prepare: migrate the result-table schema, purge the result table
//!   3. Submit:  score and write back, one chunk at a time
//!   4. Report:  migrate the report schema, rebuild the channel report
//!   5. Export:  write the CSV artifact
//!
//! RULES:
//!   - Chunks are processed strictly in order, one outstanding request at
//!     a time; chunk N's write-back completes before chunk N+1 is sent.
//!   - A classified rejection loses that chunk and the loop continues.
//!   - Transport errors, malformed 200 payloads, store errors and schema
//!     retry exhaustion abort the run.

use crate::{
    attribution::{AttributionClient, JourneyScorer},
    config::PipelineConfig,
    error::{PipelineError, PipelineResult},
    journeys::extract_journeys,
    report::{build_channel_report, export_channel_report},
    schema::SchemaMigrator,
    sql::{SqlCatalog, SCHEMA_ATTRIBUTION, SCHEMA_CHANNEL_REPORTING},
    store::{PipelineStore, REPORT_TABLE, RESULT_TABLE},
    types::DateWindow,
    writer::write_results,
};

/// What one run did, for the runner's summary output.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub journeys: usize,
    pub chunks: usize,
    pub failed_chunks: usize,
    pub report_rows: i64,
}

pub struct Pipeline {
    config: PipelineConfig,
    store: PipelineStore,
    scorer: Box<dyn JourneyScorer>,
    migrator: SchemaMigrator,
}

impl Pipeline {
    /// Build a pipeline wired to the real scoring service.
    pub fn new(config: PipelineConfig, store: PipelineStore) -> Self {
        let scorer = Box::new(AttributionClient::new(&config));
        Self::with_scorer(config, store, scorer)
    }

    /// Build a pipeline with an injected scorer (used in tests).
    pub fn with_scorer(
        config: PipelineConfig,
        store: PipelineStore,
        scorer: Box<dyn JourneyScorer>,
    ) -> Self {
        Self {
            config,
            store,
            scorer,
            migrator: SchemaMigrator::default(),
        }
    }

    pub fn store(&self) -> &PipelineStore {
        &self.store
    }

    /// One full run: raw journeys in, finished report out.
    pub fn run(&self, window: Option<&DateWindow>) -> PipelineResult<PipelineSummary> {
        let catalog = SqlCatalog::new(&self.config.sql_dir);

        // 1. Extract
        log::info!("getting customer journey records ...");
        let journeys = extract_journeys(
            &self.store,
            &catalog,
            &self.config.training_data_path,
            window,
        )?;

        // 2. Prepare
        self.migrate(&catalog, SCHEMA_ATTRIBUTION)?;
        log::info!("purging {RESULT_TABLE} before inserting data ...");
        self.store.purge_table(RESULT_TABLE)?;

        // 3. Chunked submit
        let mut chunks = 0usize;
        let mut failed_chunks = 0usize;
        if journeys.is_empty() {
            // The purge-on-empty path still runs, so table state stays
            // consistent with a run that extracted nothing.
            write_results(&self.store, &catalog, None)?;
        } else {
            for (index, chunk) in journeys.chunks(self.config.chunk_size).enumerate() {
                log::info!("processing chunk {} ({} journeys)", index + 1, chunk.len());
                let payload = self.scorer.score_chunk(chunk)?;
                if payload.is_none() {
                    failed_chunks += 1;
                }
                write_results(&self.store, &catalog, payload)?;
                chunks += 1;
            }
        }
        log::info!("finished processing {chunks} chunks ({failed_chunks} failed)");

        // 4. Report
        self.migrate(&catalog, SCHEMA_CHANNEL_REPORTING)?;
        build_channel_report(&self.store, &catalog)?;

        // 5. Export
        export_channel_report(&self.store, &catalog, &self.config.export_path)?;

        log::info!("attribution pipeline completed successfully");
        Ok(PipelineSummary {
            journeys: journeys.len(),
            chunks,
            failed_chunks,
            report_rows: self.store.count_rows(REPORT_TABLE)?,
        })
    }

    /// Apply one schema script; retry exhaustion is fatal here because
    /// both call sites gate a write stage.
    fn migrate(&self, catalog: &SqlCatalog, script: &str) -> PipelineResult<()> {
        let sql = catalog.load(script)?;
        if !self.migrator.apply(&self.store, script, &sql)? {
            return Err(PipelineError::SchemaLockExhausted {
                script: script.into(),
            });
        }
        Ok(())
    }
}
