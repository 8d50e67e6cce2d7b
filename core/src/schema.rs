//! Schema migration with bounded retry under lock contention.
//!
//! Lock contention is expected under concurrent access and transient, so
//! locked statements are retried with a fixed wait and reported as a soft
//! failure (`Ok(false)`) once the budget runs out. Every other schema error
//! is a programmer error: raised immediately, wrapped so the caller can
//! tell it apart from a locking condition.

use std::thread;
use std::time::Duration;

use rusqlite::ErrorCode;

use crate::{
    error::{PipelineError, PipelineResult},
    store::PipelineStore,
};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

pub struct SchemaMigrator {
    pub max_retries: u32,
    pub wait: Duration,
}

impl Default for SchemaMigrator {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            wait: DEFAULT_WAIT,
        }
    }
}

impl SchemaMigrator {
    /// Apply a DDL script. `Ok(true)` on success, `Ok(false)` once the
    /// retry budget is exhausted by lock contention.
    pub fn apply(&self, store: &PipelineStore, script: &str, sql: &str) -> PipelineResult<bool> {
        let applied = self.apply_with(|| store.execute_batch(sql))?;
        if applied {
            log::info!("successfully updated schema from '{script}'");
        } else {
            log::error!("max retry attempts reached. Could not execute script '{script}'");
        }
        Ok(applied)
    }

    /// Retry loop over an arbitrary executor. At most `max_retries`
    /// attempts in total, with the fixed wait between them (no backoff
    /// growth).
    pub fn apply_with<F>(&self, mut exec: F) -> PipelineResult<bool>
    where
        F: FnMut() -> PipelineResult<()>,
    {
        for attempt in 1..=self.max_retries {
            match exec() {
                Ok(()) => return Ok(true),
                Err(PipelineError::Database(e)) if is_lock_contention(&e) => {
                    if attempt < self.max_retries {
                        log::info!(
                            "attempt {attempt}: database is locked, retrying in {:?} ...",
                            self.wait
                        );
                        thread::sleep(self.wait);
                    }
                }
                Err(PipelineError::Database(e)) => return Err(PipelineError::Schema(e)),
                Err(other) => return Err(other),
            }
        }
        Ok(false)
    }
}

fn is_lock_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
