use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQL file not found: '{path}'")]
    SqlFileNotFound { path: PathBuf },

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A schema statement failed for a reason other than lock contention.
    #[error("Database error not related to database locking: {0}")]
    Schema(rusqlite::Error),

    #[error("Schema migration gave up after repeated lock contention: '{script}'")]
    SchemaLockExhausted { script: String },

    /// The scoring service answered 200 but the body did not parse.
    #[error("Malformed attribution payload: {0}")]
    MalformedPayload(serde_json::Error),

    #[error("Invalid date window: start {start} is after end {end}")]
    InvalidDateWindow { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
