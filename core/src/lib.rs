//! Attribution orchestration pipeline.
//!
//! Ingests multi-touch customer journeys, submits them to an external
//! scoring service in bounded chunks, writes the returned per-touchpoint
//! credits back idempotently, and derives a channel-level performance
//! report from the combined data.

/// Client and response classification for the external scoring service.
pub mod attribution;
/// Explicit configuration passed into every component.
pub mod config;
/// Journey extraction and the training holdout set.
pub mod journeys;
/// The stage-ordered pipeline driver.
pub mod pipeline;
/// Channel report rebuild and CSV export.
pub mod report;
/// Schema migration with bounded retry under lock contention.
pub mod schema;
/// Named SQL script loading.
pub mod sql;
/// SQLite persistence layer.
pub mod store;
/// Shared primitive types.
pub mod types;
/// Idempotent stage-then-merge result write-back.
pub mod writer;

mod error;

pub use error::{PipelineError, PipelineResult};
