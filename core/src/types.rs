//! Shared primitive types used across the entire pipeline.

use chrono::NaiveDate;

use crate::error::{PipelineError, PipelineResult};

/// Groups the touchpoints of one customer journey.
pub type ConversionId = String;

/// Identifies one touchpoint (session) within a journey.
pub type SessionId = String;

/// An inclusive calendar-date filter applied to the extraction query.
///
/// Both ends are required: the pipeline either runs with a full window or
/// with no date filter at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`. `start == end` is a valid
    /// single-day window.
    pub fn new(start: NaiveDate, end: NaiveDate) -> PipelineResult<Self> {
        if start > end {
            return Err(PipelineError::InvalidDateWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// `YYYY-MM-DD` rendering of the start bound, as the SQL scripts expect.
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DD` rendering of the end bound.
    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}
