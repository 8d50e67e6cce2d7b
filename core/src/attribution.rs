//! Client for the external multi-touch scoring service.
//!
//! One synchronous POST per chunk, no retries: partial failures are
//! accepted as permanent losses for that chunk, and transport errors are
//! fatal for the run. Retry policy, if any, belongs to the orchestrator
//! boundary.

use serde::{Deserialize, Serialize};

use crate::{
    config::{PipelineConfig, RedistributionParameter},
    error::{PipelineError, PipelineResult},
    journeys::JourneyRecord,
    types::{ConversionId, SessionId},
};

pub const API_BASE_URL: &str = "https://api.ihc-attribution.com/v1/compute_ihc";

/// One scored touchpoint returned by the service; joins back to a
/// `JourneyRecord` on (conversion_id, session_id). Extra credit fields in
/// the payload are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub conversion_id: ConversionId,
    pub session_id: SessionId,
    pub ihc: f64,
}

/// The seam between the orchestrator and the scoring service.
///
/// `Ok(Some(results))` is a fully scored chunk, `Ok(None)` a classified
/// rejection (logged, chunk lost), `Err` a fatal transport or payload
/// condition.
pub trait JourneyScorer {
    fn score_chunk(&self, chunk: &[JourneyRecord]) -> PipelineResult<Option<Vec<AttributionResult>>>;
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    customer_journeys: &'a [JourneyRecord],
    redistribution_parameter: &'a RedistributionParameter,
}

#[derive(Deserialize)]
struct ScoreResponse {
    value: Vec<AttributionResult>,
}

pub struct AttributionClient {
    http: reqwest::blocking::Client,
    api_url: String,
    api_token: String,
    redistribution: RedistributionParameter,
}

impl AttributionClient {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            api_url: format!("{API_BASE_URL}?conv_type_id={}", config.conv_type_id),
            api_token: config.api_token.clone(),
            redistribution: config.redistribution.clone(),
        }
    }

    /// Classify a response into the pipeline outcome. Pure; every status
    /// arm the service documents is covered, plus a logged catch-all.
    pub fn classify_response(
        status: u16,
        body: &str,
    ) -> PipelineResult<Option<Vec<AttributionResult>>> {
        match status {
            200 => match serde_json::from_str::<ScoreResponse>(body) {
                Ok(response) => Ok(Some(response.value)),
                Err(e) => {
                    log::error!("there was an issue parsing the scoring response: {e}");
                    Err(PipelineError::MalformedPayload(e))
                }
            },
            206 => {
                log::error!("the request succeeded but there are partial errors - {body}");
                Ok(None)
            }
            400 => {
                log::error!("request failed due to invalid input - {body}");
                Ok(None)
            }
            406 => {
                log::error!("error in parsing a customer journey - {body}");
                Ok(None)
            }
            500 => {
                log::error!("scoring service failure - {body}");
                Ok(None)
            }
            other => {
                log::error!("unexpected status code {other}: {body}");
                Ok(None)
            }
        }
    }
}

impl JourneyScorer for AttributionClient {
    fn score_chunk(
        &self,
        chunk: &[JourneyRecord],
    ) -> PipelineResult<Option<Vec<AttributionResult>>> {
        let request = ScoreRequest {
            customer_journeys: chunk,
            redistribution_parameter: &self.redistribution,
        };

        log::info!("sending request to URL: {}", self.api_url);
        let response = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_token)
            .json(&request)
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;
        Self::classify_response(status, &body)
    }
}
