//! Pipeline configuration.
//!
//! Everything a component needs is carried in an explicit `PipelineConfig`
//! value passed in at construction. Nothing reads process-wide state after
//! startup; the only environment access is the API credential lookup in
//! `PipelineConfig::from_env`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Environment variable holding the scoring-service credential.
pub const API_TOKEN_VAR: &str = "IHC_API_TOKEN";

/// Journeys submitted per scoring request.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Conversion-type identifier sent with every scoring request.
pub const DEFAULT_CONV_TYPE_ID: &str = "test_attribution";

/// Credit-flow settings for one role (initializer, holder or closer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleParameter {
    pub direction: String,
    pub receive_threshold: f64,
    pub redistribution_channel_labels: Vec<String>,
}

/// How credit flows between touchpoint roles. Every role is a mandatory
/// field, so a constructed value is always a well-formed request parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedistributionParameter {
    pub initializer: RoleParameter,
    pub holder: RoleParameter,
    pub closer: RoleParameter,
}

impl RedistributionParameter {
    /// Load an override from a JSON file, e.g. `data/config/redistribution.json`.
    pub fn from_json_file(path: &Path) -> PipelineResult<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

fn all_channel_labels() -> Vec<String> {
    [
        "Affiliate & Partnerships",
        "Direct Traffic",
        "FB & IG Ads",
        "Lead Generation",
        "Microsoft Ads",
        "Newsletter & Email",
        "Organic Traffic",
        "Paid Search Brand",
        "Paid Search Non Brand",
        "Performance Max",
        "Pinterest Ads",
        "Referral",
        "Social Organic",
        "TikTok Ads",
        "Untracked Conversions",
        "YouTube Ads",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for RedistributionParameter {
    fn default() -> Self {
        Self {
            initializer: RoleParameter {
                direction: "earlier_sessions_only".into(),
                receive_threshold: 0.0,
                redistribution_channel_labels: all_channel_labels(),
            },
            holder: RoleParameter {
                direction: "any_session".into(),
                receive_threshold: 0.0,
                redistribution_channel_labels: all_channel_labels(),
            },
            closer: RoleParameter {
                direction: "later_sessions_only".into(),
                receive_threshold: 0.1,
                redistribution_channel_labels: vec![
                    "Paid Search Brand".into(),
                    "Newsletter & Email".into(),
                    "Performance Max".into(),
                ],
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Credential for the scoring service (`x-api-key` header).
    pub api_token: String,
    pub conv_type_id: String,
    pub chunk_size: usize,
    /// Root of the external SQL script tree.
    pub sql_dir: PathBuf,
    /// Holdout journeys reserved for evaluation; never submitted for scoring.
    pub training_data_path: PathBuf,
    /// Where the channel report CSV lands.
    pub export_path: PathBuf,
    pub redistribution: RedistributionParameter,
}

impl PipelineConfig {
    /// Assemble a config from the environment and the data/SQL roots.
    ///
    /// A missing credential is fatal here, before any store access.
    pub fn from_env(sql_dir: &Path, data_dir: &Path) -> PipelineResult<Self> {
        let api_token = env::var(API_TOKEN_VAR).map_err(|_| {
            PipelineError::Configuration(format!("environment variable {API_TOKEN_VAR} is not set"))
        })?;
        if api_token.is_empty() {
            return Err(PipelineError::Configuration(format!(
                "environment variable {API_TOKEN_VAR} is empty"
            )));
        }

        let redistribution_file = data_dir.join("config/redistribution.json");
        let redistribution = if redistribution_file.is_file() {
            RedistributionParameter::from_json_file(&redistribution_file)?
        } else {
            RedistributionParameter::default()
        };

        Ok(Self {
            api_token,
            conv_type_id: DEFAULT_CONV_TYPE_ID.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            sql_dir: sql_dir.to_path_buf(),
            training_data_path: data_dir.join("training/training_data.json"),
            export_path: data_dir.join("exports/channel_reporting.csv"),
            redistribution,
        })
    }
}
