//! Error types for the similarity engine
//!
//! Each upstream source reports a detailed [`SourceError`]. The orchestrator
//! collapses those into [`AnalysisError::NoData`] so callers only need to
//! distinguish "no usable data" from "not enough overlapping days".

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Failures raised while fetching or aggregating one upstream dataset
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed upstream payload: {0}")]
    Malformed(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream returned no usable rows")]
    Empty,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Which upstream dataset a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Activity,
    Environment,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Activity => "activity",
            DataSource::Environment => "environment",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcomes of an analysis request that did not produce a result
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No usable {dataset} data")]
    NoData {
        dataset: DataSource,
        #[source]
        cause: SourceError,
    },

    #[error("Only {found} overlapping days found, at least {required} required")]
    InsufficientJoinedData { found: usize, required: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AnalysisError {
    /// True when either upstream produced nothing usable
    pub fn is_no_data(&self) -> bool {
        matches!(self, AnalysisError::NoData { .. })
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, AnalysisError::InsufficientJoinedData { .. })
    }
}

/// Errors loading an [`EngineConfig`](crate::config::EngineConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
