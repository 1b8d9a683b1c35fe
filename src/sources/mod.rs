//! Upstream data sources
//!
//! Each source fetches one external dataset and reduces it to a daily series.
//! The traits are the seam the pipeline is generic over, so tests and
//! alternative backends can supply their own series.

mod github;
pub mod http;
mod open_meteo;

pub use github::{aggregate_push_events, GitHubActivitySource};
pub use http::HttpFetcher;
pub use open_meteo::{aggregate_hourly, OpenMeteoSource};

use crate::error::SourceError;
use crate::types::{Coordinates, DailyActivity, DailyEnvironment, DateRange};

/// Source of per-day commit counts for a subject
pub trait ActivitySource {
    /// Fetch and aggregate recent activity; an empty series is `SourceError::Empty`
    fn daily_activity(&self, subject: &str) -> Result<Vec<DailyActivity>, SourceError>;
}

/// Source of per-day mean measurements for a location
pub trait EnvironmentSource {
    /// Fetch and aggregate measurements within `range` (inclusive)
    fn daily_environment(
        &self,
        coordinates: Coordinates,
        range: DateRange,
    ) -> Result<Vec<DailyEnvironment>, SourceError>;

    /// Name of the measured metric, for provenance
    fn metric(&self) -> &str;
}
