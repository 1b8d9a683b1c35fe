//! Smog & Code - similarity engine for commit activity and air quality
//!
//! The engine fetches two unrelated daily series and measures how alike they
//! are through a deterministic pipeline: source aggregation → temporal join →
//! min-max normalization → Pearson correlation.
//!
//! ## Modules
//!
//! - **Sources**: GitHub public events and Open-Meteo hourly air quality
//! - **Pipeline**: [`SimilarityEngine`] with an explicit request cache

pub mod cache;
pub mod config;
pub mod error;
pub mod join;
pub mod normalizer;
pub mod pipeline;
pub mod similarity;
pub mod sources;
pub mod types;

pub use config::EngineConfig;
pub use error::{AnalysisError, DataSource, SourceError};
pub use pipeline::{HttpSimilarityEngine, SimilarityEngine, MIN_JOINED_RECORDS};
pub use sources::{ActivitySource, EnvironmentSource};
pub use types::{AnalysisResult, Correlation, SimilarityLabel};

/// Engine version embedded in every result
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
