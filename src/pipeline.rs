//! Pipeline orchestration
//!
//! This module provides the public entry point of the engine.
//! It orchestrates the full pipeline from the two upstream sources to an
//! [`AnalysisResult`].

use crate::cache::{AnalysisCache, CacheKey, CachedJoin};
use crate::config::{AnalysisDefaults, CachePolicy, EngineConfig};
use crate::error::{AnalysisError, DataSource, SourceError};
use crate::join::join_daily;
use crate::normalizer::Normalizer;
use crate::similarity;
use crate::sources::{
    ActivitySource, EnvironmentSource, GitHubActivitySource, HttpFetcher, OpenMeteoSource,
};
use crate::types::{
    AnalysisFlag, AnalysisProvenance, AnalysisResult, Coordinates, DateRange,
};
use crate::ENGINE_VERSION;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Fewest joined days worth normalizing and scoring
pub const MIN_JOINED_RECORDS: usize = 3;

/// Engine backed by the public GitHub and Open-Meteo APIs
pub type HttpSimilarityEngine = SimilarityEngine<GitHubActivitySource, OpenMeteoSource>;

/// Stateful engine that memoizes fetched data per request tuple.
///
/// `analyze` takes `&self`, so one engine can serve concurrent requests when
/// its sources are `Sync`.
pub struct SimilarityEngine<A, E> {
    activity: A,
    environment: E,
    cache: AnalysisCache,
    defaults: AnalysisDefaults,
}

impl HttpSimilarityEngine {
    /// Wire the HTTP sources from configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self, SourceError> {
        let fetcher = HttpFetcher::new(config.http.clone())?;
        let activity = GitHubActivitySource::new(fetcher.clone(), config.github.clone());
        let environment = OpenMeteoSource::new(fetcher, config.air_quality.clone());

        let mut engine = Self::with_cache_policy(activity, environment, config.cache.clone());
        engine.defaults = config.defaults.clone();
        Ok(engine)
    }
}

impl<A: ActivitySource, E: EnvironmentSource> SimilarityEngine<A, E> {
    /// Create an engine with an unbounded, non-expiring cache
    pub fn new(activity: A, environment: E) -> Self {
        Self::with_cache_policy(activity, environment, CachePolicy::default())
    }

    pub fn with_cache_policy(activity: A, environment: E, policy: CachePolicy) -> Self {
        Self {
            activity,
            environment,
            cache: AnalysisCache::new(policy),
            defaults: AnalysisDefaults::default(),
        }
    }

    pub fn defaults(&self) -> &AnalysisDefaults {
        &self.defaults
    }

    /// Run the analysis for the configured default subject and location
    pub fn analyze_defaults(&self) -> Result<AnalysisResult, AnalysisError> {
        let AnalysisDefaults {
            subject,
            latitude,
            longitude,
        } = &self.defaults;
        self.analyze(subject, *latitude, *longitude)
    }

    /// Analyze the similarity between `subject`'s commits and air quality
    /// at (`latitude`, `longitude`).
    ///
    /// Pipeline stages:
    /// 1. ActivitySource - daily commit counts
    /// 2. EnvironmentSource - daily means over the activity date range
    /// 3. join_daily - inner join on date
    /// 4. Normalizer - min-max scale both columns
    /// 5. similarity - Pearson correlation on the raw columns
    ///
    /// Stages 1-3 are skipped when an identical request already succeeded.
    pub fn analyze(
        &self,
        subject: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<AnalysisResult, AnalysisError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("analyze", %run_id, subject);
        let _enter = span.enter();

        let subject = subject.trim();
        if subject.is_empty() {
            return Err(AnalysisError::InvalidInput("subject must not be empty".into()));
        }
        let coordinates = Coordinates::new(latitude, longitude);
        if !coordinates.is_valid() {
            return Err(AnalysisError::InvalidInput(format!(
                "coordinates out of range: {latitude}, {longitude}"
            )));
        }

        let key = CacheKey::new(subject, coordinates);
        let (joined, cache_hit) = match self.cache.get(&key) {
            Some(cached) => {
                debug!("cache hit");
                (cached, true)
            }
            None => {
                let fetched = self.fetch_joined(subject, coordinates)?;
                (self.cache.insert(key, fetched), false)
            }
        };

        // Stage 3 gate
        if joined.days.len() < MIN_JOINED_RECORDS {
            info!(found = joined.days.len(), "not enough overlapping days");
            return Err(AnalysisError::InsufficientJoinedData {
                found: joined.days.len(),
                required: MIN_JOINED_RECORDS,
            });
        }

        Ok(self.assemble(run_id, subject, coordinates, &joined, cache_hit))
    }

    /// Drop the cached data for one request tuple
    pub fn invalidate(&self, subject: &str, latitude: f64, longitude: f64) -> bool {
        let key = CacheKey::new(subject.trim(), Coordinates::new(latitude, longitude));
        self.cache.invalidate(&key)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn fetch_joined(
        &self,
        subject: &str,
        coordinates: Coordinates,
    ) -> Result<CachedJoin, AnalysisError> {
        // Stage 1: activity
        let activity = self
            .activity
            .daily_activity(subject)
            .map_err(|cause| no_data(DataSource::Activity, cause))?;
        let range = DateRange::covering(&activity)
            .ok_or_else(|| no_data(DataSource::Activity, SourceError::Empty))?;

        // Stage 2: environment over the activity range
        let environment = self
            .environment
            .daily_environment(coordinates, range)
            .map_err(|cause| no_data(DataSource::Environment, cause))?;

        // Stage 3: join
        let days = join_daily(&activity, &environment);
        info!(
            activity_days = activity.len(),
            environment_days = environment.len(),
            joined_days = days.len(),
            "joined daily series"
        );

        Ok(CachedJoin {
            days,
            fetched_at: Utc::now(),
        })
    }

    fn assemble(
        &self,
        run_id: Uuid,
        subject: &str,
        coordinates: Coordinates,
        joined: &Arc<CachedJoin>,
        cache_hit: bool,
    ) -> AnalysisResult {
        // Stage 4: normalize
        let normalized = Normalizer::normalize(&joined.days);
        let mut flags = normalized.flags;

        // Stage 5: score the raw columns
        let correlation = similarity::score(&joined.days);
        if !correlation.is_defined() {
            flags.push(AnalysisFlag::UndefinedCorrelation);
        }
        let label = similarity::classify(&correlation);

        info!(
            points = normalized.records.len(),
            correlation = ?correlation.value(),
            label = label.as_str(),
            "analysis complete"
        );

        AnalysisResult {
            records: normalized.records,
            correlation,
            label,
            flags,
            provenance: AnalysisProvenance {
                run_id: run_id.to_string(),
                subject: subject.to_string(),
                coordinates,
                metric: self.environment.metric().to_string(),
                fetched_at_utc: joined.fetched_at,
                computed_at_utc: Utc::now(),
                cache_hit,
                engine_version: ENGINE_VERSION.to_string(),
            },
        }
    }
}

fn no_data(dataset: DataSource, cause: SourceError) -> AnalysisError {
    warn!(%dataset, error = %cause, "no usable data");
    AnalysisError::NoData { dataset, cause }
}
