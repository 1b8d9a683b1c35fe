//! Open-Meteo air-quality source
//!
//! Requests one hourly metric for a coordinate and date range, then averages
//! the non-null samples of each calendar day.

use crate::config::AirQualityConfig;
use crate::error::SourceError;
use crate::types::{Coordinates, DailyEnvironment, DateRange};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use super::{EnvironmentSource, HttpFetcher};

/// Hourly timestamps come without seconds or offset
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Environment source backed by the Open-Meteo air-quality endpoint
pub struct OpenMeteoSource {
    fetcher: HttpFetcher,
    config: AirQualityConfig,
}

impl OpenMeteoSource {
    pub fn new(fetcher: HttpFetcher, config: AirQualityConfig) -> Self {
        Self { fetcher, config }
    }
}

impl EnvironmentSource for OpenMeteoSource {
    fn daily_environment(
        &self,
        coordinates: Coordinates,
        range: DateRange,
    ) -> Result<Vec<DailyEnvironment>, SourceError> {
        if !coordinates.is_valid() {
            return Err(SourceError::InvalidRequest(format!(
                "coordinates out of range: {}, {}",
                coordinates.latitude, coordinates.longitude
            )));
        }

        let query = [
            ("latitude", coordinates.latitude.to_string()),
            ("longitude", coordinates.longitude.to_string()),
            ("start_date", range.start.format("%Y-%m-%d").to_string()),
            ("end_date", range.end.format("%Y-%m-%d").to_string()),
            ("hourly", self.config.metric.clone()),
        ];

        info!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            start = %range.start,
            end = %range.end,
            metric = %self.config.metric,
            "fetching hourly measurements"
        );
        let body = self
            .fetcher
            .get_text(|client| client.get(&self.config.base_url).query(&query))?;

        let daily = aggregate_hourly(&body, &self.config.metric)?;
        info!(days = daily.len(), "aggregated measurements");
        Ok(daily)
    }

    fn metric(&self) -> &str {
        &self.config.metric
    }
}

/// Reduce an hourly payload to the daily mean of `metric`, sorted by date.
///
/// Null samples are skipped; a day with no valid sample is omitted.
pub fn aggregate_hourly(raw_json: &str, metric: &str) -> Result<Vec<DailyEnvironment>, SourceError> {
    let payload: AirQualityPayload = serde_json::from_str(raw_json)?;

    if payload.error.unwrap_or(false) {
        let reason = payload.reason.unwrap_or_else(|| "unknown upstream error".into());
        return Err(SourceError::Malformed(reason));
    }

    let mut hourly = payload
        .hourly
        .ok_or_else(|| SourceError::Malformed("missing hourly block".into()))?;
    let times = hourly
        .remove("time")
        .ok_or_else(|| SourceError::Malformed("missing hourly.time".into()))?;
    let values = hourly
        .remove(metric)
        .ok_or_else(|| SourceError::Malformed(format!("missing hourly.{metric}")))?;

    let times: Vec<String> = serde_json::from_value(times)?;
    let values: Vec<Option<f64>> = serde_json::from_value(values)?;

    if times.len() != values.len() {
        return Err(SourceError::Malformed(format!(
            "hourly.time has {} entries but hourly.{metric} has {}",
            times.len(),
            values.len()
        )));
    }

    // (sum, count) per day
    let mut by_date: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    let mut skipped = 0usize;

    for (time, value) in times.iter().zip(values) {
        let date = hourly_date(time)?;
        match value {
            Some(v) if v.is_finite() => {
                let entry = by_date.entry(date).or_insert((0.0, 0));
                entry.0 += v;
                entry.1 += 1;
            }
            _ => skipped += 1,
        }
    }

    debug!(samples = times.len(), skipped, "averaged hourly samples");

    if by_date.is_empty() {
        return Err(SourceError::Empty);
    }

    Ok(by_date
        .into_iter()
        .map(|(date, (sum, count))| DailyEnvironment {
            date,
            mean_value: sum / count as f64,
        })
        .collect())
}

fn hourly_date(time: &str) -> Result<NaiveDate, SourceError> {
    NaiveDateTime::parse_from_str(time, HOURLY_TIME_FORMAT)
        .map(|dt| dt.date())
        .map_err(|e| SourceError::Malformed(format!("bad hourly timestamp {time:?}: {e}")))
}

// Open-Meteo API response structures

#[derive(Debug, Deserialize)]
struct AirQualityPayload {
    hourly: Option<HashMap<String, serde_json::Value>>,
    error: Option<bool>,
    reason: Option<String>,
}
