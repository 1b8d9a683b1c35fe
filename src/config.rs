//! Engine configuration
//!
//! Every section has defaults, so an empty JSON object is a valid config.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default subject: a well-known, consistently active account
pub const DEFAULT_SUBJECT: &str = "torvalds";

/// Default location: San Francisco
pub const DEFAULT_LATITUDE: f64 = 37.7749;
pub const DEFAULT_LONGITUDE: f64 = -122.4194;

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_AIR_QUALITY_API: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// Particulate matter below 2.5 micrometres
pub const DEFAULT_METRIC: &str = "pm2_5";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub defaults: AnalysisDefaults,
    pub github: GitHubConfig,
    pub air_quality: AirQualityConfig,
    pub http: HttpConfig,
    pub cache: CachePolicy,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Arguments used when the caller supplies none
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisDefaults {
    pub subject: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub base_url: String,
    /// Page size; `None` keeps the upstream default
    pub per_page: Option<u32>,
    /// Optional bearer token, raises the upstream rate limit
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GITHUB_API.to_string(),
            per_page: None,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirQualityConfig {
    pub base_url: String,
    pub metric: String,
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AIR_QUALITY_API.to_string(),
            metric: DEFAULT_METRIC.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Retries after the first attempt, for transient failures only
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub backoff_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 2,
            backoff_ms: 250,
            user_agent: format!("smog-code/{}", crate::ENGINE_VERSION),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

/// Eviction policy for cached joined datasets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePolicy {
    /// Entries older than this are refetched; `None` never expires
    pub ttl_secs: Option<u64>,
    /// Oldest entry is evicted beyond this size; `None` is unbounded
    pub max_entries: Option<usize>,
}

impl CachePolicy {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config.defaults.subject, DEFAULT_SUBJECT);
        assert_eq!(config.air_quality.metric, "pm2_5");
        assert_eq!(config.http.max_retries, 2);
        assert!(config.cache.ttl().is_none());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json(
            r#"{"air_quality": {"metric": "pm10"}, "cache": {"ttl_secs": 600}}"#,
        )
        .unwrap();
        assert_eq!(config.air_quality.metric, "pm10");
        assert_eq!(config.air_quality.base_url, DEFAULT_AIR_QUALITY_API);
        assert_eq!(config.cache.ttl(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_token_not_serialized() {
        let mut config = EngineConfig::default();
        config.github.token = Some("secret".to_string());
        let json = config.to_json().unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_backoff_doubles() {
        let http = HttpConfig {
            backoff_ms: 100,
            ..Default::default()
        };
        assert_eq!(http.backoff(0), Duration::from_millis(100));
        assert_eq!(http.backoff(1), Duration::from_millis(200));
        assert_eq!(http.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn test_invalid_json() {
        assert!(EngineConfig::from_json("not json").is_err());
    }
}
