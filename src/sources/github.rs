//! GitHub public events source
//!
//! Parses the public events feed and maps push events to daily commit counts.

use crate::config::GitHubConfig;
use crate::error::SourceError;
use crate::types::DailyActivity;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Url;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{ActivitySource, HttpFetcher};

const PUSH_EVENT: &str = "PushEvent";

/// Activity source backed by `GET /users/{subject}/events/public`
pub struct GitHubActivitySource {
    fetcher: HttpFetcher,
    config: GitHubConfig,
}

impl GitHubActivitySource {
    pub fn new(fetcher: HttpFetcher, config: GitHubConfig) -> Self {
        Self { fetcher, config }
    }

    fn events_url(&self, subject: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| SourceError::InvalidRequest(format!("bad GitHub base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidRequest("GitHub base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["users", subject, "events", "public"]);
        if let Some(per_page) = self.config.per_page {
            url.query_pairs_mut()
                .append_pair("per_page", &per_page.to_string());
        }
        Ok(url)
    }
}

impl ActivitySource for GitHubActivitySource {
    fn daily_activity(&self, subject: &str) -> Result<Vec<DailyActivity>, SourceError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(SourceError::InvalidRequest("empty subject".into()));
        }

        let url = self.events_url(subject)?;
        info!(%url, "fetching activity events");
        let body = self.fetcher.get_text(|client| {
            let req = client
                .get(url.clone())
                .header("Accept", "application/vnd.github+json");
            match &self.config.token {
                Some(token) => req.bearer_auth(token),
                None => req,
            }
        })?;

        let daily = aggregate_push_events(&body)?;
        info!(days = daily.len(), "aggregated activity");
        Ok(daily)
    }
}

/// Reduce a raw events payload to commit counts per UTC day, sorted by date.
///
/// Only push events count; a push without a `commits` array counts as zero.
pub fn aggregate_push_events(raw_json: &str) -> Result<Vec<DailyActivity>, SourceError> {
    let value: serde_json::Value = serde_json::from_str(raw_json)?;
    if !value.is_array() {
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("expected an array of events");
        return Err(SourceError::Malformed(message.to_string()));
    }
    let events: Vec<GitHubEvent> = serde_json::from_value(value)?;

    let mut by_date: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    let mut pushes = 0usize;

    for event in events.iter().filter(|e| e.kind == PUSH_EVENT) {
        let created_at = event
            .created_at
            .as_deref()
            .ok_or_else(|| SourceError::Malformed("push event without created_at".into()))?;
        let date = utc_date(created_at)?;
        let commits = event
            .payload
            .as_ref()
            .and_then(|p| p.commits.as_ref())
            .map_or(0, |c| c.len() as u32);

        *by_date.entry(date).or_insert(0) += commits;
        pushes += 1;
    }

    debug!(events = events.len(), pushes, "filtered push events");

    if by_date.is_empty() {
        return Err(SourceError::Empty);
    }

    Ok(by_date
        .into_iter()
        .map(|(date, commits)| DailyActivity { date, commits })
        .collect())
}

fn utc_date(timestamp: &str) -> Result<NaiveDate, SourceError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|e| SourceError::Malformed(format!("bad timestamp {timestamp:?}: {e}")))
}

// GitHub API response structures

#[derive(Debug, Deserialize)]
struct GitHubEvent {
    #[serde(rename = "type")]
    kind: String,
    created_at: Option<String>,
    payload: Option<PushPayload>,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    commits: Option<Vec<IgnoredAny>>,
}
