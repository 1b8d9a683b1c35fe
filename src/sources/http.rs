//! Blocking HTTP transport shared by the upstream sources.
//!
//! Adds a bounded timeout and retries transport errors, 429 and 5xx
//! responses with exponential backoff.

use crate::config::HttpConfig;
use crate::error::SourceError;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use std::thread;
use tracing::{debug, warn};

/// Upper bound on how much of an error body is kept
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    config: HttpConfig,
}

impl HttpFetcher {
    pub fn new(config: HttpConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    /// Send the request built by `build`, retrying transient failures.
    ///
    /// Returns the response body of the first successful attempt.
    pub fn get_text<F>(&self, build: F) -> Result<String, SourceError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match self.send_once(&build) {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.config.max_retries && is_transient(&e) => {
                    let delay = self.config.backoff(attempt);
                    warn!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, error = %e, "retrying request");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn send_once<F>(&self, build: &F) -> Result<String, SourceError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let resp = build(&self.client).send()?;
        let status = resp.status();
        debug!(url = %resp.url(), status = status.as_u16(), "upstream response");
        if !status.is_success() {
            let mut body = resp.text().unwrap_or_default();
            truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.text()?)
    }
}

/// Statuses worth another attempt
pub fn is_retryable_status(status: u16) -> bool {
    StatusCode::from_u16(status)
        .map(|s| s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error())
        .unwrap_or(false)
}

fn is_transient(err: &SourceError) -> bool {
    match err {
        SourceError::Transport(e) => e.is_timeout() || e.is_connect(),
        SourceError::Status { status, .. } => is_retryable_status(*status),
        _ => false,
    }
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
