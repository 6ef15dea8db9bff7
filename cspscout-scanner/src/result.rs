use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a single page fetch. Exactly one is produced per requested URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    /// Observed status code, or 0 when the transfer never produced a response.
    pub status_code: u16,
    pub body: Option<String>,
    pub response_time: Duration,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status_code: 0,
            body: None,
            response_time: Duration::from_secs(0),
            error: None,
        }
    }

    pub fn with_error(url: String, error: String) -> Self {
        Self {
            url,
            status_code: 0,
            body: None,
            response_time: Duration::from_secs(0),
            error: Some(error),
        }
    }

    /// A fetch counts as successful when it has a body and a 2xx/3xx status.
    pub fn is_success(&self) -> bool {
        self.body.is_some() && (200..400).contains(&self.status_code)
    }

    /// Human readable reason for a failed fetch.
    pub fn failure_reason(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        match (&self.error, self.status_code) {
            (Some(error), _) => Some(error.clone()),
            (None, 0) => Some("no response".to_string()),
            (None, status) => Some(format!("HTTP {}", status)),
        }
    }
}
