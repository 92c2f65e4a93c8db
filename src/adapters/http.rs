//! Shared HTTP plumbing for the network adapters: client construction and a
//! fixed-delay retry policy.

use reqwest::blocking::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Bounded retries with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Why an attempt did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Worth another attempt (transport failure, 429, 5xx).
    Transient(String),
    /// Retrying cannot help (4xx other than 429).
    Permanent(String),
}

impl AttemptError {
    pub fn message(&self) -> &str {
        match self {
            AttemptError::Transient(m) | AttemptError::Permanent(m) => m,
        }
    }
}

impl RetryPolicy {
    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T, AttemptError>
    where
        F: FnMut(u32) -> Result<T, AttemptError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = AttemptError::Transient("no attempt made".into());

        for attempt in 1..=attempts {
            if attempt > 1 && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(AttemptError::Permanent(msg)) => {
                    tracing::warn!(what, attempt, error = %msg, "request failed permanently");
                    return Err(AttemptError::Permanent(msg));
                }
                Err(AttemptError::Transient(msg)) => {
                    tracing::warn!(what, attempt, attempts, error = %msg, "request failed, retrying");
                    last_error = AttemptError::Transient(msg);
                }
            }
        }

        Err(last_error)
    }
}

pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("biasfeed/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Sends one request and classifies the outcome by status.
pub fn send(request: RequestBuilder) -> Result<Response, AttemptError> {
    let response = request.send().map_err(|e| {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            AttemptError::Transient(e.to_string())
        } else {
            AttemptError::Permanent(e.to_string())
        }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    let message = format!("HTTP {status}: {snippet}");
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(AttemptError::Transient(message))
    } else {
        Err(AttemptError::Permanent(message))
    }
}
