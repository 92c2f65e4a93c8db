//! GitHub gist publisher: replaces one file of an existing gist.

use crate::adapters::http::{self, AttemptError, RetryPolicy};
use crate::domain::error::FeedError;
use crate::domain::snapshot::Snapshot;
use crate::ports::publisher::Publisher;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::time::Duration;

pub struct GistPublisher {
    client: Client,
    api_base: String,
    gist_id: String,
    token: String,
    file_name: String,
    retry: RetryPolicy,
}

impl GistPublisher {
    pub fn new(
        api_base: &str,
        gist_id: String,
        token: String,
        file_name: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, FeedError> {
        let client = http::build_client(timeout).map_err(|e| FeedError::PublishFailure {
            reason: format!("failed to build HTTP client: {e}"),
        })?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            gist_id,
            token,
            file_name,
            retry,
        })
    }

    pub fn patch_body(file_name: &str, content: &str) -> Value {
        json!({ "files": { file_name: { "content": content } } })
    }

    /// `files.<name>.raw_url` of the PATCH response.
    pub fn raw_url(response: &Value, file_name: &str) -> Option<String> {
        response["files"][file_name]["raw_url"]
            .as_str()
            .map(str::to_string)
    }
}

impl Publisher for GistPublisher {
    fn publish(&self, snapshot: &Snapshot) -> Result<String, FeedError> {
        let content = snapshot.to_json_pretty()?;
        let body = Self::patch_body(&self.file_name, &content);
        let url = format!("{}/gists/{}", self.api_base, self.gist_id);

        let response = self
            .retry
            .run("gist patch", |_| {
                let request = self
                    .client
                    .patch(&url)
                    .header("Authorization", format!("token {}", self.token))
                    .header("Accept", "application/vnd.github+json")
                    .json(&body);
                http::send(request)?
                    .json::<Value>()
                    .map_err(|e| AttemptError::Transient(format!("invalid JSON body: {e}")))
            })
            .map_err(|e| FeedError::PublishFailure {
                reason: e.message().to_string(),
            })?;

        Self::raw_url(&response, &self.file_name).ok_or_else(|| FeedError::PublishFailure {
            reason: format!("response has no raw_url for {}", self.file_name),
        })
    }
}
