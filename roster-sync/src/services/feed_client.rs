//! External feed client
//!
//! Fetches the upstream teams document. Pure I/O: one GET, a status check,
//! and a JSON parse. Retries belong to the caller.

use crate::config::FeedConfig;
use crate::error::SyncError;
use serde_json::Value;

const USER_AGENT: &str = concat!("roster-sync/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the teams feed
pub struct FeedClient {
    http_client: reqwest::Client,
    config: FeedConfig,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Result<Self, SyncError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// GET the feed and parse the body as JSON
    ///
    /// Non-success status → `FeedUnavailable(status)`; unparseable body →
    /// `FeedMalformed`; transport failure or timeout → `FeedUnreachable`.
    pub async fn fetch(&self) -> Result<Value, SyncError> {
        tracing::debug!(
            url = %self.config.base_url,
            sport_id = %self.config.sport_id,
            "Fetching teams feed"
        );

        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&[("sportId", self.config.sport_id.as_str())])
            .send()
            .await
            .map_err(|e| SyncError::FeedUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                url = %self.config.base_url,
                status = status.as_u16(),
                "Feed returned non-success status"
            );
            return Err(SyncError::FeedUnavailable(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::FeedUnreachable(e.to_string()))?;

        let document: Value =
            serde_json::from_slice(&body).map_err(|e| SyncError::FeedMalformed(e.to_string()))?;

        let team_count = document
            .get("teams")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        tracing::info!(
            url = %self.config.base_url,
            bytes = body.len(),
            teams = team_count,
            "Fetched teams feed"
        );

        Ok(document)
    }
}
