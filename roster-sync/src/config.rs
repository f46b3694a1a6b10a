//! Feed configuration resolution
//!
//! **Priority:** Environment → TOML `[feed]` → compiled defaults
//!
//! Resolved once at startup and handed to the feed client, so nothing on
//! the sync path reads the environment.

use roster_common::config::FeedSection;
use std::time::Duration;
use tracing::debug;

/// Feed URL override
pub const FEED_URL_ENV: &str = "MLB_API_BASE";
/// Sport id override
pub const SPORT_ID_ENV: &str = "MLB_SPORT_ID";

pub const DEFAULT_FEED_URL: &str = "https://statsapi.mlb.com/api/v1/teams?activeStatus=Y";
pub const DEFAULT_SPORT_ID: &str = "1";
pub const DEFAULT_TARGET_LEAGUE: &str = "Major League Baseball";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Everything the feed client and reconciler need to know about the feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Teams collection endpoint (may already carry query parameters)
    pub base_url: String,
    /// Sent as the `sportId` query parameter
    pub sport_id: String,
    /// Only records whose `sport.name` equals this are reconciled
    pub target_league: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_URL.to_string(),
            sport_id: DEFAULT_SPORT_ID.to_string(),
            target_league: DEFAULT_TARGET_LEAGUE.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl FeedConfig {
    /// Resolve from environment and the TOML `[feed]` section
    pub fn resolve(section: &FeedSection) -> Self {
        let defaults = Self::default();

        let base_url = pick(FEED_URL_ENV, section.base_url.as_deref(), defaults.base_url);
        let sport_id = pick(SPORT_ID_ENV, section.sport_id.as_deref(), defaults.sport_id);
        let target_league = section
            .target_league
            .as_deref()
            .filter(|v| is_set(v))
            .map(str::to_string)
            .unwrap_or(defaults.target_league);

        let config = Self {
            base_url,
            sport_id,
            target_league,
            connect_timeout: timeout(section.connect_timeout_secs, defaults.connect_timeout),
            request_timeout: timeout(section.request_timeout_secs, defaults.request_timeout),
        };

        debug!(
            base_url = %config.base_url,
            sport_id = %config.sport_id,
            target_league = %config.target_league,
            "Feed configuration resolved"
        );

        config
    }
}

fn pick(env_name: &str, toml_value: Option<&str>, default: String) -> String {
    if let Ok(value) = std::env::var(env_name) {
        if is_set(&value) {
            return value;
        }
    }

    match toml_value {
        Some(value) if is_set(value) => value.to_string(),
        _ => default,
    }
}

/// Zero would make every request time out immediately; floor at one second
fn timeout(secs: Option<u64>, default: Duration) -> Duration {
    secs.map(|s| Duration::from_secs(s.max(1))).unwrap_or(default)
}

/// Blank values count as unset
fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}
