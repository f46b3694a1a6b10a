//! Shared test helpers
//!
//! - A local axum server standing in for the upstream teams feed
//! - Feed document builders
//! - Job construction against an in-memory database

#![allow(dead_code)]

use axum::extract::{RawQuery, State};
use axum::http::{header, StatusCode};
use axum::routing::get;
use axum::Router;
use roster_common::db::init_in_memory_database;
use roster_sync::config::FeedConfig;
use roster_sync::db::SqliteTeamStore;
use roster_sync::services::{FeedClient, Reconciler, RetryPolicy, SyncJob};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const FEED_PATH: &str = "/api/v1/teams";

#[derive(Clone)]
struct MockFeedState {
    responses: Arc<Vec<(StatusCode, String)>>,
    hits: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<String>>>,
    delay: Duration,
}

/// Running mock feed. Responses are served in order; the last one repeats.
pub struct MockFeed {
    pub url: String,
    hits: Arc<AtomicUsize>,
    last_query: Arc<Mutex<Option<String>>>,
    handle: JoinHandle<()>,
}

impl MockFeed {
    pub async fn start(responses: Vec<(StatusCode, String)>) -> Self {
        Self::start_with_delay(responses, Duration::ZERO).await
    }

    pub async fn start_with_delay(responses: Vec<(StatusCode, String)>, delay: Duration) -> Self {
        assert!(!responses.is_empty(), "mock feed needs at least one response");

        let state = MockFeedState {
            responses: Arc::new(responses),
            hits: Arc::new(AtomicUsize::new(0)),
            last_query: Arc::new(Mutex::new(None)),
            delay,
        };
        let hits = state.hits.clone();
        let last_query = state.last_query.clone();

        let app = Router::new()
            .route(FEED_PATH, get(serve_teams))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}{}?activeStatus=Y", addr, FEED_PATH),
            hits,
            last_query,
            handle,
        }
    }

    /// Serve the same JSON body with 200 forever
    pub async fn ok(body: String) -> Self {
        Self::start(vec![(StatusCode::OK, body)]).await
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            base_url: self.url.clone(),
            ..Default::default()
        }
    }
}

impl Drop for MockFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_teams(
    State(state): State<MockFeedState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_query.lock().unwrap() = query;

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let index = hit.min(state.responses.len() - 1);
    let (status, body) = state.responses[index].clone();

    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

/// One MLB team record in the upstream shape
pub fn mlb_team(id: i64, name: &str, city: &str) -> Value {
    json!({
        "id": id,
        "teamName": name,
        "locationName": city,
        "abbreviation": name.chars().take(3).collect::<String>().to_uppercase(),
        "firstYearOfPlay": "1901",
        "league": { "id": 103, "name": "American League" },
        "division": { "id": 201, "name": "American League East" },
        "active": true,
        "sport": { "id": 1, "name": "Major League Baseball" }
    })
}

/// A record from another sport level, excluded by the league filter
pub fn minor_league_team(id: i64, name: &str, city: &str) -> Value {
    let mut team = mlb_team(id, name, city);
    team["sport"] = json!({ "id": 11, "name": "Triple-A" });
    team
}

pub fn feed(teams: Vec<Value>) -> Value {
    json!({ "copyright": "test", "teams": teams })
}

pub fn feed_body(teams: Vec<Value>) -> String {
    feed(teams).to_string()
}

/// Retries without meaningful waiting
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

pub fn reconciler() -> Reconciler {
    Reconciler::new("Major League Baseball")
}

/// In-memory database and a job pointed at `mock`
pub async fn job_for(mock: &MockFeed, policy: RetryPolicy) -> (SqlitePool, Arc<SyncJob>) {
    let pool = init_in_memory_database().await.unwrap();
    let client = FeedClient::new(mock.feed_config()).unwrap();
    let store = Arc::new(SqliteTeamStore::new(pool.clone()));
    let job = Arc::new(SyncJob::new(client, reconciler(), store, policy));
    (pool, job)
}

pub async fn team_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM teams")
        .fetch_one(pool)
        .await
        .unwrap()
}
