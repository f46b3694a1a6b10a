//! Team reconciler
//!
//! Compares one feed snapshot against the local store and applies the
//! minimal writes:
//! 1. Take the `teams` array (missing or not an array → empty)
//! 2. Keep records whose `sport.name` is the target league
//! 3. Map raw fields to `TeamAttributes`, dropping absent values
//! 4. Look up the local team by external id
//! 5. Create if new, update if any present attribute differs, else skip
//!
//! `total` counts every raw record in the feed, including those the league
//! filter drops, so `upserted + skipped` can be less than `total`.

use crate::db::TeamStore;
use crate::error::SyncError;
use roster_common::db::{Team, TeamAttributes};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Counts for one reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    /// Teams created or updated
    pub upserted: usize,
    /// Teams already identical to the feed
    pub skipped: usize,
    /// Raw records in the feed, before filtering
    pub total: usize,
}

/// What to do with one mapped record
#[derive(Debug, PartialEq)]
pub enum Decision<'a> {
    Create,
    Update {
        team: &'a Team,
        changed: Vec<&'static str>,
    },
    Unchanged,
}

/// Decide between create, update and no-op for one record
pub fn decide<'a>(existing: Option<&'a Team>, attrs: &TeamAttributes) -> Decision<'a> {
    match existing {
        None => Decision::Create,
        Some(team) => {
            let changed = attrs.changed_fields(team);
            if changed.is_empty() {
                Decision::Unchanged
            } else {
                Decision::Update { team, changed }
            }
        }
    }
}

/// Map one raw feed record to team attributes
///
/// Fails only with `CorrelationMissing` when `id` is absent or not an
/// integer. Every other field is optional.
pub fn map_team(raw: &Value) -> Result<TeamAttributes, SyncError> {
    let external_id = raw
        .get("id")
        .and_then(as_integer)
        .ok_or(SyncError::CorrelationMissing)?;

    Ok(TeamAttributes {
        external_id,
        name: string_at(raw, "/teamName"),
        city: string_at(raw, "/locationName"),
        abbreviation: string_at(raw, "/abbreviation"),
        founded: raw.get("firstYearOfPlay").and_then(as_integer),
        league: string_at(raw, "/league/name"),
        division: string_at(raw, "/division/name"),
        active: raw.get("active").and_then(Value::as_bool),
    })
}

fn string_at(raw: &Value, pointer: &str) -> Option<String> {
    raw.pointer(pointer).and_then(Value::as_str).map(str::to_string)
}

/// Integers arrive either as JSON numbers or numeric strings ("1903")
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reconciles the feed into a `TeamStore`
#[derive(Debug, Clone)]
pub struct Reconciler {
    target_league: String,
}

impl Reconciler {
    pub fn new(target_league: impl Into<String>) -> Self {
        Self {
            target_league: target_league.into(),
        }
    }

    /// True if the record's `sport.name` is the target league
    pub fn is_target_league(&self, raw: &Value) -> bool {
        raw.pointer("/sport/name").and_then(Value::as_str) == Some(self.target_league.as_str())
    }

    /// Apply one feed document to the store
    ///
    /// Records are processed in feed order. The first storage error aborts
    /// the run with `PersistenceFailed`; earlier writes stay committed.
    pub async fn reconcile(
        &self,
        store: &dyn TeamStore,
        document: &Value,
    ) -> Result<SyncSummary, SyncError> {
        let teams: &[Value] = match document.get("teams") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => {
                warn!("Feed 'teams' field is not an array, treating as empty");
                &[]
            }
            None => {
                warn!("Feed has no 'teams' field, treating as empty");
                &[]
            }
        };

        let mut summary = SyncSummary {
            total: teams.len(),
            ..Default::default()
        };

        for raw in teams {
            if !self.is_target_league(raw) {
                continue;
            }

            let attrs = match map_team(raw) {
                Ok(attrs) => attrs,
                Err(SyncError::CorrelationMissing) => {
                    let team_name = raw.get("teamName").and_then(Value::as_str).unwrap_or("?");
                    warn!(team_name, "Skipping team without external id");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let external_id = attrs.external_id;
            let persistence_failed = |source: roster_common::Error| SyncError::PersistenceFailed {
                external_id,
                source,
            };

            let existing = store
                .find_by_external_id(external_id)
                .await
                .map_err(persistence_failed)?;

            match decide(existing.as_ref(), &attrs) {
                Decision::Create => {
                    store.create(&attrs).await.map_err(persistence_failed)?;
                    debug!(external_id, "Created team");
                    summary.upserted += 1;
                }
                Decision::Update { team, changed } => {
                    store.update(team, &attrs).await.map_err(persistence_failed)?;
                    debug!(external_id, changed = ?changed, "Updated team");
                    summary.upserted += 1;
                }
                Decision::Unchanged => {
                    debug!(external_id, "Team unchanged");
                    summary.skipped += 1;
                }
            }
        }

        debug!(
            upserted = summary.upserted,
            skipped = summary.skipped,
            total = summary.total,
            "Reconciliation complete"
        );

        Ok(summary)
    }
}
