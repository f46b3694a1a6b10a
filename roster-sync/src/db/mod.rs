//! Local store used by the reconciler
//!
//! The reconciler only needs three primitives: lookup by external id,
//! create, and update. `TeamStore` is that seam; `SqliteTeamStore` backs it
//! with the shared roster database.

use async_trait::async_trait;
use roster_common::db::teams;
use roster_common::db::{Team, TeamAttributes};
use roster_common::Result;
use sqlx::SqlitePool;

#[async_trait]
pub trait TeamStore: Send + Sync {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<Team>>;

    /// Insert a team built from `attrs`
    async fn create(&self, attrs: &TeamAttributes) -> Result<Team>;

    /// Write the present `attrs` onto `team` atomically
    async fn update(&self, team: &Team, attrs: &TeamAttributes) -> Result<Team>;
}

/// SQLite-backed team store
#[derive(Clone)]
pub struct SqliteTeamStore {
    pool: SqlitePool,
}

impl SqliteTeamStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TeamStore for SqliteTeamStore {
    async fn find_by_external_id(&self, external_id: i64) -> Result<Option<Team>> {
        teams::find_team_by_external_id(&self.pool, external_id).await
    }

    async fn create(&self, attrs: &TeamAttributes) -> Result<Team> {
        teams::create_synced_team(&self.pool, attrs).await
    }

    async fn update(&self, team: &Team, attrs: &TeamAttributes) -> Result<Team> {
        teams::update_synced_team(&self.pool, team, attrs).await
    }
}
