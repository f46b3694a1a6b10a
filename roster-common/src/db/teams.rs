//! Team database operations
//!
//! Teams come from two places: manual entry (no external id) and the
//! upstream feed sync (keyed by `external_id`). The sync path only ever
//! touches rows it can find by external id.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Team record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub guid: Uuid,
    /// Upstream identifier; `None` for manually entered teams
    pub external_id: Option<i64>,
    pub name: String,
    pub city: String,
    pub abbreviation: Option<String>,
    pub league: Option<String>,
    pub division: Option<String>,
    /// First year of play
    pub founded: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a manually entered team (no upstream identity)
    pub fn new(name: impl Into<String>, city: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            guid: Uuid::new_v4(),
            external_id: None,
            name: name.into(),
            city: city.into(),
            abbreviation: None,
            league: None,
            division: None,
            founded: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// "City Name", e.g. "Boston Red Sox"
    pub fn display_name(&self) -> String {
        [self.city.as_str(), self.name.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Name and city are required
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Name can't be blank".to_string()));
        }
        if self.city.trim().is_empty() {
            return Err(Error::Validation("City can't be blank".to_string()));
        }
        Ok(())
    }
}

/// Attributes mapped from one upstream record
///
/// `None` means the feed did not supply the value. Absent values are never
/// written, so they can't clear what is already stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamAttributes {
    pub external_id: i64,
    pub name: Option<String>,
    pub city: Option<String>,
    pub abbreviation: Option<String>,
    pub founded: Option<i64>,
    pub league: Option<String>,
    pub division: Option<String>,
    pub active: Option<bool>,
}

impl TeamAttributes {
    pub fn new(external_id: i64) -> Self {
        Self {
            external_id,
            ..Default::default()
        }
    }

    /// Names of present attributes whose value differs from `team`
    pub fn changed_fields(&self, team: &Team) -> Vec<&'static str> {
        let mut changed = Vec::new();

        if team.external_id != Some(self.external_id) {
            changed.push("external_id");
        }
        if differs(&self.name, &team.name) {
            changed.push("name");
        }
        if differs(&self.city, &team.city) {
            changed.push("city");
        }
        if differs_opt(&self.abbreviation, &team.abbreviation) {
            changed.push("abbreviation");
        }
        if differs_opt(&self.founded, &team.founded) {
            changed.push("founded");
        }
        if differs_opt(&self.league, &team.league) {
            changed.push("league");
        }
        if differs_opt(&self.division, &team.division) {
            changed.push("division");
        }
        if differs(&self.active, &team.active) {
            changed.push("active");
        }

        changed
    }

    /// Overwrite the present attributes on `team`, leaving the rest alone
    pub fn apply_to(&self, team: &mut Team) {
        team.external_id = Some(self.external_id);
        if let Some(name) = &self.name {
            team.name = name.clone();
        }
        if let Some(city) = &self.city {
            team.city = city.clone();
        }
        if let Some(abbreviation) = &self.abbreviation {
            team.abbreviation = Some(abbreviation.clone());
        }
        if let Some(founded) = self.founded {
            team.founded = Some(founded);
        }
        if let Some(league) = &self.league {
            team.league = Some(league.clone());
        }
        if let Some(division) = &self.division {
            team.division = Some(division.clone());
        }
        if let Some(active) = self.active {
            team.active = active;
        }
    }

    /// New team built from these attributes (active defaults to true)
    pub fn to_new_team(&self) -> Team {
        let mut team = Team::new(String::new(), String::new());
        self.apply_to(&mut team);
        team
    }
}

fn differs<T: PartialEq>(incoming: &Option<T>, stored: &T) -> bool {
    matches!(incoming, Some(value) if value != stored)
}

fn differs_opt<T: PartialEq>(incoming: &Option<T>, stored: &Option<T>) -> bool {
    match incoming {
        Some(value) => stored.as_ref() != Some(value),
        None => false,
    }
}

const TEAM_COLUMNS: &str = "guid, external_id, name, city, abbreviation, league, division, \
                            founded, active, created_at, updated_at";

fn team_from_row(row: &SqliteRow) -> Result<Team> {
    let guid_str: String = row.try_get("guid")?;
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Invalid team guid '{}': {}", guid_str, e)))?;

    Ok(Team {
        guid,
        external_id: row.try_get("external_id")?,
        name: row.try_get("name")?,
        city: row.try_get("city")?,
        abbreviation: row.try_get("abbreviation")?,
        league: row.try_get("league")?,
        division: row.try_get("division")?,
        founded: row.try_get("founded")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Insert a new team after validating it
pub async fn insert_team(pool: &SqlitePool, team: &Team) -> Result<()> {
    team.validate()?;

    sqlx::query(
        r#"
        INSERT INTO teams (
            guid, external_id, name, city, abbreviation, league, division,
            founded, active, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(team.guid.to_string())
    .bind(team.external_id)
    .bind(&team.name)
    .bind(&team.city)
    .bind(&team.abbreviation)
    .bind(&team.league)
    .bind(&team.division)
    .bind(team.founded)
    .bind(team.active)
    .bind(team.created_at)
    .bind(team.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Create a team from synced attributes
pub async fn create_synced_team(pool: &SqlitePool, attrs: &TeamAttributes) -> Result<Team> {
    let team = attrs.to_new_team();
    insert_team(pool, &team).await?;
    Ok(team)
}

/// Apply synced attributes to an existing team in one UPDATE statement
pub async fn update_synced_team(
    pool: &SqlitePool,
    team: &Team,
    attrs: &TeamAttributes,
) -> Result<Team> {
    let mut updated = team.clone();
    attrs.apply_to(&mut updated);
    updated.updated_at = Utc::now();
    updated.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE teams SET
            external_id = ?,
            name = ?,
            city = ?,
            abbreviation = ?,
            league = ?,
            division = ?,
            founded = ?,
            active = ?,
            updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(updated.external_id)
    .bind(&updated.name)
    .bind(&updated.city)
    .bind(&updated.abbreviation)
    .bind(&updated.league)
    .bind(&updated.division)
    .bind(updated.founded)
    .bind(updated.active)
    .bind(updated.updated_at)
    .bind(updated.guid.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Team {}", team.guid)));
    }

    Ok(updated)
}

/// Load team by upstream identifier
pub async fn find_team_by_external_id(pool: &SqlitePool, external_id: i64) -> Result<Option<Team>> {
    let sql = format!("SELECT {} FROM teams WHERE external_id = ?", TEAM_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(external_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(team_from_row).transpose()
}

/// Load team by guid
pub async fn load_team(pool: &SqlitePool, guid: Uuid) -> Result<Option<Team>> {
    let sql = format!("SELECT {} FROM teams WHERE guid = ?", TEAM_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(team_from_row).transpose()
}

/// All teams, ordered by city then name
pub async fn list_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let sql = format!("SELECT {} FROM teams ORDER BY city, name", TEAM_COLUMNS);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.iter().map(team_from_row).collect()
}

/// Delete team and (via cascade) its players. Returns false if absent.
pub async fn delete_team(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM teams WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory_database;

    fn full_attrs(external_id: i64) -> TeamAttributes {
        TeamAttributes {
            external_id,
            name: Some("Red Sox".to_string()),
            city: Some("Boston".to_string()),
            abbreviation: Some("BOS".to_string()),
            founded: Some(1901),
            league: Some("American League".to_string()),
            division: Some("American League East".to_string()),
            active: Some(true),
        }
    }

    #[test]
    fn test_display_name() {
        let team = Team::new("Red Sox", "Boston");
        assert_eq!(team.display_name(), "Boston Red Sox");
    }

    #[test]
    fn test_changed_fields_ignores_absent_values() {
        let team = full_attrs(111).to_new_team();

        let mut attrs = TeamAttributes::new(111);
        attrs.city = Some("Boston".to_string());
        assert!(attrs.changed_fields(&team).is_empty());

        attrs.city = Some("Worcester".to_string());
        assert_eq!(attrs.changed_fields(&team), vec!["city"]);
    }

    #[test]
    fn test_apply_to_keeps_unset_values() {
        let mut team = full_attrs(111).to_new_team();

        let mut attrs = TeamAttributes::new(111);
        attrs.founded = Some(1903);
        attrs.apply_to(&mut team);

        assert_eq!(team.founded, Some(1903));
        assert_eq!(team.abbreviation.as_deref(), Some("BOS"));
        assert_eq!(team.league.as_deref(), Some("American League"));
    }

    #[test]
    fn test_new_team_defaults_active() {
        let attrs = TeamAttributes {
            active: None,
            ..full_attrs(1)
        };
        assert!(attrs.to_new_team().active);
    }

    #[tokio::test]
    async fn test_create_and_find_by_external_id() {
        let pool = init_in_memory_database().await.unwrap();

        let created = create_synced_team(&pool, &full_attrs(111)).await.unwrap();
        let loaded = find_team_by_external_id(&pool, 111)
            .await
            .unwrap()
            .expect("Team not found");

        assert_eq!(loaded.guid, created.guid);
        assert_eq!(loaded.name, "Red Sox");
        assert_eq!(loaded.founded, Some(1901));
        assert!(loaded.active);
    }

    #[tokio::test]
    async fn test_insert_rejects_blank_city() {
        let pool = init_in_memory_database().await.unwrap();

        let team = Team::new("Red Sox", "  ");
        let result = insert_team(&pool, &team).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(list_teams(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_team_is_not_found() {
        let pool = init_in_memory_database().await.unwrap();

        let ghost = full_attrs(5).to_new_team();
        let result = update_synced_team(&pool, &ghost, &full_attrs(5)).await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
