//! Player database operations
//!
//! Players belong to exactly one team and are deleted with it. Jersey
//! numbers are unique within a team.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Player record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub guid: Uuid,
    pub team_guid: Uuid,
    pub name: String,
    pub position: String,
    pub jersey_number: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for adding a player to a team
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub position: String,
    pub jersey_number: i64,
}

fn parse_guid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Internal(format!("Invalid guid '{}': {}", value, e)))
}

fn player_from_row(row: &SqliteRow) -> Result<Player> {
    let guid: String = row.try_get("guid")?;
    let team_guid: String = row.try_get("team_guid")?;

    Ok(Player {
        guid: parse_guid(&guid)?,
        team_guid: parse_guid(&team_guid)?,
        name: row.try_get("name")?,
        position: row.try_get("position")?,
        jersey_number: row.try_get("jersey_number")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Add a player to a team
///
/// Fails with `Error::Validation` when name or position is blank or the
/// jersey number is already taken on this team, and `Error::NotFound` when
/// the team does not exist.
pub async fn create_player(
    pool: &SqlitePool,
    team_guid: Uuid,
    input: &NewPlayer,
) -> Result<Player> {
    if input.name.trim().is_empty() {
        return Err(Error::Validation("Name can't be blank".to_string()));
    }
    if input.position.trim().is_empty() {
        return Err(Error::Validation("Position can't be blank".to_string()));
    }

    let team_exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM teams WHERE guid = ?")
        .bind(team_guid.to_string())
        .fetch_optional(pool)
        .await?;
    if team_exists.is_none() {
        return Err(Error::NotFound(format!("Team {}", team_guid)));
    }

    let taken: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM players WHERE team_guid = ? AND jersey_number = ?",
    )
    .bind(team_guid.to_string())
    .bind(input.jersey_number)
    .fetch_optional(pool)
    .await?;
    if taken.is_some() {
        return Err(jersey_taken(input.jersey_number));
    }

    let player = Player {
        guid: Uuid::new_v4(),
        team_guid,
        name: input.name.clone(),
        position: input.position.clone(),
        jersey_number: input.jersey_number,
        created_at: Utc::now(),
    };

    let inserted = sqlx::query(
        r#"
        INSERT INTO players (guid, team_guid, name, position, jersey_number, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(player.guid.to_string())
    .bind(player.team_guid.to_string())
    .bind(&player.name)
    .bind(&player.position)
    .bind(player.jersey_number)
    .bind(player.created_at)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => Ok(player),
        // Lost a race with a concurrent insert; the UNIQUE constraint caught it
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(jersey_taken(input.jersey_number))
        }
        Err(e) => Err(e.into()),
    }
}

fn jersey_taken(number: i64) -> Error {
    Error::Validation(format!("Jersey number {} has already been taken", number))
}

/// Players of a team, ordered by jersey number
pub async fn list_players(pool: &SqlitePool, team_guid: Uuid) -> Result<Vec<Player>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, team_guid, name, position, jersey_number, created_at
        FROM players
        WHERE team_guid = ?
        ORDER BY jersey_number
        "#,
    )
    .bind(team_guid.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(player_from_row).collect()
}

/// Load one player of a team
pub async fn load_player(pool: &SqlitePool, team_guid: Uuid, guid: Uuid) -> Result<Option<Player>> {
    let row = sqlx::query(
        r#"
        SELECT guid, team_guid, name, position, jersey_number, created_at
        FROM players
        WHERE team_guid = ? AND guid = ?
        "#,
    )
    .bind(team_guid.to_string())
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(player_from_row).transpose()
}

/// Remove a player from a team. Returns false if absent.
pub async fn delete_player(pool: &SqlitePool, team_guid: Uuid, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM players WHERE team_guid = ? AND guid = ?")
        .bind(team_guid.to_string())
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
