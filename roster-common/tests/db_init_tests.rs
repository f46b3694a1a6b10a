//! Database initialization and roster persistence tests
//!
//! Covers:
//! - Automatic database creation and idempotent schema setup
//! - Jersey number uniqueness scoped to a team
//! - Players deleted along with their team

use roster_common::db::init::{init_database, init_in_memory_database};
use roster_common::db::players::{create_player, delete_player, list_players, load_player};
use roster_common::db::teams::{delete_team, insert_team, list_teams, load_team};
use roster_common::db::{NewPlayer, Team};
use roster_common::Error;
use tempfile::TempDir;

fn player(name: &str, position: &str, jersey_number: i64) -> NewPlayer {
    NewPlayer {
        name: name.to_string(),
        position: position.to_string(),
        jersey_number,
    }
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("roster.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_reopen_keeps_data() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("roster.db");

    let pool = init_database(&db_path).await.unwrap();
    let team = Team::new("Cubs", "Chicago");
    insert_team(&pool, &team).await.unwrap();
    pool.close().await;

    // Second open re-runs schema creation, which must not disturb rows
    let pool = init_database(&db_path).await.unwrap();
    let loaded = load_team(&pool, team.guid).await.unwrap();

    assert_eq!(loaded.map(|t| t.name), Some("Cubs".to_string()));
}

#[tokio::test]
async fn test_manual_teams_allow_many_missing_external_ids() {
    let pool = init_in_memory_database().await.unwrap();

    insert_team(&pool, &Team::new("Cubs", "Chicago")).await.unwrap();
    insert_team(&pool, &Team::new("White Sox", "Chicago")).await.unwrap();

    assert_eq!(list_teams(&pool).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_jersey_number_on_same_team_fails() {
    let pool = init_in_memory_database().await.unwrap();
    let team = Team::new("Cubs", "Chicago");
    insert_team(&pool, &team).await.unwrap();

    create_player(&pool, team.guid, &player("Ernie Banks", "SS", 14))
        .await
        .unwrap();
    let result = create_player(&pool, team.guid, &player("Ron Santo", "3B", 14)).await;

    match result {
        Err(Error::Validation(msg)) => assert!(msg.contains("14"), "unexpected message: {}", msg),
        other => panic!("Expected validation error, got {:?}", other),
    }
    assert_eq!(list_players(&pool, team.guid).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_same_jersey_number_on_different_teams_allowed() {
    let pool = init_in_memory_database().await.unwrap();
    let cubs = Team::new("Cubs", "Chicago");
    let sox = Team::new("White Sox", "Chicago");
    insert_team(&pool, &cubs).await.unwrap();
    insert_team(&pool, &sox).await.unwrap();

    create_player(&pool, cubs.guid, &player("Ernie Banks", "SS", 14))
        .await
        .unwrap();
    let result = create_player(&pool, sox.guid, &player("Paul Konerko", "1B", 14)).await;

    assert!(result.is_ok(), "Different team should accept #14: {:?}", result.err());
}

#[tokio::test]
async fn test_player_requires_name_and_position() {
    let pool = init_in_memory_database().await.unwrap();
    let team = Team::new("Cubs", "Chicago");
    insert_team(&pool, &team).await.unwrap();

    let no_name = create_player(&pool, team.guid, &player("", "SS", 1)).await;
    let no_position = create_player(&pool, team.guid, &player("Ernie Banks", " ", 2)).await;

    assert!(matches!(no_name, Err(Error::Validation(_))));
    assert!(matches!(no_position, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_player_for_unknown_team_is_not_found() {
    let pool = init_in_memory_database().await.unwrap();

    let result = create_player(&pool, uuid::Uuid::new_v4(), &player("Ernie Banks", "SS", 14)).await;

    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_players_listed_by_jersey_number() {
    let pool = init_in_memory_database().await.unwrap();
    let team = Team::new("Cubs", "Chicago");
    insert_team(&pool, &team).await.unwrap();

    create_player(&pool, team.guid, &player("Ryne Sandberg", "2B", 23)).await.unwrap();
    create_player(&pool, team.guid, &player("Ernie Banks", "SS", 14)).await.unwrap();
    create_player(&pool, team.guid, &player("Billy Williams", "LF", 26)).await.unwrap();

    let numbers: Vec<i64> = list_players(&pool, team.guid)
        .await
        .unwrap()
        .iter()
        .map(|p| p.jersey_number)
        .collect();

    assert_eq!(numbers, vec![14, 23, 26]);
}

#[tokio::test]
async fn test_delete_player() {
    let pool = init_in_memory_database().await.unwrap();
    let team = Team::new("Cubs", "Chicago");
    insert_team(&pool, &team).await.unwrap();
    let banks = create_player(&pool, team.guid, &player("Ernie Banks", "SS", 14))
        .await
        .unwrap();

    assert!(delete_player(&pool, team.guid, banks.guid).await.unwrap());
    assert!(!delete_player(&pool, team.guid, banks.guid).await.unwrap());
    assert!(load_player(&pool, team.guid, banks.guid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_deleting_team_deletes_players() {
    let pool = init_in_memory_database().await.unwrap();
    let team = Team::new("Cubs", "Chicago");
    insert_team(&pool, &team).await.unwrap();
    create_player(&pool, team.guid, &player("Ernie Banks", "SS", 14)).await.unwrap();
    create_player(&pool, team.guid, &player("Ron Santo", "3B", 10)).await.unwrap();

    assert!(delete_team(&pool, team.guid).await.unwrap());

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM players")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
