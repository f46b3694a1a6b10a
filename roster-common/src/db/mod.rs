//! Database models and queries

pub mod init;
pub mod players;
pub mod teams;

pub use init::*;
pub use players::{NewPlayer, Player};
pub use teams::{Team, TeamAttributes};
