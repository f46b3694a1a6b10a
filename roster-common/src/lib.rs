//! # Roster Common Library
//!
//! Shared code for the roster services including:
//! - Error and result types
//! - Bootstrap configuration (root folder, TOML config, logging)
//! - Database initialization and team/player persistence

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
