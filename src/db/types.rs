//! Shared type definitions for the database layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Contact not found: {0}")]
    ContactNotFound(String),
}

/// Faith status recorded for a contact. Drives the derived relevance rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaithTier {
    Strong,
    Weak,
    Unbeliever,
    Unknown,
}

impl FaithTier {
    /// Priority rank derived from the tier. Lower value = higher priority.
    ///
    /// Relevance is always a pure function of the tier — the storage layer
    /// recomputes it on every write and no API accepts it independently.
    pub fn relevance(self) -> i64 {
        match self {
            FaithTier::Strong => 1,
            FaithTier::Weak => 2,
            FaithTier::Unknown => 3,
            FaithTier::Unbeliever => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FaithTier::Strong => "strong",
            FaithTier::Weak => "weak",
            FaithTier::Unbeliever => "unbeliever",
            FaithTier::Unknown => "unknown",
        }
    }

    /// Parse a stored tier string. Unrecognized values fall back to Unknown
    /// so a hand-edited row degrades instead of breaking every list query.
    pub fn parse(s: &str) -> Self {
        match s {
            "strong" => FaithTier::Strong,
            "weak" => FaithTier::Weak,
            "unbeliever" => FaithTier::Unbeliever,
            _ => FaithTier::Unknown,
        }
    }
}

/// A row from the `contacts` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbContact {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Initial contact date, stored as `%Y-%m-%d`.
    pub initial_date: String,
    pub faith: FaithTier,
    pub relevance: i64,
    pub completed: bool,
    pub note: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `touches` table — one dated follow-up visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTouch {
    pub id: String,
    pub contact_id: String,
    /// Visit date, stored as `%Y-%m-%d`.
    pub date: String,
    pub note: Option<String>,
    pub created_at: String,
}

/// An active (non-completed) contact with aggregated touch info, as consumed
/// by the recommender. Built by a single grouped query so the engine never
/// walks touches individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveContact {
    pub id: String,
    pub name: String,
    pub initial_date: NaiveDate,
    pub relevance: i64,
    pub touch_count: i64,
    /// Latest touch date, or the initial date when no touches exist yet.
    pub last_touch_date: NaiveDate,
}
