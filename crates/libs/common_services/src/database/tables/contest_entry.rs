use crate::database::Contest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Corresponds to the '`contest_entry`' table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContestEntry {
    pub id: i64,
    /// Store-assigned submission order, the last tie-break when ranking.
    pub seq: i64,
    pub contest_id: String,
    pub user_id: i32,
    pub photo_id: String,
    /// Unrounded cosine similarity against the contest target.
    pub score: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContestEntry {
    pub contest_id: String,
    pub user_id: i32,
    pub photo_id: String,
    pub score: f64,
}

/// A contest together with all of its entries, read at one `revision`.
#[derive(Debug, Clone)]
pub struct ContestSnapshot {
    pub contest: Contest,
    pub entries: Vec<ContestEntry>,
}
