use crate::database::{ContestEntry, ContestWinners};
use chrono::{DateTime, Utc};
use common_types::similarity::to_percentage;
use serde::Serialize;

/// One podium slot. Empty slots are explicit, never left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Placement {
    Entry {
        user_id: i32,
        photo_id: String,
        score: f64,
        percentage: u8,
    },
    NoEntry,
}

impl Placement {
    #[must_use]
    pub const fn user_id(&self) -> Option<i32> {
        match self {
            Self::Entry { user_id, .. } => Some(*user_id),
            Self::NoEntry => None,
        }
    }
}

impl From<&ContestEntry> for Placement {
    fn from(entry: &ContestEntry) -> Self {
        Self::Entry {
            user_id: entry.user_id,
            photo_id: entry.photo_id.clone(),
            score: entry.score,
            percentage: to_percentage(entry.score),
        }
    }
}

/// Top three of a contest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub contest_id: String,
    pub first: Placement,
    pub second: Placement,
    pub third: Placement,
}

impl Leaderboard {
    /// Builds the podium from entries that are already in rank order.
    #[must_use]
    pub fn from_ranked(contest_id: &str, ranked: &[ContestEntry]) -> Self {
        let mut slots = ranked.iter().map(Placement::from);
        let mut next = || slots.next().unwrap_or(Placement::NoEntry);
        Self {
            contest_id: contest_id.to_string(),
            first: next(),
            second: next(),
            third: next(),
        }
    }

    #[must_use]
    pub const fn winners(&self) -> ContestWinners {
        ContestWinners {
            first_user_id: self.first.user_id(),
            second_user_id: self.second.user_id(),
            third_user_id: self.third.user_id(),
        }
    }
}

/// A contest entry with its 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub position: usize,
    pub user_id: i32,
    pub photo_id: String,
    pub score: f64,
    pub percentage: u8,
    pub submitted_at: DateTime<Utc>,
}

impl Standing {
    #[must_use]
    pub fn new(position: usize, entry: ContestEntry) -> Self {
        Self {
            position,
            percentage: to_percentage(entry.score),
            user_id: entry.user_id,
            photo_id: entry.photo_id,
            score: entry.score,
            submitted_at: entry.submitted_at,
        }
    }
}
